// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data-defined objects.
//!
//! This module provides [`DataDefinedObject`], the state every composition item
//! carries for its data-defined properties, and the [`ComposerObject`] trait
//! concrete items implement to hook into composition events.

use core::fmt;

use tracing::{debug, trace};

use crate::composition::Composition;
use crate::context::{ExpressionContext, ExpressionContextFactory, ScopeDefaults};
use crate::custom::CustomProperties;
use crate::descriptor::DataDefined;
use crate::element::Element;
use crate::error::{EvaluationError, InvalidProperty, StateError};
use crate::events::{CompositionEvent, EventSubscription};
use crate::id::PropertySelector;
use crate::registry::PropertyRegistry;
use crate::store::OverrideStore;
use crate::value::Value;

/// Storage key of [`DataDefinedProperty::Test`](crate::DataDefinedProperty::Test).
pub const TEST_PROPERTY_KEY: &str = "dataDefinedTestProperty";

/// The data-defined state of one composition item.
///
/// The object owns its overrides and custom properties, and borrows the
/// composition it is placed in: it can never outlive it. A standalone object
/// (no composition) can store, serialize, and prepare overrides, but cannot
/// evaluate them.
///
/// # Example
///
/// ```rust
/// use quire_data_defined::{DataDefinedObject, DataDefinedProperty, Element, EvaluationError};
///
/// let mut object = DataDefinedObject::standalone();
/// object
///     .set_override(DataDefinedProperty::Test, true, true, "@page * 2", "")
///     .unwrap();
/// assert_eq!(object.prepare_expressions(), 1);
///
/// let context = object.create_expression_context();
/// assert_eq!(
///     object.evaluate(DataDefinedProperty::Test, &context),
///     Err(EvaluationError::NoComposition)
/// );
///
/// let mut element = Element::new("item");
/// object.write_state(&mut element).unwrap();
///
/// let mut restored = DataDefinedObject::standalone();
/// restored.read_state(&element).unwrap();
/// assert_eq!(
///     restored.override_for(DataDefinedProperty::Test),
///     object.override_for(DataDefinedProperty::Test)
/// );
/// ```
pub struct DataDefinedObject<'c> {
    composition: Option<&'c dyn Composition>,
    subscription: Option<EventSubscription>,
    registry: PropertyRegistry,
    overrides: OverrideStore,
    custom_properties: CustomProperties,
    scope_defaults: ScopeDefaults,
}

impl fmt::Debug for DataDefinedObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataDefinedObject")
            .field("has_composition", &self.composition.is_some())
            .field("subscription", &self.subscription)
            .field("registry", &self.registry)
            .field("overrides", &self.overrides)
            .field("custom_properties", &self.custom_properties)
            .field("scope_defaults", &self.scope_defaults)
            .finish()
    }
}

impl<'c> DataDefinedObject<'c> {
    /// Creates an object, subscribing to the composition's events if one is given.
    #[must_use]
    pub fn new(composition: Option<&'c dyn Composition>) -> Self {
        Self {
            composition,
            subscription: composition.map(|composition| composition.events().subscribe()),
            registry: PropertyRegistry::with_builtin_keys(),
            overrides: OverrideStore::new(),
            custom_properties: CustomProperties::new(),
            scope_defaults: ScopeDefaults::default(),
        }
    }

    /// Creates an object that is not placed in a composition.
    #[must_use]
    pub fn standalone() -> Self {
        Self::new(None)
    }

    /// Replaces the variables seeded into standalone contexts, builder style.
    #[must_use]
    pub fn with_scope_defaults(mut self, scope_defaults: ScopeDefaults) -> Self {
        self.scope_defaults = scope_defaults;
        self
    }

    /// Returns the composition this object is placed in.
    #[must_use]
    pub fn composition(&self) -> Option<&'c dyn Composition> {
        self.composition
    }

    /// Returns the storage keys overrides are written under.
    #[must_use]
    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    // =========================================================================
    // Overrides
    // =========================================================================

    /// Returns the override descriptor for a property.
    ///
    /// Sentinel selectors always return `None`.
    #[must_use]
    pub fn override_for(&self, property: impl Into<PropertySelector>) -> Option<&DataDefined> {
        self.overrides.get(property)
    }

    /// Sets the override for a property. See [`OverrideStore::set`].
    pub fn set_override(
        &mut self,
        property: impl Into<PropertySelector>,
        active: bool,
        use_expression: bool,
        expression: &str,
        field: &str,
    ) -> Result<(), InvalidProperty> {
        self.overrides
            .set(property, active, use_expression, expression, field)
    }

    /// Returns every stored override.
    #[must_use]
    pub fn overrides(&self) -> &OverrideStore {
        &self.overrides
    }

    /// Evaluates a property against `context`.
    ///
    /// Evaluation is owned by the composition: a standalone object fails with
    /// [`EvaluationError::NoComposition`]. `Ok(None)` means the property has no
    /// active override.
    ///
    /// Pending composition events are not handled here. Expressions prepared
    /// before an atlas toggle or coverage layer change stay as they were until
    /// the item calls [`ComposerObject::process_composition_events`].
    pub fn evaluate(
        &self,
        property: impl Into<PropertySelector>,
        context: &ExpressionContext,
    ) -> Result<Option<Value>, EvaluationError> {
        let composition = self.composition.ok_or(EvaluationError::NoComposition)?;
        let property = property.into().property()?;
        composition.data_defined_evaluate(property, context, &self.overrides)
    }

    /// Builds a fresh expression context for this object.
    #[must_use]
    pub fn create_expression_context(&self) -> ExpressionContext {
        self.context_factory().build()
    }

    /// Returns the factory [`create_expression_context`](Self::create_expression_context) uses.
    #[must_use]
    pub fn context_factory(&self) -> ExpressionContextFactory<'_> {
        ExpressionContextFactory::new(self.composition, &self.scope_defaults)
    }

    /// Prepares the expression of every stored override against a newly built
    /// context.
    ///
    /// Returns the number of overrides that had an expression to prepare.
    pub fn prepare_expressions(&mut self) -> usize {
        let context = self.create_expression_context();
        let mut prepared = 0;
        for (property, dd) in self.overrides.iter_mut() {
            if dd.prepare_expression(&context) {
                trace!(%property, expression = dd.expression(), "prepared expression");
                prepared += 1;
            }
        }
        debug!(
            prepared,
            context_serial = context.serial(),
            "prepared data defined expressions"
        );
        prepared
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Removes and returns the composition events received since the last call.
    ///
    /// Standalone objects never receive events.
    #[must_use]
    pub fn take_pending_events(&self) -> Vec<CompositionEvent> {
        self.subscription
            .as_ref()
            .map(EventSubscription::take_pending)
            .unwrap_or_default()
    }

    /// Returns `true` if composition events are waiting to be handled.
    #[must_use]
    pub fn has_pending_events(&self) -> bool {
        self.subscription.as_ref().is_some_and(|s| !s.is_empty())
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Writes overrides and custom properties into `element`.
    ///
    /// Each stored override becomes a child named by its storage key. Custom
    /// properties follow in a `customproperties` child. Children left by an
    /// earlier write are replaced. Nothing is written into a null element.
    pub fn write_state(&self, element: &mut Element) -> Result<(), StateError> {
        if element.is_null() {
            return Err(StateError::NullElement);
        }

        let stale: usize = self
            .registry
            .iter()
            .map(|(_, key)| element.remove_children_named(key))
            .sum();
        if stale > 0 {
            trace!(stale, "replacing previously written overrides");
        }

        for (property, dd) in self.overrides.iter() {
            let Some(key) = self.registry.key(property) else {
                trace!(%property, "not writing override of unregistered property");
                continue;
            };
            dd.write_attributes(element.append_child(Element::new(key)));
        }
        self.custom_properties.write_xml(element);

        debug!(
            overrides = self.overrides.len(),
            custom_properties = self.custom_properties.len(),
            "wrote data defined state"
        );
        Ok(())
    }

    /// Restores overrides and custom properties from `element`.
    ///
    /// Every property with a child named by its storage key gets that
    /// override, even a default-shaped one; other overrides are left untouched. Custom properties are replaced when `element` has a
    /// `customproperties` child. Nothing is read from a null element.
    pub fn read_state(&mut self, element: &Element) -> Result<(), StateError> {
        if element.is_null() {
            return Err(StateError::NullElement);
        }

        let mut restored = 0;
        for (property, key) in self.registry.iter() {
            if let Some(child) = element.first_child_named(key) {
                self.overrides
                    .insert(property, DataDefined::from_attributes(child));
                restored += 1;
            }
        }
        self.custom_properties.read_xml(element);

        debug!(
            restored,
            custom_properties = self.custom_properties.len(),
            "read data defined state"
        );
        Ok(())
    }

    // =========================================================================
    // Custom properties
    // =========================================================================

    /// Sets a custom property.
    pub fn set_custom_property(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.custom_properties.set(key, value);
    }

    /// Returns a custom property, or `default` when it is not set.
    #[must_use]
    pub fn custom_property(&self, key: &str, default: Value) -> Value {
        self.custom_properties.get(key, default)
    }

    /// Removes a custom property.
    pub fn remove_custom_property(&mut self, key: &str) -> Option<Value> {
        self.custom_properties.remove(key)
    }

    /// Returns the custom property keys.
    pub fn custom_property_keys(&self) -> impl Iterator<Item = &str> {
        self.custom_properties.keys()
    }

    /// Returns the custom properties.
    #[must_use]
    pub fn custom_properties(&self) -> &CustomProperties {
        &self.custom_properties
    }
}

/// Hooks for composition items built on a [`DataDefinedObject`].
///
/// Concrete items embed a `DataDefinedObject`, expose it through the two
/// accessors, and override the hooks that matter to them.
///
/// # Example
///
/// ```rust
/// use quire_data_defined::{
///     ComposerObject, DataDefinedObject, DataDefinedProperty, ExpressionContext,
///     PropertySelector,
/// };
///
/// struct Label<'c> {
///     object: DataDefinedObject<'c>,
///     refreshes: usize,
/// }
///
/// impl<'c> ComposerObject<'c> for Label<'c> {
///     fn data_defined(&self) -> &DataDefinedObject<'c> {
///         &self.object
///     }
///
///     fn data_defined_mut(&mut self) -> &mut DataDefinedObject<'c> {
///         &mut self.object
///     }
///
///     fn refresh_data_defined_property(
///         &mut self,
///         _property: PropertySelector,
///         _context: Option<&ExpressionContext>,
///     ) {
///         self.refreshes += 1;
///     }
/// }
///
/// let mut label = Label {
///     object: DataDefinedObject::standalone(),
///     refreshes: 0,
/// };
/// label
///     .data_defined_mut()
///     .set_override(DataDefinedProperty::ItemRotation, true, false, "", "heading")
///     .unwrap();
/// label.refresh_data_defined_property(PropertySelector::AllProperties, None);
/// assert_eq!(label.refreshes, 1);
/// ```
pub trait ComposerObject<'c> {
    /// Returns the item's data-defined state.
    fn data_defined(&self) -> &DataDefinedObject<'c>;

    /// Returns the item's data-defined state mutably.
    fn data_defined_mut(&mut self) -> &mut DataDefinedObject<'c>;

    /// Recomputes cached values that depend on data-defined properties.
    ///
    /// `property` selects what to refresh; composition events pass
    /// [`PropertySelector::AllProperties`]. When `context` is `None` the item
    /// builds its own. Does nothing by default.
    fn refresh_data_defined_property(
        &mut self,
        property: PropertySelector,
        context: Option<&ExpressionContext>,
    ) {
        let _ = (property, context);
    }

    /// Schedules a repaint of the item. Does nothing by default.
    fn repaint(&mut self) {}

    /// Handles every pending composition event, in the order they were emitted.
    ///
    /// Events that make prepared expressions stale re-prepare them first, then
    /// every event refreshes all properties. Returns the number of events
    /// handled.
    fn process_composition_events(&mut self) -> usize {
        let events = self.data_defined().take_pending_events();
        for event in &events {
            trace!(?event, "handling composition event");
            if event.requires_prepare() {
                self.data_defined_mut().prepare_expressions();
            }
            self.refresh_data_defined_property(PropertySelector::AllProperties, None);
        }
        events.len()
    }
}

impl<'c> ComposerObject<'c> for DataDefinedObject<'c> {
    fn data_defined(&self) -> &DataDefinedObject<'c> {
        self
    }

    fn data_defined_mut(&mut self) -> &mut DataDefinedObject<'c> {
        self
    }
}
