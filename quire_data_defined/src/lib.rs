// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quire Data Defined: data-defined property overrides for composition items.
//!
//! Items in a composition (labels, maps, pictures, the page itself) have
//! properties such as position, size, or rotation. Each of these can be
//! *data defined*: instead of its static value, the property takes the result
//! of an expression or the value of a field of the current atlas feature, and
//! is re-evaluated for every feature while the atlas iterates its coverage
//! layer.
//!
//! ## Core Concepts
//!
//! - [`DataDefinedProperty`] names a property; [`PropertySelector`] adds the
//!   `NoProperty` / `AllProperties` sentinels, which every accessor rejects.
//! - [`DataDefined`] is an override descriptor: active flag, expression or
//!   field, and a cached [`PreparedExpression`].
//! - [`OverrideStore`] holds the descriptors of one object sparsely: only
//!   properties that were ever given a non-default override have an entry.
//! - [`CustomProperties`] is a free-form key/value bag stored next to them.
//! - [`DataDefinedObject`] ties these together with the [`Composition`] the
//!   item is placed in, builds [`ExpressionContext`]s, evaluates properties,
//!   and writes/reads its state to an [`Element`] tree.
//! - [`ComposerObject`] is implemented by concrete items to receive refresh
//!   and repaint hooks when [`CompositionEvent`]s arrive.
//!
//! ## Quick Start
//!
//! ```rust
//! use quire_data_defined::{DataDefinedObject, DataDefinedProperty, Element, Value};
//!
//! let mut object = DataDefinedObject::standalone();
//!
//! // Default-shaped values do not create an override.
//! object.set_override(DataDefinedProperty::Test, false, false, "", "").unwrap();
//! assert!(object.override_for(DataDefinedProperty::Test).is_none());
//!
//! // Drive the property from the "name" field of the atlas feature.
//! object.set_override(DataDefinedProperty::Test, true, false, "", "name").unwrap();
//! object.set_custom_property("note", "draft");
//!
//! let mut element = Element::new("ComposerItem");
//! object.write_state(&mut element).unwrap();
//!
//! let mut restored = DataDefinedObject::standalone();
//! restored.read_state(&element).unwrap();
//! assert_eq!(
//!     restored.override_for(DataDefinedProperty::Test).map(|dd| dd.field()),
//!     Some("name")
//! );
//! assert_eq!(restored.custom_property("note", Value::Null), Value::from("draft"));
//! ```
//!
//! ## Events
//!
//! Objects placed in a composition subscribe to its [`CompositionEvents`] when
//! they are created. Events queue up until the item calls
//! [`ComposerObject::process_composition_events`]; atlas toggles and coverage
//! layer changes re-prepare every expression against a newly built context,
//! and every event runs the item's refresh hook.
//!
//! ## Logging
//!
//! The crate logs through `tracing` and never installs a subscriber.

mod composition;
mod context;
mod custom;
mod descriptor;
mod element;
mod error;
mod events;
mod id;
mod object;
mod registry;
mod store;
mod value;

pub use composition::{Composition, ExpressionEvaluator, resolve_override};
pub use context::{
    ExpressionContext, ExpressionContextFactory, ExpressionContextScope, Feature, GLOBAL_SCOPE,
    PROJECT_SCOPE, ScopeDefaults,
};
pub use custom::CustomProperties;
pub use descriptor::{DataDefined, PreparedExpression};
pub use element::Element;
pub use error::{ConfigError, EvaluationError, InvalidProperty, StateError};
pub use events::{CompositionEvent, CompositionEvents, EventSubscription};
pub use id::{DataDefinedProperty, PropertySelector};
pub use object::{ComposerObject, DataDefinedObject, TEST_PROPERTY_KEY};
pub use registry::PropertyRegistry;
pub use store::OverrideStore;
pub use value::Value;
