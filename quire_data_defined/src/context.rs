// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Layered expression contexts.
//!
//! An [`ExpressionContext`] is an ordered stack of [`ExpressionContextScope`]s.
//! Lookups walk the stack from the last appended scope to the first, so more
//! specific scopes (project, composition, atlas) shadow more general ones
//! (global).
//!
//! [`ExpressionContextFactory`] builds the context a data-defined object
//! evaluates against: the composition's own context when the object is attached
//! to one, otherwise a global scope followed by a project scope seeded from
//! [`ScopeDefaults`].

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::composition::Composition;
use crate::error::ConfigError;
use crate::value::Value;

/// Name of the scope built by [`ExpressionContextScope::global`].
pub const GLOBAL_SCOPE: &str = "Global";

/// Name of the scope built by [`ExpressionContextScope::project`].
pub const PROJECT_SCOPE: &str = "Project";

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// A dataset record: an id plus ordered, named attributes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    id: i64,
    attributes: IndexMap<String, Value>,
}

impl Feature {
    /// Creates a feature with no attributes.
    #[must_use]
    pub fn new(id: i64) -> Self {
        Self {
            id,
            attributes: IndexMap::new(),
        }
    }

    /// Adds an attribute, builder style.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Sets an attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Returns the feature id.
    #[must_use]
    #[inline]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Returns an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns the attribute names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }
}

/// A named set of variables, optionally carrying the current feature.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpressionContextScope {
    name: String,
    variables: IndexMap<String, Value>,
    feature: Option<Feature>,
}

impl ExpressionContextScope {
    /// Creates an empty scope.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: IndexMap::new(),
            feature: None,
        }
    }

    /// Creates the global scope from the configured defaults.
    #[must_use]
    pub fn global(defaults: &ScopeDefaults) -> Self {
        let mut scope = Self::new(GLOBAL_SCOPE);
        scope.variables = defaults.global.clone();
        scope
    }

    /// Creates the project scope from the configured defaults.
    #[must_use]
    pub fn project(defaults: &ScopeDefaults) -> Self {
        let mut scope = Self::new(PROJECT_SCOPE);
        scope.variables = defaults.project.clone();
        scope
    }

    /// Adds a variable, builder style.
    #[must_use]
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_variable(name, value);
        self
    }

    /// Sets the current feature, builder style.
    #[must_use]
    pub fn with_feature(mut self, feature: Feature) -> Self {
        self.feature = Some(feature);
        self
    }

    /// Returns the scope name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets a variable, replacing any previous value.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Returns a variable defined directly in this scope.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Returns the variable names in definition order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Sets or clears the current feature.
    pub fn set_feature(&mut self, feature: Option<Feature>) {
        self.feature = feature;
    }

    /// Returns the feature carried by this scope.
    #[must_use]
    pub fn feature(&self) -> Option<&Feature> {
        self.feature.as_ref()
    }
}

/// An ordered stack of scopes that expressions are evaluated against.
///
/// Each context gets a serial number when created; serials increase strictly
/// across the process, so a larger serial means a more recently built context.
/// Cloning a context keeps its serial.
///
/// # Example
///
/// ```rust
/// use quire_data_defined::{ExpressionContext, ExpressionContextScope};
///
/// let mut context = ExpressionContext::new();
/// context.append_scope(ExpressionContextScope::new("Global").with_variable("unit", "mm"));
/// context.append_scope(ExpressionContextScope::new("Project").with_variable("unit", "cm"));
///
/// // The last appended scope wins.
/// assert_eq!(context.variable("unit"), Some(&"cm".into()));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ExpressionContext {
    scopes: Vec<ExpressionContextScope>,
    serial: u64,
}

impl Default for ExpressionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionContext {
    /// Creates an empty context with a fresh serial.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Appends a scope. It takes precedence over every scope already present.
    pub fn append_scope(&mut self, scope: ExpressionContextScope) {
        self.scopes.push(scope);
    }

    /// Appends a scope, builder style.
    #[must_use]
    pub fn with_scope(mut self, scope: ExpressionContextScope) -> Self {
        self.append_scope(scope);
        self
    }

    /// Returns the serial number assigned when this context was created.
    #[must_use]
    #[inline]
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Returns the scopes, from least to most specific.
    #[must_use]
    pub fn scopes(&self) -> &[ExpressionContextScope] {
        &self.scopes
    }

    /// Returns the scope names, from least to most specific.
    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.iter().map(ExpressionContextScope::name)
    }

    /// Returns the last scope, if any.
    #[must_use]
    pub fn last_scope_mut(&mut self) -> Option<&mut ExpressionContextScope> {
        self.scopes.last_mut()
    }

    /// Resolves a variable, the most specific scope winning.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.scopes.iter().rev().find_map(|scope| scope.variable(name))
    }

    /// Returns `true` if any scope defines the variable.
    #[must_use]
    pub fn has_variable(&self, name: &str) -> bool {
        self.variable(name).is_some()
    }

    /// Returns the current feature from the most specific scope carrying one.
    #[must_use]
    pub fn feature(&self) -> Option<&Feature> {
        self.scopes.iter().rev().find_map(ExpressionContextScope::feature)
    }
}

/// Variables seeded into the global and project scopes of a standalone context.
///
/// Loadable from JSON. Variables given in the JSON are merged over the
/// defaults, so a section that names only some variables keeps the others:
///
/// ```rust
/// use quire_data_defined::{ScopeDefaults, Value};
///
/// let defaults = ScopeDefaults::from_json(
///     r#"{ "project": { "project_title": { "type": "string", "value": "Atlas" } } }"#,
/// )
/// .unwrap();
/// assert_eq!(
///     defaults.project_variable("project_title"),
///     Some(&Value::from("Atlas"))
/// );
/// // Variables left out keep their defaults.
/// assert_eq!(defaults.project_variable("project_path"), Some(&Value::from("")));
/// assert!(defaults.global_variable("quire_version").is_some());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ScopeOverrides")]
pub struct ScopeDefaults {
    global: IndexMap<String, Value>,
    project: IndexMap<String, Value>,
}

/// Deserialized form of [`ScopeDefaults`]: only the variables to change.
#[derive(Deserialize)]
struct ScopeOverrides {
    #[serde(default)]
    global: IndexMap<String, Value>,
    #[serde(default)]
    project: IndexMap<String, Value>,
}

impl From<ScopeOverrides> for ScopeDefaults {
    fn from(overrides: ScopeOverrides) -> Self {
        let mut defaults = Self::default();
        defaults.global.extend(overrides.global);
        defaults.project.extend(overrides.project);
        defaults
    }
}

impl Default for ScopeDefaults {
    fn default() -> Self {
        let global: IndexMap<String, Value> = IndexMap::from([
            ("quire_version".into(), env!("CARGO_PKG_VERSION").into()),
            ("os_name".into(), std::env::consts::OS.into()),
        ]);
        let project: IndexMap<String, Value> = [
            "project_title",
            "project_path",
            "project_folder",
            "project_filename",
        ]
        .into_iter()
        .map(|name| (name.into(), Value::from("")))
        .collect();
        Self { global, project }
    }
}

impl ScopeDefaults {
    /// Parses defaults from JSON, merged over [`ScopeDefaults::default`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Sets a global variable, builder style.
    #[must_use]
    pub fn with_global_variable(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.global.insert(name.into(), value.into());
        self
    }

    /// Sets a project variable, builder style.
    #[must_use]
    pub fn with_project_variable(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.project.insert(name.into(), value.into());
        self
    }

    /// Returns a configured global variable.
    #[must_use]
    pub fn global_variable(&self, name: &str) -> Option<&Value> {
        self.global.get(name)
    }

    /// Returns a configured project variable.
    #[must_use]
    pub fn project_variable(&self, name: &str) -> Option<&Value> {
        self.project.get(name)
    }
}

/// Builds fresh expression contexts for a data-defined object.
///
/// Contexts are never cached: every [`build`](Self::build) call returns a new
/// context, so it reflects the composition state at the time of the call.
#[derive(Clone, Copy)]
pub struct ExpressionContextFactory<'a> {
    composition: Option<&'a dyn Composition>,
    defaults: &'a ScopeDefaults,
}

impl fmt::Debug for ExpressionContextFactory<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpressionContextFactory")
            .field("has_composition", &self.composition.is_some())
            .field("defaults", &self.defaults)
            .finish()
    }
}

impl<'a> ExpressionContextFactory<'a> {
    /// Creates a factory.
    #[must_use]
    pub fn new(composition: Option<&'a dyn Composition>, defaults: &'a ScopeDefaults) -> Self {
        Self {
            composition,
            defaults,
        }
    }

    /// Builds a new context.
    ///
    /// With a composition this is exactly the composition's context. Without
    /// one, the context holds the global scope followed by the project scope.
    #[must_use]
    pub fn build(&self) -> ExpressionContext {
        match self.composition {
            Some(composition) => composition.create_expression_context(),
            None => ExpressionContext::new()
                .with_scope(ExpressionContextScope::global(self.defaults))
                .with_scope(ExpressionContextScope::project(self.defaults)),
        }
    }
}
