// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Override descriptors.
//!
//! A [`DataDefined`] describes how one property of one object is overridden:
//! whether the override is active, and whether the value comes from an
//! expression or from a field of the current feature.

use crate::context::ExpressionContext;
use crate::element::Element;

const ACTIVE_ATTR: &str = "active";
const USE_EXPRESSION_ATTR: &str = "useExpr";
const EXPRESSION_ATTR: &str = "expr";
const FIELD_ATTR: &str = "field";

/// An expression prepared against a particular context.
///
/// Expression engines use this to skip recompilation on hot paths such as
/// evaluating an item once per feature during an atlas pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreparedExpression {
    expression: String,
    scope_names: Vec<String>,
    context_serial: u64,
}

impl PreparedExpression {
    /// Returns the expression text that was prepared.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the scopes that were visible during preparation.
    #[must_use]
    pub fn scope_names(&self) -> &[String] {
        &self.scope_names
    }

    /// Returns the serial of the context the expression was prepared against.
    #[must_use]
    #[inline]
    pub fn context_serial(&self) -> u64 {
        self.context_serial
    }
}

/// The override descriptor of a single data-defined property.
///
/// Equality only considers the four persisted fields; the prepared expression
/// cache is ignored.
///
/// # Example
///
/// ```rust
/// use quire_data_defined::{DataDefined, ExpressionContext};
///
/// let mut dd = DataDefined::new(true, true, "@atlas_pagename", "");
/// assert!(!dd.expression_is_prepared());
///
/// assert!(dd.prepare_expression(&ExpressionContext::new()));
/// assert!(dd.expression_is_prepared());
///
/// // Changing the expression text invalidates the prepared form.
/// dd.set_expression("upper(@atlas_pagename)");
/// assert!(!dd.expression_is_prepared());
/// ```
#[derive(Clone, Debug, Default)]
pub struct DataDefined {
    active: bool,
    use_expression: bool,
    expression: String,
    field: String,
    prepared: Option<PreparedExpression>,
}

impl PartialEq for DataDefined {
    fn eq(&self, other: &Self) -> bool {
        self.active == other.active
            && self.use_expression == other.use_expression
            && self.expression == other.expression
            && self.field == other.field
    }
}

impl DataDefined {
    /// Creates a descriptor.
    #[must_use]
    pub fn new(
        active: bool,
        use_expression: bool,
        expression: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            active,
            use_expression,
            expression: expression.into(),
            field: field.into(),
            prepared: None,
        }
    }

    /// Returns `true` if these field values describe "no override".
    #[must_use]
    pub fn is_default_shaped(
        active: bool,
        use_expression: bool,
        expression: &str,
        field: &str,
    ) -> bool {
        !active && !use_expression && expression.is_empty() && field.is_empty()
    }

    /// Returns `true` if the override is active.
    #[must_use]
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns `true` if the value comes from the expression rather than the field.
    #[must_use]
    #[inline]
    pub fn use_expression(&self) -> bool {
        self.use_expression
    }

    /// Returns the expression text.
    #[must_use]
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Returns the field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Sets whether the override is active.
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Sets whether the value comes from the expression.
    pub fn set_use_expression(&mut self, use_expression: bool) {
        self.use_expression = use_expression;
    }

    /// Sets the expression text, dropping the prepared form if the text changed.
    pub fn set_expression(&mut self, expression: impl Into<String>) {
        let expression = expression.into();
        if expression != self.expression {
            self.prepared = None;
        }
        self.expression = expression;
    }

    /// Sets the field name.
    pub fn set_field(&mut self, field: impl Into<String>) {
        self.field = field.into();
    }

    /// Prepares the expression against `context`.
    ///
    /// Returns `false`, leaving nothing prepared, when this descriptor does not
    /// use an expression or the expression is empty.
    pub fn prepare_expression(&mut self, context: &ExpressionContext) -> bool {
        if !self.use_expression || self.expression.trim().is_empty() {
            self.prepared = None;
            return false;
        }
        self.prepared = Some(PreparedExpression {
            expression: self.expression.clone(),
            scope_names: context.scope_names().map(Into::into).collect(),
            context_serial: context.serial(),
        });
        true
    }

    /// Returns `true` if the current expression text has been prepared.
    #[must_use]
    #[inline]
    pub fn expression_is_prepared(&self) -> bool {
        self.prepared.is_some()
    }

    /// Returns the prepared expression, if any.
    #[must_use]
    pub fn prepared_expression(&self) -> Option<&PreparedExpression> {
        self.prepared.as_ref()
    }

    /// Writes the four persisted fields as attributes of `element`.
    pub(crate) fn write_attributes(&self, element: &mut Element) {
        element.set_attribute(ACTIVE_ATTR, bool_text(self.active));
        element.set_attribute(USE_EXPRESSION_ATTR, bool_text(self.use_expression));
        element.set_attribute(EXPRESSION_ATTR, self.expression.as_str());
        element.set_attribute(FIELD_ATTR, self.field.as_str());
    }

    /// Reads a descriptor from the attributes of `element`.
    ///
    /// Missing attributes read as `false` or empty.
    pub(crate) fn from_attributes(element: &Element) -> Self {
        Self::new(
            element.attribute(ACTIVE_ATTR) == Some("true"),
            element.attribute(USE_EXPRESSION_ATTR) == Some("true"),
            element.attribute(EXPRESSION_ATTR).unwrap_or_default(),
            element.attribute(FIELD_ATTR).unwrap_or_default(),
        )
    }
}

fn bool_text(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExpressionContextScope;

    #[test]
    fn default_shape() {
        assert!(DataDefined::is_default_shaped(false, false, "", ""));
        assert!(!DataDefined::is_default_shaped(true, false, "", ""));
        assert!(!DataDefined::is_default_shaped(false, true, "", ""));
        assert!(!DataDefined::is_default_shaped(false, false, "1", ""));
        assert!(!DataDefined::is_default_shaped(false, false, "", "name"));
    }

    #[test]
    fn prepare_records_context() {
        let context = ExpressionContext::new()
            .with_scope(ExpressionContextScope::new("Global"))
            .with_scope(ExpressionContextScope::new("Atlas"));
        let mut dd = DataDefined::new(true, true, "1 + 1", "");

        assert!(dd.prepare_expression(&context));
        let prepared = dd.prepared_expression().unwrap();
        assert_eq!(prepared.expression(), "1 + 1");
        assert_eq!(prepared.scope_names(), ["Global", "Atlas"]);
        assert_eq!(prepared.context_serial(), context.serial());
    }

    #[test]
    fn prepare_skips_field_overrides_and_blank_expressions() {
        let context = ExpressionContext::new();

        let mut field = DataDefined::new(true, false, "1 + 1", "name");
        assert!(!field.prepare_expression(&context));
        assert!(!field.expression_is_prepared());

        let mut blank = DataDefined::new(true, true, "  ", "");
        assert!(!blank.prepare_expression(&context));
        assert!(!blank.expression_is_prepared());
    }

    #[test]
    fn same_expression_keeps_prepared_form() {
        let mut dd = DataDefined::new(true, true, "@page", "");
        dd.prepare_expression(&ExpressionContext::new());
        dd.set_expression("@page");
        assert!(dd.expression_is_prepared());
        dd.set_expression("@page + 1");
        assert!(!dd.expression_is_prepared());
    }

    #[test]
    fn equality_ignores_prepared_state() {
        let mut a = DataDefined::new(true, true, "@page", "");
        let b = a.clone();
        a.prepare_expression(&ExpressionContext::new());
        assert_eq!(a, b);
        assert_ne!(a, DataDefined::new(false, true, "@page", ""));
    }

    #[test]
    fn attributes_round_trip() {
        let dd = DataDefined::new(true, false, "a = \"b\"", "name");
        let mut element = Element::new("dataDefinedTestProperty");
        dd.write_attributes(&mut element);

        assert_eq!(element.attribute("active"), Some("true"));
        assert_eq!(element.attribute("useExpr"), Some("false"));
        assert_eq!(DataDefined::from_attributes(&element), dd);
    }

    #[test]
    fn missing_attributes_read_as_defaults() {
        let element = Element::new("dataDefinedTestProperty");
        assert_eq!(DataDefined::from_attributes(&element), DataDefined::default());
    }
}
