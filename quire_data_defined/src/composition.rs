// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The composition interface.
//!
//! Items are placed in a composition, which owns the atlas (the dataset being
//! iterated) and the expression engine. [`Composition`] is the part of that
//! container data-defined objects rely on. [`resolve_override`] implements the
//! usual override semantics for compositions that only need to plug in an
//! [`ExpressionEvaluator`].

use crate::context::ExpressionContext;
use crate::descriptor::{DataDefined, PreparedExpression};
use crate::error::EvaluationError;
use crate::events::CompositionEvents;
use crate::id::DataDefinedProperty;
use crate::store::OverrideStore;
use crate::value::Value;

/// The container that data-defined objects are attached to.
///
/// A composition is shared by many objects at once and is only ever borrowed
/// by them, so every method takes `&self`.
///
/// Events emitted through [`events`](Self::events) are queued per object.
/// An object sees them, and re-prepares its expressions against a freshly
/// built context, only once its item calls
/// [`ComposerObject::process_composition_events`](crate::ComposerObject::process_composition_events).
/// Compositions that change atlas state should have items drain their events
/// before evaluating.
pub trait Composition {
    /// Returns the event source objects subscribe to.
    fn events(&self) -> &CompositionEvents;

    /// Builds a fresh context reflecting the current composition and atlas state.
    fn create_expression_context(&self) -> ExpressionContext;

    /// Evaluates `property` using the object's `overrides`.
    ///
    /// Returns `Ok(None)` when the property has no active override and the
    /// item should use its static value.
    fn data_defined_evaluate(
        &self,
        property: DataDefinedProperty,
        context: &ExpressionContext,
        overrides: &OverrideStore,
    ) -> Result<Option<Value>, EvaluationError>;
}

/// The expression engine used to evaluate expression overrides.
pub trait ExpressionEvaluator {
    /// Evaluates `expression` against `context`.
    ///
    /// `prepared` is the form cached on the descriptor, when it matches
    /// `expression`. Errors are reported as a message.
    fn evaluate(
        &self,
        expression: &str,
        prepared: Option<&PreparedExpression>,
        context: &ExpressionContext,
    ) -> Result<Value, String>;
}

impl<F> ExpressionEvaluator for F
where
    F: Fn(&str, &ExpressionContext) -> Result<Value, String>,
{
    fn evaluate(
        &self,
        expression: &str,
        _prepared: Option<&PreparedExpression>,
        context: &ExpressionContext,
    ) -> Result<Value, String> {
        self(expression, context)
    }
}

/// Resolves one override descriptor to a value.
///
/// - No descriptor, or an inactive one: `Ok(None)`.
/// - Expression overrides are evaluated by `evaluator`; its failures become
///   [`EvaluationError::Expression`].
/// - Field overrides read the attribute from the context's current feature.
/// - Active overrides with neither an expression nor a field: `Ok(None)`.
///
/// # Example
///
/// ```rust
/// use quire_data_defined::{
///     DataDefined, DataDefinedProperty, ExpressionContext, ExpressionContextScope, Feature,
///     Value, resolve_override,
/// };
///
/// let context = ExpressionContext::new().with_scope(
///     ExpressionContextScope::new("Atlas").with_feature(Feature::new(1).with_attribute("x", 12.5)),
/// );
/// let no_engine = |_: &str, _: &ExpressionContext| Err::<Value, _>("unused".to_owned());
///
/// let dd = DataDefined::new(true, false, "", "x");
/// let value = resolve_override(DataDefinedProperty::PositionX, Some(&dd), &context, &no_engine);
/// assert_eq!(value, Ok(Some(Value::Double(12.5))));
/// ```
pub fn resolve_override<E>(
    property: DataDefinedProperty,
    descriptor: Option<&DataDefined>,
    context: &ExpressionContext,
    evaluator: &E,
) -> Result<Option<Value>, EvaluationError>
where
    E: ExpressionEvaluator + ?Sized,
{
    let Some(dd) = descriptor.filter(|dd| dd.is_active()) else {
        return Ok(None);
    };

    if dd.use_expression() {
        if dd.expression().trim().is_empty() {
            return Ok(None);
        }
        let prepared = dd
            .prepared_expression()
            .filter(|prepared| prepared.expression() == dd.expression());
        return evaluator
            .evaluate(dd.expression(), prepared, context)
            .map(Some)
            .map_err(|message| EvaluationError::Expression {
                property,
                expression: dd.expression().into(),
                message,
            });
    }

    let field = dd.field();
    if field.is_empty() {
        return Ok(None);
    }
    let feature = context.feature().ok_or_else(|| EvaluationError::NoFeature {
        field: field.into(),
    })?;
    feature
        .attribute(field)
        .cloned()
        .map(Some)
        .ok_or_else(|| EvaluationError::FieldNotFound {
            field: field.into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ExpressionContextScope, Feature};
    use core::cell::Cell;

    const P: DataDefinedProperty = DataDefinedProperty::ItemRotation;

    fn atlas_context() -> ExpressionContext {
        ExpressionContext::new().with_scope(
            ExpressionContextScope::new("Atlas")
                .with_variable("angle", 45)
                .with_feature(Feature::new(9).with_attribute("heading", 90)),
        )
    }

    /// Resolves `@name` variables and counts calls that had a prepared form.
    struct VariableEngine {
        prepared_calls: Cell<usize>,
    }

    impl ExpressionEvaluator for VariableEngine {
        fn evaluate(
            &self,
            expression: &str,
            prepared: Option<&PreparedExpression>,
            context: &ExpressionContext,
        ) -> Result<Value, String> {
            if prepared.is_some() {
                self.prepared_calls.set(self.prepared_calls.get() + 1);
            }
            let name = expression
                .strip_prefix('@')
                .ok_or_else(|| format!("cannot parse `{expression}`"))?;
            context
                .variable(name)
                .cloned()
                .ok_or_else(|| format!("unknown variable `{name}`"))
        }
    }

    fn engine() -> VariableEngine {
        VariableEngine {
            prepared_calls: Cell::new(0),
        }
    }

    #[test]
    fn missing_or_inactive_means_default() {
        let context = atlas_context();
        assert_eq!(resolve_override(P, None, &context, &engine()), Ok(None));

        let inactive = DataDefined::new(false, true, "@angle", "heading");
        assert_eq!(
            resolve_override(P, Some(&inactive), &context, &engine()),
            Ok(None)
        );
    }

    #[test]
    fn expression_override() {
        let context = atlas_context();
        let dd = DataDefined::new(true, true, "@angle", "heading");
        assert_eq!(
            resolve_override(P, Some(&dd), &context, &engine()),
            Ok(Some(Value::Int(45)))
        );
    }

    #[test]
    fn expression_failure_keeps_message() {
        let context = atlas_context();
        let dd = DataDefined::new(true, true, "@missing", "");
        assert_eq!(
            resolve_override(P, Some(&dd), &context, &engine()),
            Err(EvaluationError::Expression {
                property: P,
                expression: "@missing".into(),
                message: "unknown variable `missing`".into(),
            })
        );
    }

    #[test]
    fn prepared_form_is_passed_to_the_engine() {
        let context = atlas_context();
        let mut dd = DataDefined::new(true, true, "@angle", "");
        let engine = engine();

        resolve_override(P, Some(&dd), &context, &engine).unwrap();
        assert_eq!(engine.prepared_calls.get(), 0);

        dd.prepare_expression(&context);
        resolve_override(P, Some(&dd), &context, &engine).unwrap();
        assert_eq!(engine.prepared_calls.get(), 1);
    }

    #[test]
    fn field_override() {
        let context = atlas_context();
        let dd = DataDefined::new(true, false, "@angle", "heading");
        assert_eq!(
            resolve_override(P, Some(&dd), &context, &engine()),
            Ok(Some(Value::Int(90)))
        );

        let missing = DataDefined::new(true, false, "", "speed");
        assert_eq!(
            resolve_override(P, Some(&missing), &context, &engine()),
            Err(EvaluationError::FieldNotFound {
                field: "speed".into()
            })
        );
    }

    #[test]
    fn field_override_without_feature() {
        let dd = DataDefined::new(true, false, "", "heading");
        assert_eq!(
            resolve_override(P, Some(&dd), &ExpressionContext::new(), &engine()),
            Err(EvaluationError::NoFeature {
                field: "heading".into()
            })
        );
    }

    #[test]
    fn active_without_source_means_default() {
        let context = atlas_context();
        let dd = DataDefined::new(true, false, "", "");
        assert_eq!(resolve_override(P, Some(&dd), &context, &engine()), Ok(None));
        let blank = DataDefined::new(true, true, " ", "");
        assert_eq!(
            resolve_override(P, Some(&blank), &context, &engine()),
            Ok(None)
        );
    }
}
