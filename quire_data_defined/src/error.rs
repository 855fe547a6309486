// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use thiserror::Error;

use crate::id::{DataDefinedProperty, PropertySelector};

/// A sentinel selector was used where a single property is required.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("{0:?} does not name a single data defined property")]
pub struct InvalidProperty(pub PropertySelector);

/// Errors produced while evaluating a data-defined property.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EvaluationError {
    /// The object is not attached to a composition.
    #[error("object is not attached to a composition")]
    NoComposition,
    /// A sentinel selector was evaluated.
    #[error(transparent)]
    InvalidProperty(#[from] InvalidProperty),
    /// A field override was evaluated but the context has no current feature.
    #[error("no current feature to read field `{field}` from")]
    NoFeature {
        /// The requested field.
        field: String,
    },
    /// The current feature has no attribute with the requested name.
    #[error("feature has no field named `{field}`")]
    FieldNotFound {
        /// The requested field.
        field: String,
    },
    /// The expression engine failed to compile or execute the expression.
    #[error("expression `{expression}` for {property} failed: {message}")]
    Expression {
        /// The property being evaluated.
        property: DataDefinedProperty,
        /// The expression text.
        expression: String,
        /// Message reported by the expression engine.
        message: String,
    },
}

/// Errors produced while writing or reading serialized state.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum StateError {
    /// The target or source element is null.
    #[error("element is null")]
    NullElement,
}

/// Errors produced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration text is not valid.
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}
