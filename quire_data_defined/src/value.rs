// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Variant values.
//!
//! This module provides [`Value`], the dynamically typed value stored in custom
//! properties, scope variables, and feature attributes, and returned by
//! evaluation.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A dynamically typed value.
///
/// # Example
///
/// ```rust
/// use quire_data_defined::Value;
///
/// let value = Value::from(42);
/// assert_eq!(value.type_name(), "int");
/// assert_eq!(value.to_string(), "42");
/// assert_eq!(Value::parse("int", "42"), Some(value));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum Value {
    /// No value.
    #[default]
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Double(f64),
    /// A string.
    String(String),
    /// A list of strings.
    StringList(Vec<String>),
}

impl Value {
    /// Returns the type tag used when the value is serialized as text.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::StringList(_) => "stringlist",
        }
    }

    /// Returns `true` for [`Value::Null`].
    #[must_use]
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Parses a scalar value from its type tag and text.
    ///
    /// String lists are not scalar and are never produced here. Returns `None`
    /// when the tag is unknown or the text does not parse as that type.
    #[must_use]
    pub fn parse(type_name: &str, text: &str) -> Option<Self> {
        match type_name {
            "null" => Some(Self::Null),
            "bool" => match text {
                "true" => Some(Self::Bool(true)),
                "false" => Some(Self::Bool(false)),
                _ => None,
            },
            "int" => text.parse().ok().map(Self::Int),
            "double" => text.parse().ok().map(Self::Double),
            "string" => Some(Self::String(text.into())),
            _ => None,
        }
    }

    /// Returns the contained string, if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a float, converting integers.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
            Self::StringList(v) => f.write_str(&v.join(",")),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(value: Vec<String>) -> Self {
        Self::StringList(value)
    }
}
