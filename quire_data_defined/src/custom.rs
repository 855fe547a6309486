// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Free-form custom properties.

use indexmap::IndexMap;
use tracing::warn;

use crate::element::Element;
use crate::value::Value;

const BLOCK_TAG: &str = "customproperties";
const PROPERTY_TAG: &str = "property";
const LIST_VALUE_TAG: &str = "value";
const KEY_ATTR: &str = "key";
const TYPE_ATTR: &str = "type";
const VALUE_ATTR: &str = "value";

/// A key/value bag attached to an object.
///
/// Keys and values are not validated. Keys keep insertion order, which is also
/// the order they are written in and read back in.
///
/// # Example
///
/// ```rust
/// use quire_data_defined::{CustomProperties, Value};
///
/// let mut props = CustomProperties::new();
/// props.set("author", "kim");
/// assert_eq!(props.get("author", Value::Null), Value::from("kim"));
/// assert_eq!(props.get("missing", Value::from(0)), Value::from(0));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CustomProperties {
    values: IndexMap<String, Value>,
}

impl CustomProperties {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, replacing any previous value for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the value for `key`, or `default` when it is absent.
    #[must_use]
    pub fn get(&self, key: &str, default: Value) -> Value {
        self.values.get(key).cloned().unwrap_or(default)
    }

    /// Returns a reference to the value for `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Removes a key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Removes every key.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Writes a `customproperties` block holding every key to `parent`,
    /// replacing any block already there.
    pub fn write_xml(&self, parent: &mut Element) {
        parent.remove_children_named(BLOCK_TAG);
        let block = parent.append_child(Element::new(BLOCK_TAG));
        for (key, value) in &self.values {
            let property = block.append_child(Element::new(PROPERTY_TAG));
            property.set_attribute(KEY_ATTR, key.as_str());
            property.set_attribute(TYPE_ATTR, value.type_name());
            match value {
                Value::StringList(items) => {
                    for item in items {
                        property
                            .append_child(Element::new(LIST_VALUE_TAG))
                            .set_attribute(VALUE_ATTR, item.as_str());
                    }
                }
                scalar => property.set_attribute(VALUE_ATTR, scalar.to_string()),
            }
        }
    }

    /// Replaces the contents with the `customproperties` block of `parent`.
    ///
    /// When `parent` has no such block the current contents are kept. Entries
    /// without a key are skipped; values whose type tag or text does not parse
    /// are kept as strings.
    pub fn read_xml(&mut self, parent: &Element) {
        let Some(block) = parent.first_child_named(BLOCK_TAG) else {
            return;
        };
        self.values.clear();
        for property in block.children_named(PROPERTY_TAG) {
            let Some(key) = property.attribute(KEY_ATTR) else {
                warn!("skipping custom property without a key");
                continue;
            };
            let type_name = property.attribute(TYPE_ATTR).unwrap_or("string");
            let value = if type_name == "stringlist" {
                Value::StringList(
                    property
                        .children_named(LIST_VALUE_TAG)
                        .map(|item| item.attribute(VALUE_ATTR).unwrap_or_default().into())
                        .collect(),
                )
            } else {
                let text = property.attribute(VALUE_ATTR).unwrap_or_default();
                Value::parse(type_name, text).unwrap_or_else(|| {
                    warn!(key, type_name, "custom property value does not parse, keeping text");
                    Value::from(text)
                })
            };
            self.values.insert(key.into(), value);
        }
    }
}
