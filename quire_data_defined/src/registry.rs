// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property storage keys.
//!
//! This module provides [`PropertyRegistry`], which maps each data-defined
//! property to the key it is serialized under.

use hashbrown::HashMap;

use crate::id::DataDefinedProperty;
use crate::object::TEST_PROPERTY_KEY;

/// Returns the storage key every property is written under by default.
fn builtin_key(property: DataDefinedProperty) -> &'static str {
    match property {
        DataDefinedProperty::Test => TEST_PROPERTY_KEY,
        DataDefinedProperty::PresetPaperSize => "dataDefinedPaperSize",
        DataDefinedProperty::PaperWidth => "dataDefinedPaperWidth",
        DataDefinedProperty::PaperHeight => "dataDefinedPaperHeight",
        DataDefinedProperty::NumPages => "dataDefinedNumPages",
        DataDefinedProperty::PaperOrientation => "dataDefinedPaperOrientation",
        DataDefinedProperty::PageNumber => "dataDefinedPageNumber",
        DataDefinedProperty::PositionX => "dataDefinedPositionX",
        DataDefinedProperty::PositionY => "dataDefinedPositionY",
        DataDefinedProperty::ItemWidth => "dataDefinedWidth",
        DataDefinedProperty::ItemHeight => "dataDefinedHeight",
        DataDefinedProperty::ItemRotation => "dataDefinedRotation",
        DataDefinedProperty::Transparency => "dataDefinedTransparency",
        DataDefinedProperty::BlendMode => "dataDefinedBlendMode",
        DataDefinedProperty::ExcludeFromExports => "dataDefinedExcludeExports",
    }
}

/// Maps properties to their storage keys.
///
/// Keys are stable across versions: they name the serialized element for a
/// property's override, so changing one breaks previously written state.
/// [`with_builtin_keys`](Self::with_builtin_keys) gives every property its key.
///
/// # Example
///
/// ```rust
/// use quire_data_defined::{DataDefinedProperty, PropertyRegistry};
///
/// let registry = PropertyRegistry::with_builtin_keys();
/// assert_eq!(registry.len(), DataDefinedProperty::ALL.len());
///
/// let mut registry = PropertyRegistry::new();
/// registry.register(DataDefinedProperty::PositionX, "dataDefinedPositionX");
///
/// assert_eq!(
///     registry.key(DataDefinedProperty::PositionX),
///     Some("dataDefinedPositionX")
/// );
/// assert_eq!(
///     registry.property_for_key("dataDefinedPositionX"),
///     Some(DataDefinedProperty::PositionX)
/// );
/// assert_eq!(registry.key(DataDefinedProperty::PositionY), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct PropertyRegistry {
    /// Registrations, sorted by property.
    keys: Vec<(DataDefinedProperty, &'static str)>,
    by_key: HashMap<&'static str, DataDefinedProperty>,
}

impl PropertyRegistry {
    /// Creates a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in key of every property.
    #[must_use]
    pub fn with_builtin_keys() -> Self {
        let mut registry = Self::new();
        for property in DataDefinedProperty::ALL {
            registry.register(property, builtin_key(property));
        }
        registry
    }

    /// Registers the storage key for a property.
    ///
    /// # Panics
    ///
    /// Panics if the property is already registered, or if the key is already
    /// used by another property.
    pub fn register(&mut self, property: DataDefinedProperty, key: &'static str) {
        assert!(
            !self.by_key.contains_key(key),
            "Storage key '{key}' is already registered"
        );
        match self.keys.binary_search_by_key(&property, |(p, _)| *p) {
            Ok(_) => panic!("Property {property:?} is already registered"),
            Err(idx) => self.keys.insert(idx, (property, key)),
        }
        self.by_key.insert(key, property);
    }

    /// Returns the storage key of a property.
    #[must_use]
    pub fn key(&self, property: DataDefinedProperty) -> Option<&'static str> {
        self.keys
            .binary_search_by_key(&property, |(p, _)| *p)
            .ok()
            .map(|idx| self.keys[idx].1)
    }

    /// Looks up a property by its storage key.
    #[must_use]
    pub fn property_for_key(&self, key: &str) -> Option<DataDefinedProperty> {
        self.by_key.get(key).copied()
    }

    /// Returns `true` if the property has a storage key.
    #[must_use]
    #[inline]
    pub fn contains(&self, property: DataDefinedProperty) -> bool {
        self.key(property).is_some()
    }

    /// Returns the number of registered properties.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no properties are registered.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns an iterator over all registrations, in property order.
    pub fn iter(&self) -> impl Iterator<Item = (DataDefinedProperty, &'static str)> + '_ {
        self.keys.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_new() {
        let registry = PropertyRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.key(DataDefinedProperty::Test), None);
    }

    #[test]
    fn registry_iter_is_property_ordered() {
        let mut registry = PropertyRegistry::new();
        registry.register(DataDefinedProperty::PositionY, "dataDefinedPositionY");
        registry.register(DataDefinedProperty::Test, "dataDefinedTestProperty");
        registry.register(DataDefinedProperty::PositionX, "dataDefinedPositionX");

        let keys: Vec<_> = registry.iter().map(|(_, key)| key).collect();
        assert_eq!(
            keys,
            vec![
                "dataDefinedTestProperty",
                "dataDefinedPositionX",
                "dataDefinedPositionY"
            ]
        );
        assert!(registry.contains(DataDefinedProperty::PositionX));
        assert!(!registry.contains(DataDefinedProperty::ItemWidth));
    }

    #[test]
    fn registry_reverse_lookup() {
        let mut registry = PropertyRegistry::new();
        registry.register(DataDefinedProperty::ItemRotation, "dataDefinedRotation");

        assert_eq!(
            registry.property_for_key("dataDefinedRotation"),
            Some(DataDefinedProperty::ItemRotation)
        );
        assert_eq!(registry.property_for_key("dataDefinedWidth"), None);
    }

    #[test]
    fn builtin_keys_cover_every_property() {
        let registry = PropertyRegistry::with_builtin_keys();
        for property in DataDefinedProperty::ALL {
            let key = registry.key(property).unwrap();
            assert_eq!(registry.property_for_key(key), Some(property));
        }
        assert_eq!(
            registry.key(DataDefinedProperty::Test),
            Some(TEST_PROPERTY_KEY)
        );
        assert_eq!(
            registry.key(DataDefinedProperty::PositionX),
            Some("dataDefinedPositionX")
        );
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_property() {
        let mut registry = PropertyRegistry::new();
        registry.register(DataDefinedProperty::Test, "a");
        registry.register(DataDefinedProperty::Test, "b");
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn registry_duplicate_key() {
        let mut registry = PropertyRegistry::new();
        registry.register(DataDefinedProperty::PositionX, "position");
        registry.register(DataDefinedProperty::PositionY, "position");
    }
}
