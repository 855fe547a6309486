// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data-defined property identification.
//!
//! This module provides [`DataDefinedProperty`], the closed set of properties an
//! item can override, and [`PropertySelector`], the argument type accepted at the
//! API boundary. The selector additionally carries the two sentinel values
//! (`NoProperty` and `AllProperties`) which never name a single property.

use core::fmt;

use crate::error::InvalidProperty;

/// A property whose value can be data defined.
///
/// Every property has a built-in storage key, see
/// [`PropertyRegistry::with_builtin_keys`](crate::PropertyRegistry::with_builtin_keys).
///
/// Properties are ordered, which keeps override storage and serialized output
/// deterministic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum DataDefinedProperty {
    /// Demonstration property.
    Test,

    // Page properties.
    /// Named paper size preset.
    PresetPaperSize,
    /// Paper width.
    PaperWidth,
    /// Paper height.
    PaperHeight,
    /// Number of pages in the composition.
    NumPages,
    /// Portrait or landscape.
    PaperOrientation,

    // General item properties.
    /// Page the item is placed on.
    PageNumber,
    /// Horizontal item position.
    PositionX,
    /// Vertical item position.
    PositionY,
    /// Item width.
    ItemWidth,
    /// Item height.
    ItemHeight,
    /// Item rotation in degrees.
    ItemRotation,
    /// Item transparency.
    Transparency,
    /// Blend mode used when painting the item.
    BlendMode,
    /// Whether the item is left out of exports.
    ExcludeFromExports,
}

impl DataDefinedProperty {
    /// Every property, in order.
    pub const ALL: [Self; 15] = [
        Self::Test,
        Self::PresetPaperSize,
        Self::PaperWidth,
        Self::PaperHeight,
        Self::NumPages,
        Self::PaperOrientation,
        Self::PageNumber,
        Self::PositionX,
        Self::PositionY,
        Self::ItemWidth,
        Self::ItemHeight,
        Self::ItemRotation,
        Self::Transparency,
        Self::BlendMode,
        Self::ExcludeFromExports,
    ];
}

impl fmt::Display for DataDefinedProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Selects a property, or one of the two sentinel values.
///
/// Every accessor on [`OverrideStore`](crate::OverrideStore) and
/// [`DataDefinedObject`](crate::DataDefinedObject) takes
/// `impl Into<PropertySelector>`, so a plain [`DataDefinedProperty`] can be
/// passed directly. Sentinels are rejected by lookups and mutations:
///
/// ```rust
/// use quire_data_defined::{DataDefinedProperty, PropertySelector};
///
/// let selector = PropertySelector::from(DataDefinedProperty::PositionX);
/// assert_eq!(selector.property(), Ok(DataDefinedProperty::PositionX));
/// assert!(PropertySelector::NoProperty.property().is_err());
/// assert!(PropertySelector::AllProperties.property().is_err());
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertySelector {
    /// No property.
    NoProperty,
    /// Every property at once. Only meaningful for refresh requests.
    AllProperties,
    /// A single property.
    Property(DataDefinedProperty),
}

impl PropertySelector {
    /// Returns the selected property, or [`InvalidProperty`] for a sentinel.
    #[inline]
    pub fn property(self) -> Result<DataDefinedProperty, InvalidProperty> {
        match self {
            Self::Property(property) => Ok(property),
            sentinel => Err(InvalidProperty(sentinel)),
        }
    }

    /// Returns `true` if `property` is covered by this selector.
    ///
    /// `AllProperties` covers everything and `NoProperty` covers nothing.
    #[must_use]
    pub fn covers(self, property: DataDefinedProperty) -> bool {
        match self {
            Self::NoProperty => false,
            Self::AllProperties => true,
            Self::Property(selected) => selected == property,
        }
    }
}

impl From<DataDefinedProperty> for PropertySelector {
    #[inline]
    fn from(property: DataDefinedProperty) -> Self {
        Self::Property(property)
    }
}

impl TryFrom<PropertySelector> for DataDefinedProperty {
    type Error = InvalidProperty;

    #[inline]
    fn try_from(selector: PropertySelector) -> Result<Self, Self::Error> {
        selector.property()
    }
}
