// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-object sparse override storage.
//!
//! This module provides [`OverrideStore`], mapping properties to their
//! [`DataDefined`] descriptors. Properties without an override have no entry.
//!
//! # Implementation
//!
//! Entries live in a sorted `SmallVec` searched with binary search rather than
//! in a hash map. Items rarely override more than a handful of properties, so
//! this keeps the common case inline, contiguous, and ordered for
//! serialization.

use smallvec::SmallVec;
use tracing::trace;

use crate::descriptor::DataDefined;
use crate::error::InvalidProperty;
use crate::id::{DataDefinedProperty, PropertySelector};

/// Inline capacity for override entries.
const INLINE_CAPACITY: usize = 4;

/// Per-object sparse storage for override descriptors.
///
/// # Entry lifecycle
///
/// An entry is created by the first [`set`](Self::set) whose values are not
/// default-shaped (inactive, not using an expression, empty expression and
/// field). Later calls update the entry in place, even when they set it back
/// to default-shaped values: entries are never removed by `set`.
///
/// # Example
///
/// ```rust
/// use quire_data_defined::{DataDefinedProperty, OverrideStore};
///
/// let width = DataDefinedProperty::ItemWidth;
/// let mut store = OverrideStore::new();
///
/// // Default-shaped values on a missing entry create nothing.
/// store.set(width, false, false, "", "").unwrap();
/// assert!(store.get(width).is_none());
///
/// store.set(width, true, false, "", "width_mm").unwrap();
/// assert_eq!(store.get(width).map(|dd| dd.field()), Some("width_mm"));
///
/// // Resetting keeps the entry.
/// store.set(width, false, false, "", "").unwrap();
/// assert!(store.get(width).is_some_and(|dd| !dd.is_active()));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OverrideStore {
    /// Entries, sorted by property for binary search lookup.
    entries: SmallVec<[(DataDefinedProperty, DataDefined); INLINE_CAPACITY]>,
}

impl OverrideStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no property has an entry.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the number of entries.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    fn find(&self, property: DataDefinedProperty) -> Result<usize, usize> {
        self.entries.binary_search_by_key(&property, |(p, _)| *p)
    }

    /// Returns the descriptor for a property.
    ///
    /// Returns `None` when the property has no entry or `property` is a sentinel.
    #[must_use]
    pub fn get(&self, property: impl Into<PropertySelector>) -> Option<&DataDefined> {
        let property = property.into().property().ok()?;
        self.find(property).ok().map(|idx| &self.entries[idx].1)
    }

    /// Returns a mutable reference to the descriptor for a property.
    #[must_use]
    pub fn get_mut(&mut self, property: impl Into<PropertySelector>) -> Option<&mut DataDefined> {
        let property = property.into().property().ok()?;
        self.find(property).ok().map(|idx| &mut self.entries[idx].1)
    }

    /// Returns `true` if the property has an entry.
    #[must_use]
    pub fn contains(&self, property: DataDefinedProperty) -> bool {
        self.find(property).is_ok()
    }

    /// Sets the override for a property.
    ///
    /// An existing entry is updated in place with all four values. Without an
    /// entry, one is created unless the values are default-shaped.
    ///
    /// Sentinel selectors change nothing and return [`InvalidProperty`].
    pub fn set(
        &mut self,
        property: impl Into<PropertySelector>,
        active: bool,
        use_expression: bool,
        expression: &str,
        field: &str,
    ) -> Result<(), InvalidProperty> {
        let selector = property.into();
        let property = selector.property().inspect_err(|_| {
            trace!(?selector, "ignoring override for a sentinel selector");
        })?;

        match self.find(property) {
            Ok(idx) => {
                let dd = &mut self.entries[idx].1;
                dd.set_active(active);
                dd.set_expression(expression);
                dd.set_field(field);
                dd.set_use_expression(use_expression);
            }
            Err(idx) => {
                if DataDefined::is_default_shaped(active, use_expression, expression, field) {
                    return Ok(());
                }
                self.entries.insert(
                    idx,
                    (
                        property,
                        DataDefined::new(active, use_expression, expression, field),
                    ),
                );
            }
        }
        Ok(())
    }

    /// Inserts or replaces a descriptor without the default-shape check.
    ///
    /// Used when restoring state, where an entry that was written must come back
    /// even if it is default-shaped.
    pub fn insert(&mut self, property: DataDefinedProperty, descriptor: DataDefined) {
        match self.find(property) {
            Ok(idx) => self.entries[idx].1 = descriptor,
            Err(idx) => self.entries.insert(idx, (property, descriptor)),
        }
    }

    /// Returns the properties that have entries, in order.
    pub fn properties(&self) -> impl Iterator<Item = DataDefinedProperty> + '_ {
        self.entries.iter().map(|(p, _)| *p)
    }

    /// Returns the entries, in property order.
    pub fn iter(&self) -> impl Iterator<Item = (DataDefinedProperty, &DataDefined)> {
        self.entries.iter().map(|(p, dd)| (*p, dd))
    }

    /// Returns the entries mutably, in property order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (DataDefinedProperty, &mut DataDefined)> {
        self.entries.iter_mut().map(|(p, dd)| (*p, dd))
    }
}
