// Copyright 2025 the Quire Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structured document elements.
//!
//! [`Element`] is the node type objects write their state into and read it back
//! from: a tag, ordered string attributes, and child elements. It derives serde
//! traits, so a written tree can be persisted with any serde format.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A node of a structured document.
///
/// An element with an empty tag is *null*. Null elements are what a failed
/// lookup produces, and objects refuse to write into or read from them.
///
/// # Example
///
/// ```rust
/// use quire_data_defined::Element;
///
/// let mut root = Element::new("item");
/// root.append_child(Element::new("child")).set_attribute("n", "1");
///
/// assert_eq!(root.first_child_named("child").and_then(|c| c.attribute("n")), Some("1"));
/// assert!(root.first_child_named("missing").is_none());
/// assert!(Element::null().is_null());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    tag: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    attributes: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Element>,
}

impl Element {
    /// Creates an element with the given tag.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Creates a null element.
    #[must_use]
    pub fn null() -> Self {
        Self::default()
    }

    /// Returns `true` if this element is null.
    #[must_use]
    #[inline]
    pub fn is_null(&self) -> bool {
        self.tag.is_empty()
    }

    /// Returns the tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Sets an attribute, keeping its position if it already exists.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Returns the attributes in document order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Appends a child and returns a mutable reference to it.
    pub fn append_child(&mut self, child: Self) -> &mut Self {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Returns the children in document order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Returns the first child with the given tag.
    #[must_use]
    pub fn first_child_named(&self, tag: &str) -> Option<&Self> {
        self.children.iter().find(|child| child.tag == tag)
    }

    /// Returns the children with the given tag, in document order.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Self> + 'a {
        self.children.iter().filter(move |child| child.tag == tag)
    }

    /// Removes every child with the given tag, returning how many were removed.
    pub fn remove_children_named(&mut self, tag: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|child| child.tag != tag);
        before - self.children.len()
    }
}
