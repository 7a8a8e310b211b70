//! Core type definitions for the element tree
//!
//! Key design principles:
//! 1. Use u32 for indices (4 bytes vs 8 bytes pointer)
//! 2. Use SmallVec for small arrays (most elements have few attributes/children)
//! 3. Absent text is `None`, never an empty string

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::utils;

/// Node identifier (index into arena)
pub type NodeId = u32;

/// Attribute list in document order. Names are unique.
pub type AttributeList = SmallVec<[(String, String); 4]>;

/// An element in the arena
///
/// Layout follows the ElementTree model: `text` is the character data before
/// the first child, `tail` is the character data after the element's end tag
/// and before the next sibling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub node_id: NodeId,

    /// Tag name, `{uri}local` when namespaced
    pub tag: String,
    pub attributes: AttributeList,
    pub text: Option<String>,
    pub tail: Option<String>,

    // Navigation indices
    pub parent_id: Option<NodeId>,
    pub children_ids: SmallVec<[NodeId; 4]>, // Most elements have <4 children
}

impl Element {
    /// Create a detached element with no content
    pub fn new(node_id: NodeId, tag: impl Into<String>) -> Self {
        Self {
            node_id,
            tag: tag.into(),
            attributes: SmallVec::new(),
            text: None,
            tail: None,
            parent_id: None,
            children_ids: SmallVec::new(),
        }
    }

    /// Get attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set attribute value, keeping its position if it already exists
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Remove an attribute, returning its old value
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(key, _)| key == name)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Attributes as a sorted map (order-insensitive view)
    pub fn attribute_map(&self) -> BTreeMap<String, String> {
        self.attributes.iter().cloned().collect()
    }

    /// Namespace URI of the tag, if qualified
    pub fn namespace(&self) -> Option<&str> {
        utils::split_qname(&self.tag).0
    }

    /// Tag without its namespace group
    pub fn local_name(&self) -> &str {
        utils::split_qname(&self.tag).1
    }

    /// Check if element has children
    pub fn has_children(&self) -> bool {
        !self.children_ids.is_empty()
    }

    /// Compare everything except children and tree position
    pub fn same_content(&self, other: &Element) -> bool {
        self.tag == other.tag
            && self.text == other.text
            && self.tail == other.tail
            && self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .all(|(key, value)| other.attr(key) == Some(value.as_str()))
    }
}
