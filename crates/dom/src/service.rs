//! DOM Service - Main entry point for building element trees
//!
//! This handles:
//! - Parsing markup text (or a file) into the arena
//! - Loading a tree from a JSON description, and exporting one back
//!
//! JSON element format:
//! ```json
//! {
//!   "tag": "item",
//!   "attributes": { "id": "1" },
//!   "text": "hello",
//!   "tail": "\n",
//!   "children": [ ... ]
//! }
//! ```
//! Everything except `tag` is optional.

use std::path::Path;

use serde_json::{Map, Value};

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::parser::MarkupParser;
use crate::types::NodeId;

/// Configuration for DOM service
#[derive(Debug, Clone)]
pub struct DomServiceConfig {
    /// Keep text/tail runs made only of whitespace
    pub keep_whitespace_text: bool,
    /// Maximum element nesting depth accepted by the loaders
    pub max_depth: usize,
}

impl Default for DomServiceConfig {
    fn default() -> Self {
        Self {
            keep_whitespace_text: true,
            max_depth: 256,
        }
    }
}

/// Main DOM service
pub struct DomService {
    config: DomServiceConfig,
    arena: DomArena,
}

impl DomService {
    /// Create new DOM service with default config
    pub fn new() -> Self {
        Self::with_config(DomServiceConfig::default())
    }

    /// Create DOM service with custom config
    pub fn with_config(config: DomServiceConfig) -> Self {
        Self {
            config,
            arena: DomArena::new(),
        }
    }

    /// Get reference to internal arena
    pub fn arena(&self) -> &DomArena {
        &self.arena
    }

    /// Get mutable reference to internal arena
    pub fn arena_mut(&mut self) -> &mut DomArena {
        &mut self.arena
    }

    /// Give up the service and keep the arena
    pub fn into_arena(self) -> DomArena {
        self.arena
    }

    /// Parse markup text and make its document element the root
    pub fn parse_markup(&mut self, input: &str) -> Result<NodeId> {
        self.arena.clear();
        let root_id = MarkupParser::new(input, &self.config).parse_into(&mut self.arena)?;
        self.arena.set_root(root_id)?;
        Ok(root_id)
    }

    /// Read and parse a markup file
    pub fn parse_file(&mut self, path: impl AsRef<Path>) -> Result<NodeId> {
        let input = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("Parsing {}", path.as_ref().display());
        self.parse_markup(&input)
    }

    /// Load a tree from its JSON description and make it the root
    pub fn parse_json_tree(&mut self, json: &Value) -> Result<NodeId> {
        self.arena.clear();
        let root_id = self.parse_node(json, None, 1)?;
        self.arena.set_root(root_id)?;
        Ok(root_id)
    }

    /// Recursively load a JSON element
    fn parse_node(&mut self, json: &Value, parent_id: Option<NodeId>, depth: usize) -> Result<NodeId> {
        if depth > self.config.max_depth {
            return Err(DomError::MaxDepthExceeded {
                current: depth,
                max: self.config.max_depth,
            });
        }

        let tag = json["tag"]
            .as_str()
            .ok_or_else(|| DomError::InvalidJson("Missing 'tag'".to_string()))?;

        let mut attributes = Vec::new();
        match json.get("attributes") {
            None | Some(Value::Null) => {}
            Some(Value::Object(map)) => {
                for (key, value) in map {
                    let value = value.as_str().ok_or_else(|| {
                        DomError::InvalidJson(format!("Attribute '{}' is not a string", key))
                    })?;
                    attributes.push((key.clone(), value.to_string()));
                }
            }
            Some(_) => {
                return Err(DomError::InvalidJson(
                    "'attributes' must be an object".to_string(),
                ))
            }
        }

        let node_id = self.arena.make_node(tag, attributes);
        let node = self.arena.get_mut(node_id)?;
        node.text = optional_string(json, "text")?;
        node.tail = optional_string(json, "tail")?;
        if !self.config.keep_whitespace_text {
            node.text = node.text.take().filter(|s| !s.trim().is_empty());
            node.tail = node.tail.take().filter(|s| !s.trim().is_empty());
        }

        if let Some(parent_id) = parent_id {
            self.arena.append(parent_id, node_id)?;
        }

        // Parse children
        match json.get("children") {
            None | Some(Value::Null) => {}
            Some(Value::Array(children)) => {
                for child in children {
                    self.parse_node(child, Some(node_id), depth + 1)?;
                }
            }
            Some(_) => {
                return Err(DomError::InvalidJson(
                    "'children' must be an array".to_string(),
                ))
            }
        }

        Ok(node_id)
    }

    /// Export a subtree as its JSON description
    pub fn to_json(&self, node_id: NodeId) -> Result<Value> {
        let node = self.arena.get(node_id)?;
        let mut object = Map::new();
        object.insert("tag".to_string(), Value::String(node.tag.clone()));

        if !node.attributes.is_empty() {
            let attributes = node
                .attributes
                .iter()
                .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                .collect();
            object.insert("attributes".to_string(), Value::Object(attributes));
        }
        if let Some(text) = &node.text {
            object.insert("text".to_string(), Value::String(text.clone()));
        }
        if let Some(tail) = &node.tail {
            object.insert("tail".to_string(), Value::String(tail.clone()));
        }
        if node.has_children() {
            let children = node
                .children_ids
                .iter()
                .map(|&child_id| self.to_json(child_id))
                .collect::<Result<Vec<_>>>()?;
            object.insert("children".to_string(), Value::Array(children));
        }

        Ok(Value::Object(object))
    }
}

impl Default for DomService {
    fn default() -> Self {
        Self::new()
    }
}

fn optional_string(json: &Value, key: &str) -> Result<Option<String>> {
    match json.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DomError::InvalidJson(format!("'{}' must be a string", key))),
    }
}
