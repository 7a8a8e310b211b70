//! DOM Serializer - Convert an element tree back to markup
//!
//! This module handles:
//! - Escaping text and attribute values
//! - Generating namespace prefixes for Clark-notation names
//! - Text/tail placement

use ahash::AHashMap;

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::NodeId;
use crate::utils::{self, XML_NAMESPACE};

/// Serializer configuration
#[derive(Debug, Clone)]
pub struct SerializerConfig {
    /// Emit `<?xml version="1.0"?>` first
    pub xml_declaration: bool,
    /// Write childless, textless elements as `<tag />`
    pub short_empty_elements: bool,
    /// Write the tail of the serialized top element
    pub include_tail: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        Self {
            xml_declaration: false,
            short_empty_elements: true,
            include_tail: false,
        }
    }
}

/// Element Tree Serializer
pub struct DomSerializer {
    config: SerializerConfig,
}

/// Namespace URI -> generated prefix, in first-use order
struct Prefixes {
    by_uri: AHashMap<String, String>,
    ordered: Vec<(String, String)>,
}

impl Prefixes {
    fn collect(arena: &DomArena, node_id: NodeId) -> Result<Self> {
        let mut prefixes = Prefixes {
            by_uri: AHashMap::new(),
            ordered: Vec::new(),
        };
        arena.traverse_df(node_id, |node| {
            prefixes.register(&node.tag);
            for (name, _) in &node.attributes {
                prefixes.register(name);
            }
            Ok(())
        })?;
        Ok(prefixes)
    }

    fn register(&mut self, name: &str) {
        let (Some(uri), _) = utils::split_qname(name) else {
            return;
        };
        if uri == XML_NAMESPACE || self.by_uri.contains_key(uri) {
            return;
        }
        let prefix = format!("ns{}", self.ordered.len());
        self.by_uri.insert(uri.to_string(), prefix.clone());
        self.ordered.push((prefix, uri.to_string()));
    }

    fn render(&self, name: &str) -> Result<String> {
        match utils::split_qname(name) {
            (None, local) => Ok(local.to_string()),
            (Some(XML_NAMESPACE), local) => Ok(format!("xml:{}", local)),
            (Some(uri), local) => {
                let prefix = self.by_uri.get(uri).ok_or_else(|| {
                    DomError::SerializationError(format!("no prefix for namespace '{}'", uri))
                })?;
                Ok(format!("{}:{}", prefix, local))
            }
        }
    }
}

impl DomSerializer {
    pub fn new() -> Self {
        Self::with_config(SerializerConfig::default())
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// Serialize the arena's root element
    pub fn serialize(&self, arena: &DomArena) -> Result<String> {
        let root_id = arena.root_id().ok_or(DomError::NoRoot)?;
        self.serialize_node(arena, root_id)
    }

    /// Serialize one element and its subtree
    pub fn serialize_node(&self, arena: &DomArena, node_id: NodeId) -> Result<String> {
        let prefixes = Prefixes::collect(arena, node_id)?;
        let mut output = String::with_capacity(256);

        if self.config.xml_declaration {
            output.push_str("<?xml version=\"1.0\"?>\n");
        }
        self.write_node(arena, node_id, &prefixes, true, &mut output)?;

        Ok(output)
    }

    fn write_node(
        &self,
        arena: &DomArena,
        node_id: NodeId,
        prefixes: &Prefixes,
        is_top: bool,
        output: &mut String,
    ) -> Result<()> {
        let node = arena.get(node_id)?;
        let name = prefixes.render(&node.tag)?;

        output.push('<');
        output.push_str(&name);
        if is_top {
            for (prefix, uri) in &prefixes.ordered {
                output.push_str(&format!(" xmlns:{}=\"{}\"", prefix, utils::escape_attribute(uri)));
            }
        }
        for (key, value) in &node.attributes {
            output.push_str(&format!(
                " {}=\"{}\"",
                prefixes.render(key)?,
                utils::escape_attribute(value)
            ));
        }

        let is_empty = node.text.is_none() && !node.has_children();
        if is_empty && self.config.short_empty_elements {
            output.push_str(" />");
        } else {
            output.push('>');
            if let Some(text) = &node.text {
                output.push_str(&utils::escape_text(text));
            }
            for &child_id in &node.children_ids {
                self.write_node(arena, child_id, prefixes, false, output)?;
            }
            output.push_str("</");
            output.push_str(&name);
            output.push('>');
        }

        if !is_top || self.config.include_tail {
            if let Some(tail) = &node.tail {
                output.push_str(&utils::escape_text(tail));
            }
        }

        Ok(())
    }
}

impl Default for DomSerializer {
    fn default() -> Self {
        Self::new()
    }
}
