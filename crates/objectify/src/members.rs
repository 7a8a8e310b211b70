//! Member resolution
//!
//! Names are resolved in two tiers. First come the built-in properties and
//! the members claimed by the installed [`Extension`]; these shadow any child
//! element of the same name. Every other name addresses a child element.

use std::fmt;

use crate::error::{ObjectifyError, Result};
use crate::node::ObjNode;
use crate::value::Value;

/// Built-in properties of every node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Tag,
    Text,
    Tail,
    Attributes,
    Parent,
    Elem,
}

impl Property {
    pub const ALL: [Property; 6] = [
        Property::Tag,
        Property::Text,
        Property::Tail,
        Property::Attributes,
        Property::Parent,
        Property::Elem,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "tag" => Some(Property::Tag),
            "text" => Some(Property::Text),
            "tail" => Some(Property::Tail),
            "attrib" | "attributes" => Some(Property::Attributes),
            "parent" => Some(Property::Parent),
            "elem" => Some(Property::Elem),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Property::Tag => "tag",
            Property::Text => "text",
            Property::Tail => "tail",
            Property::Attributes => "attributes",
            Property::Parent => "parent",
            Property::Elem => "elem",
        }
    }

    /// Writable properties pass through to the wrapped element
    pub fn is_writable(self) -> bool {
        !matches!(self, Property::Parent | Property::Elem)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a name resolves to on a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    Property(Property),
    Extension,
    Child,
}

/// Extra named members installed on a root and inherited by its descendants
///
/// Claimed names take precedence over child elements, so a tree holding a
/// `<count>` child under an extension that claims `count` reaches the child
/// only through [`ObjNode::child`].
pub trait Extension {
    /// Extension name (for logging)
    fn name(&self) -> &str;

    /// Names this extension claims
    fn members(&self) -> &[&'static str];

    fn claims(&self, member: &str) -> bool {
        self.members().contains(&member)
    }

    fn get<'t>(&self, node: &ObjNode<'t>, member: &str) -> Result<Value<'t>>;

    fn set<'t>(&self, node: &ObjNode<'t>, member: &str, value: Value<'t>) -> Result<()> {
        let _ = (node, value);
        Err(ObjectifyError::ForbiddenMutation {
            member: member.to_string(),
        })
    }

    fn delete(&self, node: &ObjNode<'_>, member: &str) -> Result<()> {
        let _ = node;
        Err(ObjectifyError::ForbiddenMutation {
            member: member.to_string(),
        })
    }
}

/// Extension claiming nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExtension;

impl Extension for NoExtension {
    fn name(&self) -> &str {
        "none"
    }

    fn members(&self) -> &[&'static str] {
        &[]
    }

    fn get<'t>(&self, node: &ObjNode<'t>, member: &str) -> Result<Value<'t>> {
        Err(node.missing_child_kind().error(member))
    }
}
