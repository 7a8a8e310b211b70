//! Values read from or written to a facade node by name

use std::collections::BTreeMap;

use dom::NodeId;

use crate::node::ObjNode;

/// A member value
///
/// Assigning a value to a child name turns it into a child element:
/// `Raw` and `Node` supply the element itself, `Text` and `None` produce a
/// new element holding that text (or none).
///
/// The primitive numbers, `bool` and `char` convert into `Text`. A `u32`
/// is a [`NodeId`] and is written `Value::Raw(id)`.
#[derive(Debug, Clone)]
pub enum Value<'t> {
    None,
    Text(String),
    Attributes(BTreeMap<String, String>),
    /// Element of the underlying tree, unwrapped
    Raw(NodeId),
    Node(ObjNode<'t>),
}

impl<'t> Value<'t> {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&ObjNode<'t>> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn into_node(self) -> Option<ObjNode<'t>> {
        match self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }
}

impl From<&str> for Value<'_> {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value<'_> {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Option<String>> for Value<'_> {
    fn from(text: Option<String>) -> Self {
        text.map(Value::Text).unwrap_or(Value::None)
    }
}

impl From<BTreeMap<String, String>> for Value<'_> {
    fn from(attributes: BTreeMap<String, String>) -> Self {
        Value::Attributes(attributes)
    }
}

impl<'t> From<ObjNode<'t>> for Value<'t> {
    fn from(node: ObjNode<'t>) -> Self {
        Value::Node(node)
    }
}

impl<'t> From<&ObjNode<'t>> for Value<'t> {
    fn from(node: &ObjNode<'t>) -> Self {
        Value::Node(node.clone())
    }
}

macro_rules! text_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value<'_> {
                fn from(value: $ty) -> Self {
                    Value::Text(value.to_string())
                }
            }
        )*
    };
}

text_from_display!(i8, i16, i32, i64, isize, u8, u16, u64, usize, f32, f64, bool, char);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitives_convert_to_text() {
        assert_eq!(Value::from(-3i64).as_text(), Some("-3"));
        assert_eq!(Value::from(2.5f64).as_text(), Some("2.5"));
        assert_eq!(Value::from(true).as_text(), Some("true"));
        assert_eq!(Value::from('x').as_text(), Some("x"));
        assert!(Value::from(None::<String>).is_none());
        assert!(matches!(Value::Raw(7), Value::Raw(7)));
    }
}
