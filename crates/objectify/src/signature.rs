//! Structural signatures and equality
//!
//! Two nodes are equal when their elements match in tag, attributes
//! (order-insensitive), text, tail and, recursively, ordered children.
//! Comparing a node with a string compares its text.

use std::collections::BTreeMap;

use dom::{DomArena, NodeId};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::node::ObjNode;
use crate::value::Value;

/// Hashable snapshot of an element's content
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Signature {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub text: Option<String>,
    /// Empty for a shallow signature
    pub children: Vec<Signature>,
    pub tail: Option<String>,
}

impl Signature {
    /// The element's own content, children left out
    pub fn shallow(arena: &DomArena, node_id: NodeId) -> dom::Result<Self> {
        let elem = arena.get(node_id)?;
        Ok(Self {
            tag: elem.tag.clone(),
            attributes: elem.attribute_map(),
            text: elem.text.clone(),
            children: Vec::new(),
            tail: elem.tail.clone(),
        })
    }

    pub fn deep(arena: &DomArena, node_id: NodeId) -> dom::Result<Self> {
        // Pre-order (node, parent index), children in document order
        let mut order: Vec<(NodeId, Option<usize>)> = Vec::new();
        let mut pending = vec![(node_id, None)];
        while let Some((id, parent)) = pending.pop() {
            let index = order.len();
            order.push((id, parent));
            for &child_id in arena.children(id)?.iter().rev() {
                pending.push((child_id, Some(index)));
            }
        }

        let mut built = order
            .iter()
            .map(|&(id, _)| Self::shallow(arena, id))
            .collect::<dom::Result<Vec<_>>>()?;

        // Descendants follow their parent in `order`; siblings fold in last-first
        for index in (1..order.len()).rev() {
            let mut signature = std::mem::take(&mut built[index]);
            signature.children.reverse();
            if let Some(parent) = order[index].1 {
                built[parent].children.push(signature);
            }
        }

        let mut root = built.into_iter().next().unwrap_or_default();
        root.children.reverse();
        Ok(root)
    }
}

impl Drop for Signature {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut signature) = pending.pop() {
            pending.append(&mut signature.children);
        }
    }
}

impl<'t> ObjNode<'t> {
    pub fn shallow_signature(&self) -> Result<Signature> {
        let arena = self.tree().borrow();
        let signature = Signature::shallow(&arena, self.elem())?;
        Ok(signature)
    }

    pub fn deep_signature(&self) -> Result<Signature> {
        let arena = self.tree().borrow();
        let signature = Signature::deep(&arena, self.elem())?;
        Ok(signature)
    }

    /// Compare against an arbitrary value
    ///
    /// Nodes compare structurally, text compares with the element's text.
    /// `None` means the two are not comparable.
    pub fn compare_value(&self, other: &Value<'_>) -> Option<bool> {
        match other {
            Value::Node(node) => Some(self == node),
            Value::Raw(id) => {
                let arena = self.tree().borrow();
                Some(arena.structurally_equal(self.elem(), &arena, *id))
            }
            Value::Text(text) => Some(self == text.as_str()),
            Value::None | Value::Attributes(_) => None,
        }
    }
}

impl PartialEq for ObjNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        if self.same_tree(other) {
            if self.elem() == other.elem() {
                return true;
            }
            let arena = self.tree().borrow();
            return arena.structurally_equal(self.elem(), &arena, other.elem());
        }
        let (left, right) = (self.tree().borrow(), other.tree().borrow());
        left.structurally_equal(self.elem(), &right, other.elem())
    }
}

impl PartialEq<str> for ObjNode<'_> {
    fn eq(&self, other: &str) -> bool {
        matches!(self.text(), Ok(Some(text)) if text == other)
    }
}

impl PartialEq<&str> for ObjNode<'_> {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<String> for ObjNode<'_> {
    fn eq(&self, other: &String) -> bool {
        self == other.as_str()
    }
}

impl PartialEq<ObjNode<'_>> for str {
    fn eq(&self, other: &ObjNode<'_>) -> bool {
        other == self
    }
}

impl PartialEq<ObjNode<'_>> for &str {
    fn eq(&self, other: &ObjNode<'_>) -> bool {
        other == *self
    }
}

impl PartialEq<ObjNode<'_>> for String {
    fn eq(&self, other: &ObjNode<'_>) -> bool {
        other == self.as_str()
    }
}
