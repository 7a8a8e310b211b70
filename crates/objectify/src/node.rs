//! Facade node
//!
//! An `ObjNode` wraps one element of a shared [`DomArena`] and remembers the
//! facade it was reached from. It never owns the tree: every read and write
//! goes through the `RefCell`, so all facades over one tree observe each
//! other's changes immediately.
//!
//! ```text
//!   RefCell<DomArena> ◄──── &'t ────┬──────────┬──────────┐
//!                                 root ◄──── child ◄──── grandchild
//!                                      parent (Rc)   parent (Rc)
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::ptr;
use std::rc::Rc;

use dom::{utils, DomArena, DomSerializer, Element, NodeId};

use crate::config::{MissingChildKind, ObjectifyConfig};
use crate::error::{ObjectifyError, Result};
use crate::members::{Extension, Member, NoExtension, Property};

/// A tree shared between facades
pub type SharedTree = RefCell<DomArena>;

/// Settings a root hands down to every node navigated from it
struct Lineage {
    missing_child: MissingChildKind,
    extension: Rc<dyn Extension>,
}

/// Attribute-style view of one element
#[derive(Clone)]
pub struct ObjNode<'t> {
    tree: &'t SharedTree,
    elem: NodeId,
    parent: Option<Rc<ObjNode<'t>>>,
    lineage: Rc<Lineage>,
}

impl<'t> ObjNode<'t> {
    /// Root facade with the default configuration
    pub fn new(tree: &'t SharedTree, elem: NodeId) -> Result<Self> {
        Self::with_config(tree, elem, ObjectifyConfig::default())
    }

    pub fn with_config(tree: &'t SharedTree, elem: NodeId, config: ObjectifyConfig) -> Result<Self> {
        Self::with_extension(tree, elem, config, Rc::new(NoExtension))
    }

    /// Root facade whose descendants all share `extension`
    pub fn with_extension(
        tree: &'t SharedTree,
        elem: NodeId,
        config: ObjectifyConfig,
        extension: Rc<dyn Extension>,
    ) -> Result<Self> {
        tree.borrow().get(elem)?;
        tracing::debug!(
            "Wrapping node {} (extension: {}, missing child: {})",
            elem,
            extension.name(),
            config.missing_child
        );
        Ok(Self {
            tree,
            elem,
            parent: None,
            lineage: Rc::new(Lineage {
                missing_child: config.missing_child,
                extension,
            }),
        })
    }

    /// General constructor
    ///
    /// Without a parent the node is a root and `missing_child` (or the
    /// default) becomes its lineage setting. With a parent, the lineage is
    /// inherited unless `missing_child` overrides it; the parent must wrap
    /// the same tree.
    pub fn construct(
        tree: &'t SharedTree,
        elem: NodeId,
        parent: Option<&ObjNode<'t>>,
        missing_child: Option<MissingChildKind>,
    ) -> Result<Self> {
        let Some(parent) = parent else {
            let config = ObjectifyConfig {
                missing_child: missing_child.unwrap_or_default(),
            };
            return Self::with_config(tree, elem, config);
        };

        if !ptr::eq(tree, parent.tree) {
            return Err(ObjectifyError::ForeignTree);
        }
        tree.borrow().get(elem)?;

        let lineage = match missing_child {
            Some(kind) => Rc::new(Lineage {
                missing_child: kind,
                extension: Rc::clone(&parent.lineage.extension),
            }),
            None => Rc::clone(&parent.lineage),
        };
        Ok(Self {
            tree,
            elem,
            parent: Some(Rc::new(parent.clone())),
            lineage,
        })
    }

    /// Facade for a child element reached from this node
    pub(crate) fn derive(&self, elem: NodeId) -> Self {
        Self {
            tree: self.tree,
            elem,
            parent: Some(Rc::new(self.clone())),
            lineage: Rc::clone(&self.lineage),
        }
    }

    /// Facade for an element sharing this node's parent
    pub(crate) fn sibling(&self, elem: NodeId) -> Self {
        Self {
            tree: self.tree,
            elem,
            parent: self.parent.clone(),
            lineage: Rc::clone(&self.lineage),
        }
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&Element) -> R) -> Result<R> {
        let arena = self.tree.borrow();
        Ok(f(arena.get(self.elem)?))
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut Element) -> R) -> Result<R> {
        let mut arena = self.tree.borrow_mut();
        Ok(f(arena.get_mut(self.elem)?))
    }

    pub(crate) fn missing(&self, name: &str) -> ObjectifyError {
        self.lineage.missing_child.error(name)
    }

    pub(crate) fn extension(&self) -> &Rc<dyn Extension> {
        &self.lineage.extension
    }

    pub(crate) fn parent_elem(&self) -> Option<NodeId> {
        self.parent.as_ref().map(|parent| parent.elem)
    }

    // ========== Identity ==========

    /// The wrapped element
    pub fn elem(&self) -> NodeId {
        self.elem
    }

    pub fn tree(&self) -> &'t SharedTree {
        self.tree
    }

    pub fn same_tree(&self, other: &ObjNode<'_>) -> bool {
        ptr::eq(self.tree, other.tree)
    }

    /// The facade this node was reached from, `None` for a root
    pub fn parent(&self) -> Option<ObjNode<'t>> {
        self.parent.as_deref().cloned()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn missing_child_kind(&self) -> &MissingChildKind {
        &self.lineage.missing_child
    }

    pub fn extension_name(&self) -> String {
        self.lineage.extension.name().to_string()
    }

    // ========== Element pass-throughs ==========

    pub fn tag(&self) -> Result<String> {
        self.read(|elem| elem.tag.clone())
    }

    pub fn set_tag(&self, tag: impl Into<String>) -> Result<()> {
        let tag = tag.into();
        self.write(|elem| elem.tag = tag)
    }

    pub fn text(&self) -> Result<Option<String>> {
        self.read(|elem| elem.text.clone())
    }

    pub fn set_text(&self, text: Option<&str>) -> Result<()> {
        self.write(|elem| elem.text = text.map(str::to_string))
    }

    pub fn tail(&self) -> Result<Option<String>> {
        self.read(|elem| elem.tail.clone())
    }

    pub fn set_tail(&self, tail: Option<&str>) -> Result<()> {
        self.write(|elem| elem.tail = tail.map(str::to_string))
    }

    pub fn attributes(&self) -> Result<BTreeMap<String, String>> {
        self.read(Element::attribute_map)
    }

    /// Replace all attributes of the wrapped element
    pub fn set_attributes(&self, attributes: BTreeMap<String, String>) -> Result<()> {
        self.write(|elem| {
            elem.attributes.clear();
            for (key, value) in attributes {
                elem.set_attr(key, value);
            }
        })
    }

    /// Attribute value, `None` when absent
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.read(|elem| elem.attr(key).map(str::to_string))
    }

    pub fn get_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let (key, value) = (key.into(), value.into());
        self.write(|elem| elem.set_attr(key, value))
    }

    /// Attribute names in document order
    pub fn keys(&self) -> Result<Vec<String>> {
        self.read(|elem| elem.attributes.iter().map(|(k, _)| k.clone()).collect())
    }

    pub fn items(&self) -> Result<Vec<(String, String)>> {
        self.read(|elem| elem.attributes.to_vec())
    }

    /// Serialize the wrapped element and its subtree
    pub fn to_markup(&self) -> Result<String> {
        let arena = self.tree.borrow();
        Ok(DomSerializer::new().serialize_node(&arena, self.elem)?)
    }

    // ========== Navigation ==========

    /// Resolve `name` against this node's namespace
    pub fn qualify(&self, name: &str) -> Result<String> {
        self.read(|elem| utils::qualify(&elem.tag, name))
    }

    /// First child whose tag is `name`, qualified with this node's namespace
    pub fn child(&self, name: &str) -> Result<ObjNode<'t>> {
        let found = {
            let arena = self.tree.borrow();
            let qualified = utils::qualify(&arena.get(self.elem)?.tag, name);
            arena.find_child(self.elem, &qualified)?
        };
        match found {
            Some(id) => Ok(self.derive(id)),
            None => {
                tracing::trace!("No child '{}' under node {}", name, self.elem);
                Err(self.missing(name))
            }
        }
    }

    pub fn has_child(&self, name: &str) -> Result<bool> {
        let arena = self.tree.borrow();
        let qualified = utils::qualify(&arena.get(self.elem)?.tag, name);
        Ok(arena.find_child(self.elem, &qualified)?.is_some())
    }

    /// All child elements, in document order
    pub fn children(&self) -> Result<Vec<ObjNode<'t>>> {
        let ids = self.tree.borrow().children(self.elem)?.to_vec();
        Ok(ids.into_iter().map(|id| self.derive(id)).collect())
    }

    /// What `name` resolves to on this node
    pub fn member(&self, name: &str) -> Member {
        if let Some(property) = Property::from_name(name) {
            Member::Property(property)
        } else if self.lineage.extension.claims(name) {
            Member::Extension
        } else {
            Member::Child
        }
    }

    // ========== Ancestors ==========

    /// Topmost facade of this node's navigation chain
    pub fn root(&self) -> ObjNode<'t> {
        let mut node = self;
        while let Some(parent) = node.parent.as_deref() {
            node = parent;
        }
        node.clone()
    }

    /// Parent, grandparent, and so on up to the root; empty for a root
    pub fn ancestors(&self) -> Ancestors<'t> {
        Ancestors {
            next: self.parent.clone(),
        }
    }

    /// Number of facades above this one
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }
}

/// Lazy walk up a navigation chain
pub struct Ancestors<'t> {
    next: Option<Rc<ObjNode<'t>>>,
}

impl<'t> Iterator for Ancestors<'t> {
    type Item = ObjNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next.take()?;
        self.next = node.parent.clone();
        Some((*node).clone())
    }
}

impl fmt::Display for ObjNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let markup = self.to_markup().map_err(|_| fmt::Error)?;
        f.write_str(&markup)
    }
}

impl fmt::Debug for ObjNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self
            .tree
            .try_borrow()
            .ok()
            .and_then(|arena| arena.get(self.elem).ok().map(|elem| elem.tag.clone()));
        f.debug_struct("ObjNode")
            .field("elem", &self.elem)
            .field("tag", &tag)
            .field("parent", &self.parent_elem())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(markup: &str) -> SharedTree {
        RefCell::new(dom::parse(markup).unwrap())
    }

    #[test]
    fn test_new_rejects_unknown_node() {
        let tree = tree("<a/>");
        let err = ObjNode::new(&tree, 42).unwrap_err();
        assert!(matches!(err, ObjectifyError::Dom(dom::DomError::NodeNotFound(42))));
    }

    #[test]
    fn test_child_and_parent_links() {
        let tree = tree("<a><b><c/></b></a>");
        let root = ObjNode::new(&tree, 0).unwrap();
        let c = root.child("b").unwrap().child("c").unwrap();

        assert_eq!(c.tag().unwrap(), "c");
        assert_eq!(c.parent().unwrap().tag().unwrap(), "b");
        assert_eq!(c.root().elem(), root.elem());
        assert_eq!(c.depth(), 2);
        assert!(root.is_root());
        assert!(!c.is_root());
    }

    #[test]
    fn test_missing_child_uses_lineage_kind() {
        let tree = tree("<a><b/></a>");
        let config = ObjectifyConfig {
            missing_child: MissingChildKind::NoSuchKey,
        };
        let root = ObjNode::with_config(&tree, 0, config).unwrap();
        let b = root.child("b").unwrap();

        let err = b.child("nope").unwrap_err();
        assert!(matches!(
            err,
            ObjectifyError::MissingChild { kind: MissingChildKind::NoSuchKey, ref name } if name == "nope"
        ));
    }

    #[test]
    fn test_construct_checks_tree() {
        let first = tree("<a><b/></a>");
        let second = tree("<a><b/></a>");
        let root = ObjNode::new(&first, 0).unwrap();

        let err = ObjNode::construct(&second, 1, Some(&root), None).unwrap_err();
        assert!(matches!(err, ObjectifyError::ForeignTree));

        let b = ObjNode::construct(&first, 1, Some(&root), Some(MissingChildKind::NoSuchKey)).unwrap();
        assert_eq!(b.missing_child_kind(), &MissingChildKind::NoSuchKey);
        assert_eq!(root.missing_child_kind(), &MissingChildKind::NoSuchAttribute);
    }

    #[test]
    fn test_namespace_qualified_child() {
        let tree = tree(r#"<r xmlns="urn:x"><b>1</b></r>"#);
        let root = ObjNode::new(&tree, 0).unwrap();

        assert_eq!(root.qualify("b").unwrap(), "{urn:x}b");
        assert_eq!(root.child("b").unwrap().text().unwrap().as_deref(), Some("1"));
        assert!(root.has_child("{urn:x}b").unwrap());
        assert!(!root.has_child("{urn:y}b").unwrap());
    }

    #[test]
    fn test_attribute_pass_throughs() {
        let tree = tree(r#"<a k="v" n="1"/>"#);
        let root = ObjNode::new(&tree, 0).unwrap();

        assert_eq!(root.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(root.get("x").unwrap(), None);
        assert_eq!(root.get_or("x", "d").unwrap(), "d");
        assert_eq!(root.keys().unwrap(), vec!["k", "n"]);

        root.set("k", "w").unwrap();
        assert_eq!(
            root.items().unwrap(),
            vec![("k".to_string(), "w".to_string()), ("n".to_string(), "1".to_string())]
        );
    }

    #[test]
    fn test_ancestors_order() {
        let tree = tree("<a><b><c/></b></a>");
        let root = ObjNode::new(&tree, 0).unwrap();
        let c = root.child("b").unwrap().child("c").unwrap();

        let tags: Vec<String> = c.ancestors().map(|node| node.tag().unwrap()).collect();
        assert_eq!(tags, vec!["b", "a"]);
        assert_eq!(root.ancestors().count(), 0);
    }

    #[test]
    fn test_display_serializes_subtree() {
        let tree = tree("<a><b>x</b>tail</a>");
        let root = ObjNode::new(&tree, 0).unwrap();

        assert_eq!(root.child("b").unwrap().to_string(), "<b>x</b>");
        assert_eq!(format!("{}", root), "<a><b>x</b>tail</a>");
    }
}
