//! Attribute-style access to element trees
//!
//! Wraps a shared [`dom::DomArena`] so children are reached by name, a node
//! doubles as the group of same-tag siblings, and assignment by name builds
//! or replaces child elements.
//!
//! ## Core Design
//!
//! ```text
//! RefCell<DomArena> ← ObjNode (elem, parent chain, lineage)
//!                        ├─ child("b") / lookup / assign / delete
//!                        ├─ at / slice / iter   (live sibling group)
//!                        └─ ==, signatures      (structural)
//! ```
//!
//! ```no_run
//! use std::cell::RefCell;
//!
//! let tree = RefCell::new(dom::parse("<order><item>1</item><item>2</item></order>")?);
//! let order = objectify::objectify(&tree)?;
//! let item = order.child("item")?;
//! assert_eq!(item.len()?, 2);
//! assert!(item.at(-1)? == "2");
//! order.assign("total", 3)?;
//! # Ok::<(), objectify::ObjectifyError>(())
//! ```

pub mod config;
pub mod error;
pub mod members;
mod mutation;
pub mod node;
mod sequence;
pub mod signature;
pub mod value;

pub use config::{MissingChildKind, ObjectifyConfig};
pub use error::{ObjectifyError, Result};
pub use members::{Extension, Member, NoExtension, Property};
pub use node::{Ancestors, ObjNode, SharedTree};
pub use sequence::Siblings;
pub use signature::Signature;
pub use value::Value;

use dom::DomError;

/// Root facade over the tree's document element
pub fn objectify(tree: &SharedTree) -> Result<ObjNode<'_>> {
    objectify_with(tree, ObjectifyConfig::default())
}

pub fn objectify_with(tree: &SharedTree, config: ObjectifyConfig) -> Result<ObjNode<'_>> {
    let root_id = tree.borrow().root_id().ok_or(DomError::NoRoot)?;
    ObjNode::with_config(tree, root_id, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_objectify_wraps_root() {
        let tree = RefCell::new(dom::parse("<a><b/></a>").unwrap());
        let root = objectify(&tree).unwrap();

        assert_eq!(root.tag().unwrap(), "a");
        assert!(root.is_root());
    }

    #[test]
    fn test_objectify_without_root() {
        let tree = RefCell::new(dom::DomArena::new());
        assert!(matches!(
            objectify(&tree).unwrap_err(),
            ObjectifyError::Dom(DomError::NoRoot)
        ));
    }
}
