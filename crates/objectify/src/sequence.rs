//! Sibling group access
//!
//! A node stands for the group of elements under its parent that share its
//! tag. The group is recomputed from the tree on every call, so it always
//! reflects the current children and the node's current tag. A root is a
//! group of one.

use dom::NodeId;

use crate::error::{ObjectifyError, Result};
use crate::node::ObjNode;

impl<'t> ObjNode<'t> {
    /// Current members of the sibling group, in document order
    pub(crate) fn group(&self) -> Result<Vec<NodeId>> {
        let Some(parent) = self.parent_elem() else {
            return Ok(vec![self.elem()]);
        };
        let arena = self.tree().borrow();
        let tag = &arena.get(self.elem())?.tag;
        let group = arena.find_all_children(parent, tag)?;
        Ok(group)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.group()?.len())
    }

    /// A detached or renamed-away node can leave its group empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.group()?.is_empty())
    }

    /// Group member at `index`; negative indices count from the end
    pub fn at(&self, index: isize) -> Result<ObjNode<'t>> {
        let group = self.group()?;
        let len = group.len();
        let pos = if index < 0 {
            len as isize + index
        } else {
            index
        };
        if pos < 0 || pos as usize >= len {
            return Err(ObjectifyError::OutOfRange { index, len });
        }
        Ok(self.sibling(group[pos as usize]))
    }

    /// Group members in `start..stop`, clamped like a slice with optional bounds
    pub fn slice(&self, start: Option<isize>, stop: Option<isize>) -> Result<Vec<ObjNode<'t>>> {
        let group = self.group()?;
        let len = group.len();
        let lo = clamp(start, 0, len);
        let hi = clamp(stop, len, len);
        if lo >= hi {
            return Ok(Vec::new());
        }
        Ok(group[lo..hi].iter().map(|&id| self.sibling(id)).collect())
    }

    /// Walk the group, re-reading it before every step
    pub fn iter(&self) -> Siblings<'t> {
        Siblings {
            anchor: self.clone(),
            pos: 0,
            done: false,
        }
    }
}

fn clamp(bound: Option<isize>, default: usize, len: usize) -> usize {
    match bound {
        None => default,
        Some(i) if i < 0 => (len as isize + i).max(0) as usize,
        Some(i) => (i as usize).min(len),
    }
}

/// Live iterator over a sibling group
pub struct Siblings<'t> {
    anchor: ObjNode<'t>,
    pos: usize,
    done: bool,
}

impl<'t> Iterator for Siblings<'t> {
    type Item = ObjNode<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let id = match self.anchor.group() {
            Ok(group) => group.get(self.pos).copied(),
            Err(e) => {
                tracing::warn!("Sibling iteration stopped: {}", e);
                None
            }
        };
        match id {
            Some(id) => {
                self.pos += 1;
                Some(self.anchor.sibling(id))
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

impl std::iter::FusedIterator for Siblings<'_> {}

impl<'a, 't> IntoIterator for &'a ObjNode<'t> {
    type Item = ObjNode<'t>;
    type IntoIter = Siblings<'t>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
