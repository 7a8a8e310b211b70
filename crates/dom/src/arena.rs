//! Arena-based element tree storage
//!
//! Every element of a document lives in one `Vec<Element>`; parent and child
//! links are `u32` indices into it. Ids are never reused: removing an element
//! only detaches it, so a `NodeId` stays valid for the arena's lifetime and a
//! detached element can be attached again.
//!
//! ```text
//! Arena: Vec<Element>
//!        [Node0][Node1][Node2]...
//!         ↑ 4-byte index, not 8-byte pointer
//! ```

use crate::error::{DomError, Result};
use crate::types::{Element, NodeId};

/// Arena allocator for elements
#[derive(Debug, Clone)]
pub struct DomArena {
    /// All elements, attached or not
    nodes: Vec<Element>,

    /// Document element (if set)
    root_id: Option<NodeId>,
}

impl DomArena {
    /// Create a new empty arena
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create arena with specific capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            root_id: None,
        }
    }

    /// Create a detached element, returns its ID
    pub fn make_node<I>(&mut self, tag: impl Into<String>, attributes: I) -> NodeId
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let node_id = self.nodes.len() as NodeId;
        let mut element = Element::new(node_id, tag);
        for (name, value) in attributes {
            element.set_attr(name, value);
        }
        tracing::trace!("Created node {} <{}>", node_id, element.tag);
        self.nodes.push(element);
        node_id
    }

    /// Get node by ID (immutable)
    pub fn get(&self, node_id: NodeId) -> Result<&Element> {
        self.nodes
            .get(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Get node by ID (mutable)
    pub fn get_mut(&mut self, node_id: NodeId) -> Result<&mut Element> {
        self.nodes
            .get_mut(node_id as usize)
            .ok_or(DomError::NodeNotFound(node_id))
    }

    /// Check that an ID refers to an element of this arena
    pub fn contains(&self, node_id: NodeId) -> bool {
        (node_id as usize) < self.nodes.len()
    }

    /// Set root node
    pub fn set_root(&mut self, node_id: NodeId) -> Result<()> {
        // Verify node exists
        self.get(node_id)?;
        self.root_id = Some(node_id);
        Ok(())
    }

    /// Get root node ID
    pub fn root_id(&self) -> Option<NodeId> {
        self.root_id
    }

    /// Get root node
    pub fn root(&self) -> Result<&Element> {
        let root_id = self.root_id.ok_or(DomError::NoRoot)?;
        self.get(root_id)
    }

    /// Total number of elements, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if arena is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Child IDs of a node, in document order
    pub fn children(&self, node_id: NodeId) -> Result<&[NodeId]> {
        Ok(&self.get(node_id)?.children_ids)
    }

    /// Parent ID of a node
    pub fn parent(&self, node_id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(node_id)?.parent_id)
    }

    /// First direct child whose tag equals `tag`
    pub fn find_child(&self, node_id: NodeId, tag: &str) -> Result<Option<NodeId>> {
        let node = self.get(node_id)?;
        Ok(node
            .children_ids
            .iter()
            .copied()
            .find(|&child_id| self.has_tag(child_id, tag)))
    }

    /// All direct children whose tag equals `tag`, in document order
    pub fn find_all_children(&self, node_id: NodeId, tag: &str) -> Result<Vec<NodeId>> {
        let node = self.get(node_id)?;
        Ok(node
            .children_ids
            .iter()
            .copied()
            .filter(|&child_id| self.has_tag(child_id, tag))
            .collect())
    }

    fn has_tag(&self, node_id: NodeId, tag: &str) -> bool {
        self.nodes
            .get(node_id as usize)
            .map(|node| node.tag == tag)
            .unwrap_or(false)
    }

    /// Position of `child` among the children of `parent`
    pub fn index_of(&self, parent_id: NodeId, child_id: NodeId) -> Result<usize> {
        self.get(parent_id)?
            .children_ids
            .iter()
            .position(|&id| id == child_id)
            .ok_or(DomError::NotAChild {
                parent: parent_id,
                child: child_id,
            })
    }

    /// Check whether `ancestor` is a proper ancestor of `node_id`
    pub fn is_ancestor(&self, ancestor: NodeId, node_id: NodeId) -> bool {
        let mut current = self.nodes.get(node_id as usize).and_then(|n| n.parent_id);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id as usize).and_then(|n| n.parent_id);
        }
        false
    }

    fn check_attachable(&self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        self.get(parent_id)?;
        self.get(child_id)?;
        if parent_id == child_id || self.is_ancestor(child_id, parent_id) {
            return Err(DomError::WouldCreateCycle {
                parent: parent_id,
                child: child_id,
            });
        }
        Ok(())
    }

    /// Unlink a node from its parent. Detached nodes are left untouched.
    pub fn detach(&mut self, node_id: NodeId) -> Result<()> {
        let Some(parent_id) = self.get(node_id)?.parent_id else {
            return Ok(());
        };
        let pos = self.index_of(parent_id, node_id)?;
        self.get_mut(parent_id)?.children_ids.remove(pos);
        self.get_mut(node_id)?.parent_id = None;
        Ok(())
    }

    /// Append `child` as the last child of `parent`, moving it if attached elsewhere
    pub fn append(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        self.check_attachable(parent_id, child_id)?;
        self.detach(child_id)?;
        self.get_mut(parent_id)?.children_ids.push(child_id);
        self.get_mut(child_id)?.parent_id = Some(parent_id);
        tracing::debug!("Appended node {} to {}", child_id, parent_id);
        Ok(())
    }

    /// Replace the child at `index` with `child`
    ///
    /// The index addresses the current child list; the node found there is
    /// the one replaced even if moving `child` shifts positions. The replaced
    /// node becomes detached.
    pub fn replace_at(&mut self, parent_id: NodeId, index: usize, child_id: NodeId) -> Result<()> {
        self.check_attachable(parent_id, child_id)?;
        let children = &self.get(parent_id)?.children_ids;
        let target = *children.get(index).ok_or(DomError::IndexOutOfBounds {
            index,
            len: children.len(),
        })?;
        if target == child_id {
            return Ok(());
        }

        self.detach(child_id)?;
        let pos = self.index_of(parent_id, target)?;
        self.get_mut(parent_id)?.children_ids[pos] = child_id;
        self.get_mut(child_id)?.parent_id = Some(parent_id);
        self.get_mut(target)?.parent_id = None;
        tracing::debug!(
            "Replaced node {} with {} under {} at {}",
            target,
            child_id,
            parent_id,
            pos
        );
        Ok(())
    }

    /// Remove `child` from the children of `parent`
    pub fn remove(&mut self, parent_id: NodeId, child_id: NodeId) -> Result<()> {
        let pos = self.index_of(parent_id, child_id)?;
        self.get_mut(parent_id)?.children_ids.remove(pos);
        self.get_mut(child_id)?.parent_id = None;
        tracing::debug!("Removed node {} from {}", child_id, parent_id);
        Ok(())
    }

    /// Traverse tree depth-first (iterative, no recursion)
    pub fn traverse_df<F>(&self, start_id: NodeId, mut visit: F) -> Result<()>
    where
        F: FnMut(&Element) -> Result<()>,
    {
        let mut stack = vec![start_id];

        while let Some(node_id) = stack.pop() {
            let node = self.get(node_id)?;
            visit(node)?;

            // Push children in reverse order (so they're visited left-to-right)
            for &child_id in node.children_ids.iter().rev() {
                stack.push(child_id);
            }
        }

        Ok(())
    }

    /// Deep copy of a subtree of `other` into this arena, detached
    pub fn import_subtree(&mut self, other: &DomArena, node_id: NodeId) -> Result<NodeId> {
        let plan = other.subtree_plan(node_id)?;
        Ok(self.materialize(plan))
    }

    /// Deep copy of a subtree of this arena, detached
    pub fn deep_copy(&mut self, node_id: NodeId) -> Result<NodeId> {
        let plan = self.subtree_plan(node_id)?;
        Ok(self.materialize(plan))
    }

    /// Pre-order list of (element, index of its parent within the list)
    fn subtree_plan(&self, start_id: NodeId) -> Result<Vec<(Element, Option<usize>)>> {
        let mut plan = Vec::new();
        let mut stack = vec![(start_id, None)];

        while let Some((node_id, parent_slot)) = stack.pop() {
            let node = self.get(node_id)?;
            let slot = plan.len();
            plan.push((node.clone(), parent_slot));
            for &child_id in node.children_ids.iter().rev() {
                stack.push((child_id, Some(slot)));
            }
        }

        Ok(plan)
    }

    fn materialize(&mut self, plan: Vec<(Element, Option<usize>)>) -> NodeId {
        let first_id = self.nodes.len() as NodeId;
        for (slot, (source, parent_slot)) in plan.into_iter().enumerate() {
            let node_id = first_id + slot as NodeId;
            let mut element = Element::new(node_id, source.tag);
            element.attributes = source.attributes;
            element.text = source.text;
            element.tail = source.tail;
            if let Some(parent_slot) = parent_slot {
                let parent_id = first_id + parent_slot as NodeId;
                element.parent_id = Some(parent_id);
                self.nodes[parent_id as usize].children_ids.push(node_id);
            }
            self.nodes.push(element);
        }
        first_id
    }

    /// Deep structural comparison of `a` (in this arena) and `b` (in `other`)
    ///
    /// Compares tag, attributes (order-insensitive), text, tail and the
    /// ordered children. Unknown IDs compare unequal.
    pub fn structurally_equal(&self, a: NodeId, other: &DomArena, b: NodeId) -> bool {
        let mut stack = vec![(a, b)];

        while let Some((left_id, right_id)) = stack.pop() {
            let (Ok(left), Ok(right)) = (self.get(left_id), other.get(right_id)) else {
                return false;
            };
            if !left.same_content(right) || left.children_ids.len() != right.children_ids.len()
            {
                return false;
            }
            stack.extend(
                left.children_ids
                    .iter()
                    .copied()
                    .zip(right.children_ids.iter().copied()),
            );
        }

        true
    }

    /// Clear arena (reuse allocation)
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root_id = None;
    }
}

impl Default for DomArena {
    fn default() -> Self {
        Self::new()
    }
}
