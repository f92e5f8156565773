//! Hierarchical node model backed by an id-addressed arena.
//!
//! # Example
//!
//! ```
//! use treegrid_core::source::NodePayload;
//! use treegrid_core::tree::TreeModel;
//!
//! let mut tree = TreeModel::new();
//! let root = tree.root_id();
//! let docs = tree.add(root, NodePayload::folder("docs", vec![])).unwrap();
//! let readme = tree.add(docs, NodePayload::leaf("README")).unwrap();
//!
//! assert_eq!(tree.get(readme).unwrap().depth(), 2);
//! assert!(tree.get(docs).unwrap().is_open());
//! ```
//!
//! # Invariants
//!
//! 1. The tree is acyclic; `move_node` rejects moves into the node's own subtree.
//! 2. Every non-root node's depth is its parent's depth + 1.
//! 3. A node appears in exactly one parent's child list.
//! 4. The registry holds exactly the ids of the nodes reachable from the root.

use std::collections::{HashMap, HashSet};

use crate::error::{InvalidState, TreeError, TreeResult};
use crate::node::{Node, NodeId, NodeKind, Payload};
use crate::registry::Registry;
use crate::source::NodePayload;

/// How supplied ids that already exist are handled when inserting payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdPolicy {
    /// Fail with [`InvalidState::DuplicateId`] before inserting anything.
    #[default]
    Reject,
    /// Give the colliding payload a freshly generated id.
    Reassign,
}

/// Mutable tree of nodes with a synthetic, never-rendered root.
#[derive(Debug, Clone)]
pub struct TreeModel {
    slots: Vec<Option<Node>>,
    free: Vec<usize>,
    registry: Registry,
    root: NodeId,
}

impl Default for TreeModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeModel {
    /// Create an empty tree containing only the synthetic root.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Registry::new();
        let root = registry.next_id();
        let mut node = Node::new(root, NodeKind::Folder, Payload::default());
        node.open = true;
        registry.register(root, 0);
        Self {
            slots: vec![Some(node)],
            free: Vec::new(),
            registry,
            root,
        }
    }

    #[must_use]
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, not counting the synthetic root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len().saturating_sub(1)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.registry.contains(id)
    }

    /// Look up a node by id.
    pub fn get(&self, id: NodeId) -> TreeResult<&Node> {
        let slot = self.registry.lookup(id)?;
        self.slots
            .get(slot)
            .and_then(Option::as_ref)
            .ok_or(TreeError::NotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> TreeResult<&mut Node> {
        let slot = self.registry.lookup(id)?;
        self.slots
            .get_mut(slot)
            .and_then(Option::as_mut)
            .ok_or(TreeError::NotFound(id))
    }

    /// Direct parent, `None` for the synthetic root.
    pub fn parent(&self, id: NodeId) -> TreeResult<Option<&Node>> {
        match self.get(id)?.parent {
            Some(parent) => self.get(parent).map(Some),
            None => Ok(None),
        }
    }

    /// Child of `parent` with the given id, if it is one.
    pub fn child(&self, parent: NodeId, id: NodeId) -> TreeResult<Option<&Node>> {
        let node = self.get(parent)?;
        if node.children.contains(&id) {
            self.get(id).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Next sibling, `None` at the end of the parent's child list.
    pub fn next(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        self.sibling(id, 1)
    }

    /// Previous sibling, `None` at the start of the parent's child list.
    pub fn prev(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        self.sibling(id, -1)
    }

    fn sibling(&self, id: NodeId, offset: isize) -> TreeResult<Option<NodeId>> {
        let Some(parent) = self.parent(id)? else {
            return Ok(None);
        };
        let Some(pos) = parent.children.iter().position(|&c| c == id) else {
            return Ok(None);
        };
        Ok(pos
            .checked_add_signed(offset)
            .and_then(|p| parent.children.get(p))
            .copied())
    }

    /// Whether `ancestor` is `node` itself or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> TreeResult<bool> {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return Ok(true);
            }
            current = self.get(id)?.parent;
        }
        Ok(false)
    }

    /// Pre-order iterator over the strict descendants of `id`.
    pub fn descendants(&self, id: NodeId) -> TreeResult<Descendants<'_>> {
        let node = self.get(id)?;
        Ok(Descendants {
            tree: self,
            stack: node.children.iter().rev().copied().collect(),
        })
    }

    /// Add a new node built from `payload` (and its nested children) under
    /// `parent`. The parent is marked open.
    pub fn add(&mut self, parent: NodeId, payload: NodePayload) -> TreeResult<NodeId> {
        let ids = self.insert_payloads(parent, vec![payload], IdPolicy::Reject)?;
        self.get_mut(parent)?.open = true;
        Ok(ids[0])
    }

    /// Build nodes from payloads and append them to `parent` in order.
    ///
    /// Each node's open state comes from its payload. With
    /// [`IdPolicy::Reject`], duplicate ids are detected before anything is
    /// inserted.
    pub fn insert_payloads(
        &mut self,
        parent: NodeId,
        payloads: Vec<NodePayload>,
        policy: IdPolicy,
    ) -> TreeResult<Vec<NodeId>> {
        self.get(parent)?;
        if policy == IdPolicy::Reject {
            let mut seen = HashSet::new();
            check_ids(&payloads, &self.registry, &mut seen)?;
        }
        // Generated ids must not collide with ids supplied later in the batch.
        reserve_ids(&payloads, &mut self.registry);
        let mut ids = Vec::with_capacity(payloads.len());
        for payload in payloads {
            ids.push(self.build(parent, payload)?);
        }
        Ok(ids)
    }

    fn build(&mut self, parent: NodeId, payload: NodePayload) -> TreeResult<NodeId> {
        let id = match payload.id {
            Some(id) if !self.registry.contains(id) => id,
            Some(id) => {
                let fresh = self.registry.next_id();
                tracing::warn!(supplied = %id, assigned = %fresh, "duplicate node id reassigned");
                fresh
            }
            None => self.registry.next_id(),
        };
        let kind = payload.resolved_kind();
        let open = payload.open;
        let (data, children) = payload.into_parts();

        let mut node = Node::new(id, kind, data);
        node.open = open;
        self.insert_slot(node);
        self.link(parent, id)?;
        for child in children {
            self.build(id, child)?;
        }
        Ok(id)
    }

    fn insert_slot(&mut self, node: Node) {
        let id = node.id;
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.registry.register(id, slot);
    }

    /// Append `child` to `parent`'s children and fix its parent link and depth.
    /// Does not touch the depths of `child`'s own descendants.
    fn link(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        let parent_node = self.get_mut(parent)?;
        parent_node.children.push(child);
        let depth = parent_node.depth + 1;
        let child_node = self.get_mut(child)?;
        child_node.parent = Some(parent);
        child_node.depth = depth;
        Ok(())
    }

    /// Remove the child `id` of `parent`, discarding its subtree.
    ///
    /// Returns `Ok(false)` if `id` is not a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, id: NodeId) -> TreeResult<bool> {
        let parent_node = self.get_mut(parent)?;
        let Some(pos) = parent_node.children.iter().position(|&c| c == id) else {
            return Ok(false);
        };
        parent_node.children.remove(pos);

        let mut discard = vec![id];
        while let Some(next) = discard.pop() {
            let Some(slot) = self.registry.unregister(next) else {
                continue;
            };
            if let Some(node) = self.slots[slot].take() {
                discard.extend(node.children);
            }
            self.free.push(slot);
        }
        Ok(true)
    }

    /// Remove `id` from its own parent. Returns `Ok(false)` for the root.
    pub fn remove_self(&mut self, id: NodeId) -> TreeResult<bool> {
        match self.get(id)?.parent {
            Some(parent) => self.remove_child(parent, id),
            None => Ok(false),
        }
    }

    /// Re-parent `id` under `new_parent`, appending it to the new parent's
    /// children and marking the new parent open.
    ///
    /// Fails with [`TreeError::Cycle`] if `new_parent` is `id` or one of its
    /// descendants; the tree is left untouched on any error.
    pub fn move_node(&mut self, id: NodeId, new_parent: NodeId) -> TreeResult<()> {
        let old_parent = self.get(id)?.parent;
        self.get(new_parent)?;
        let Some(old_parent) = old_parent else {
            // Only the synthetic root has no parent; it can never be re-parented.
            return Err(TreeError::Cycle {
                node: id,
                target: new_parent,
            });
        };
        if self.is_ancestor_or_self(id, new_parent)? {
            return Err(TreeError::Cycle {
                node: id,
                target: new_parent,
            });
        }

        self.get_mut(old_parent)?.children.retain(|&c| c != id);
        self.link(new_parent, id)?;
        self.get_mut(new_parent)?.open = true;
        self.redepth(id)
    }

    /// Recompute depths of every strict descendant of `id`.
    fn redepth(&mut self, id: NodeId) -> TreeResult<()> {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = self.get(current)?;
            let depth = node.depth + 1;
            let children = node.children.clone();
            for child in children {
                self.get_mut(child)?.depth = depth;
                stack.push(child);
            }
        }
        Ok(())
    }

    /// Set a folder's expand state.
    pub fn set_open(&mut self, id: NodeId, open: bool) -> TreeResult<()> {
        self.get_mut(id)?.open = open;
        Ok(())
    }

    /// Drop and re-register every node reachable from the root.
    ///
    /// Returns the number of registered nodes, root included.
    pub(crate) fn reindex(&mut self) -> usize {
        let slot_of: HashMap<NodeId, usize> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, node)| node.as_ref().map(|n| (n.id, slot)))
            .collect();
        self.registry.clear();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(&slot) = slot_of.get(&id) else {
                continue;
            };
            let Some(node) = self.slots[slot].as_ref() else {
                continue;
            };
            self.registry.register(id, slot);
            stack.extend(node.children.iter().copied());
        }
        self.registry.len()
    }
}

fn check_ids(
    payloads: &[NodePayload],
    registry: &Registry,
    seen: &mut HashSet<NodeId>,
) -> TreeResult<()> {
    for payload in payloads {
        if let Some(id) = payload.id
            && (registry.contains(id) || !seen.insert(id))
        {
            return Err(InvalidState::DuplicateId(id).into());
        }
        check_ids(&payload.children, registry, seen)?;
    }
    Ok(())
}

fn reserve_ids(payloads: &[NodePayload], registry: &mut Registry) {
    for payload in payloads {
        if let Some(id) = payload.id {
            registry.reserve(id);
        }
        reserve_ids(&payload.children, registry);
    }
}

/// Pre-order walk over a subtree. See [`TreeModel::descendants`].
pub struct Descendants<'a> {
    tree: &'a TreeModel,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.get(id).ok()?;
        self.stack.extend(node.children.iter().rev().copied());
        Some(node)
    }
}
