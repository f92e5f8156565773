//! Global id index over the node arena.
//!
//! The registry maps every [`NodeId`] in the tree to the arena slot that owns
//! the node, and hands out fresh ids from a monotonic counter. A full flatten
//! rebuilds it from scratch (see [`crate::flatten::flatten`]); structural
//! mutations keep it in step in between.

use std::collections::HashMap;

use crate::error::{TreeError, TreeResult};
use crate::node::NodeId;

/// Id → arena slot index plus the id allocator.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    slots: HashMap<NodeId, usize>,
    next_id: u64,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh id. Ids are never reused, even after removal.
    pub fn next_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Advance the counter past an explicitly supplied id so generated ids
    /// never collide with it.
    pub fn reserve(&mut self, id: NodeId) {
        if id.0 >= self.next_id {
            self.next_id = id.0.saturating_add(1);
        }
    }

    /// Insert or overwrite the slot for `id`, returning the previous slot.
    pub fn register(&mut self, id: NodeId, slot: usize) -> Option<usize> {
        self.reserve(id);
        self.slots.insert(id, slot)
    }

    /// Resolve `id` to its arena slot.
    pub fn lookup(&self, id: NodeId) -> TreeResult<usize> {
        self.slots.get(&id).copied().ok_or(TreeError::NotFound(id))
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn unregister(&mut self, id: NodeId) -> Option<usize> {
        self.slots.remove(&id)
    }

    /// Drop every entry. The id counter is kept.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
