//! Pre-order linearization of the tree into addressable rows.
//!
//! A row is visible (`show == true`) iff every strict ancestor that has
//! children is open. Visibility is threaded per branch: a closed folder hides
//! its own descendants and nothing else.
//!
//! # Example
//!
//! ```
//! use treegrid_core::flatten::{flatten, FlatSequence};
//! use treegrid_core::source::NodePayload;
//! use treegrid_core::tree::{IdPolicy, TreeModel};
//!
//! let mut tree = TreeModel::new();
//! let root = tree.root_id();
//! tree.insert_payloads(root, vec![
//!     NodePayload::folder("F", vec![NodePayload::leaf("L1"), NodePayload::leaf("L2")]),
//!     NodePayload::leaf("L3"),
//! ], IdPolicy::Reject).unwrap();
//!
//! let mut rows = FlatSequence::new();
//! flatten(&mut tree, &mut rows);
//! let shown: Vec<bool> = rows.iter().map(|r| r.show()).collect();
//! assert_eq!(shown, vec![true, false, false, true]);
//! ```

use std::sync::Arc;

use crate::error::{InvalidState, TreeResult};
use crate::node::{NodeId, NodeKind, Payload};
use crate::tree::TreeModel;

/// One entry of the flat sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRow {
    pub(crate) id: NodeId,
    pub(crate) depth: usize,
    pub(crate) show: bool,
    pub(crate) kind: NodeKind,
    pub(crate) payload: Arc<Payload>,
    pub(crate) child_ids: Vec<NodeId>,
}

impl FlatRow {
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Effective visibility under the ancestors' collapse state.
    #[must_use]
    pub fn show(&self) -> bool {
        self.show
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Denormalized copy of the node's child ids.
    #[must_use]
    pub fn child_ids(&self) -> &[NodeId] {
        &self.child_ids
    }
}

/// Rows in pre-order: parent before children, siblings in tree order.
#[derive(Debug, Clone, Default)]
pub struct FlatSequence {
    rows: Vec<FlatRow>,
}

impl FlatSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FlatRow> {
        self.rows.get(index)
    }

    /// Row at `index`, or [`InvalidState::RowOutOfBounds`].
    pub fn row(&self, index: usize) -> TreeResult<&FlatRow> {
        self.rows.get(index).ok_or_else(|| {
            InvalidState::RowOutOfBounds {
                index,
                len: self.rows.len(),
            }
            .into()
        })
    }

    pub(crate) fn row_mut(&mut self, index: usize) -> TreeResult<&mut FlatRow> {
        let len = self.rows.len();
        self.rows
            .get_mut(index)
            .ok_or_else(|| InvalidState::RowOutOfBounds { index, len }.into())
    }

    #[must_use]
    pub fn rows(&self) -> &[FlatRow] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [FlatRow] {
        &mut self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlatRow> {
        self.rows.iter()
    }

    /// Position of the row for `id`. Linear scan.
    #[must_use]
    pub fn position_of(&self, id: NodeId) -> Option<usize> {
        self.rows.iter().position(|row| row.id == id)
    }

    /// One past the last row of the subtree rooted at `index`.
    #[must_use]
    pub fn subtree_end(&self, index: usize) -> usize {
        let Some(row) = self.rows.get(index) else {
            return self.rows.len();
        };
        self.rows[index + 1..]
            .iter()
            .position(|r| r.depth <= row.depth)
            .map_or(self.rows.len(), |offset| index + 1 + offset)
    }

    fn clear(&mut self) {
        self.rows.clear();
    }
}

impl<'a> IntoIterator for &'a FlatSequence {
    type Item = &'a FlatRow;
    type IntoIter = std::slice::Iter<'a, FlatRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Rebuild `rows` from the whole tree and re-register every node.
///
/// Returns the number of rows emitted, which equals the node count.
pub fn flatten(tree: &mut TreeModel, rows: &mut FlatSequence) -> usize {
    rows.clear();
    let registered = tree.reindex();
    let root = tree.root_id();
    emit(tree, root_children(tree, root), 1, true, &mut rows.rows);
    debug_assert_eq!(rows.len() + 1, registered);
    tracing::debug!(rows = rows.len(), "full flatten");
    rows.len()
}

/// Splice the rows for `subtree` (already attached to the tree) directly
/// after `insert_after`, starting at depth `base_depth`.
///
/// Each subtree root is appended to the child-id list of the row at
/// `insert_after`. The new rows inherit that row's visibility. Returns the
/// number of rows inserted.
pub fn lazy_flatten(
    tree: &TreeModel,
    rows: &mut FlatSequence,
    insert_after: usize,
    subtree: &[NodeId],
    base_depth: usize,
) -> TreeResult<usize> {
    let parent = rows.row_mut(insert_after)?;
    let show = parent.show;
    for id in subtree {
        if !parent.child_ids.contains(id) {
            parent.child_ids.push(*id);
        }
    }

    let mut fresh = Vec::new();
    emit(tree, subtree.to_vec(), base_depth, show, &mut fresh);
    let inserted = fresh.len();
    let at = insert_after + 1;
    rows.rows.splice(at..at, fresh);
    tracing::debug!(at, inserted, "lazy flatten");
    Ok(inserted)
}

fn root_children(tree: &TreeModel, root: NodeId) -> Vec<NodeId> {
    tree.get(root)
        .map(|node| node.children().to_vec())
        .unwrap_or_default()
}

fn emit(
    tree: &TreeModel,
    level: Vec<NodeId>,
    depth: usize,
    show: bool,
    out: &mut Vec<FlatRow>,
) {
    // (id, depth, show for this node)
    let mut stack: Vec<(NodeId, usize, bool)> =
        level.into_iter().rev().map(|id| (id, depth, show)).collect();

    while let Some((id, depth, show)) = stack.pop() {
        let Ok(node) = tree.get(id) else {
            continue;
        };
        out.push(FlatRow {
            id,
            depth,
            show,
            kind: node.kind(),
            payload: Arc::clone(node.payload()),
            child_ids: node.children().to_vec(),
        });
        let child_show = show && !node.hides_descendants();
        stack.extend(
            node.children()
                .iter()
                .rev()
                .map(|&child| (child, depth + 1, child_show)),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::NodePayload;
    use crate::tree::IdPolicy;

    fn build(payloads: Vec<NodePayload>) -> TreeModel {
        let mut tree = TreeModel::new();
        let root = tree.root_id();
        tree.insert_payloads(root, payloads, IdPolicy::Reject).unwrap();
        tree
    }

    fn summary(rows: &FlatSequence) -> Vec<(String, usize, bool)> {
        rows.iter()
            .map(|r| (r.payload().title().to_owned(), r.depth(), r.show()))
            .collect()
    }

    fn s(title: &str, depth: usize, show: bool) -> (String, usize, bool) {
        (title.to_owned(), depth, show)
    }

    #[test]
    fn flatten_empty_tree() {
        let mut tree = TreeModel::new();
        let mut rows = FlatSequence::new();
        assert_eq!(flatten(&mut tree, &mut rows), 0);
        assert!(rows.is_empty());
    }

    #[test]
    fn closed_folder_hides_only_its_own_branch() {
        let mut tree = build(vec![
            NodePayload::folder(
                "A",
                vec![
                    NodePayload::folder("B", vec![NodePayload::leaf("b1")]),
                    NodePayload::leaf("a1"),
                ],
            )
            .with_open(true),
            NodePayload::leaf("C"),
        ]);
        let mut rows = FlatSequence::new();
        flatten(&mut tree, &mut rows);
        // "a1" is B's sibling and stays visible even though B is closed.
        assert_eq!(
            summary(&rows),
            vec![
                s("A", 1, true),
                s("B", 2, true),
                s("b1", 3, false),
                s("a1", 2, true),
                s("C", 1, true),
            ]
        );
    }

    #[test]
    fn nested_open_folder_under_closed_ancestor_is_hidden() {
        let mut tree = build(vec![NodePayload::folder(
            "A",
            vec![NodePayload::folder("B", vec![NodePayload::leaf("b1")]).with_open(true)],
        )]);
        let mut rows = FlatSequence::new();
        flatten(&mut tree, &mut rows);
        assert_eq!(
            summary(&rows),
            vec![s("A", 1, true), s("B", 2, false), s("b1", 3, false)]
        );
    }

    #[test]
    fn rows_carry_child_ids() {
        let mut tree = build(vec![NodePayload::folder(
            "A",
            vec![NodePayload::leaf("x").with_id(10), NodePayload::leaf("y").with_id(11)],
        )]);
        let mut rows = FlatSequence::new();
        flatten(&mut tree, &mut rows);
        assert_eq!(rows.get(0).unwrap().child_ids(), &[NodeId(10), NodeId(11)]);
        assert!(rows.get(1).unwrap().child_ids().is_empty());
    }

    #[test]
    fn subtree_end_and_position_of() {
        let mut tree = build(vec![
            NodePayload::folder("A", vec![NodePayload::leaf("a1"), NodePayload::leaf("a2")])
                .with_id(1),
            NodePayload::leaf("B").with_id(2),
        ]);
        let mut rows = FlatSequence::new();
        flatten(&mut tree, &mut rows);
        assert_eq!(rows.subtree_end(0), 3);
        assert_eq!(rows.subtree_end(1), 2);
        assert_eq!(rows.subtree_end(3), 4);
        assert_eq!(rows.position_of(NodeId(2)), Some(3));
        assert_eq!(rows.position_of(NodeId(99)), None);
    }

    #[test]
    fn lazy_flatten_splices_after_parent() {
        let mut tree = build(vec![
            NodePayload::folder("F", vec![]).with_id(1),
            NodePayload::leaf("G").with_id(2),
        ]);
        let mut rows = FlatSequence::new();
        flatten(&mut tree, &mut rows);

        let ids = tree
            .insert_payloads(
                NodeId(1),
                vec![
                    NodePayload::folder("sub", vec![NodePayload::leaf("deep")]),
                    NodePayload::leaf("leaf"),
                ],
                IdPolicy::Reject,
            )
            .unwrap();
        let inserted = lazy_flatten(&tree, &mut rows, 0, &ids, 2).unwrap();
        assert_eq!(inserted, 3);
        assert_eq!(
            summary(&rows),
            vec![
                s("F", 1, true),
                s("sub", 2, true),
                s("deep", 3, false),
                s("leaf", 2, true),
                s("G", 1, true),
            ]
        );
        assert_eq!(rows.get(0).unwrap().child_ids(), ids.as_slice());
    }

    #[test]
    fn lazy_flatten_rejects_bad_index() {
        let tree = TreeModel::new();
        let mut rows = FlatSequence::new();
        assert!(lazy_flatten(&tree, &mut rows, 0, &[], 1).is_err());
    }
}
