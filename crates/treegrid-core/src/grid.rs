//! Grid controller: the single owner of tree, rows, window and filter.
//!
//! Every mutation goes through `&mut TreeGrid`, so operations never
//! interleave. Expanding a folder whose children are not loaded is split in
//! two steps: [`TreeGrid::toggle_folder`] hands out a [`FetchTicket`], the host
//! fetches (synchronously or not) and answers with
//! [`TreeGrid::complete_fetch`]. Structural changes (load, add, delete, move)
//! bump a generation counter; a ticket issued before such a change is stale
//! and its result is discarded.
//!
//! # Example
//!
//! ```
//! use treegrid_core::grid::{ToggleOutcome, TreeGrid};
//! use treegrid_core::options::GridOptions;
//! use treegrid_core::source::{NodePayload, SourceData};
//!
//! let mut grid = TreeGrid::new(GridOptions::default().with_window_size(2), Default::default())
//!     .unwrap();
//! grid.load(SourceData::Roots(vec![
//!     NodePayload::folder("F", vec![NodePayload::leaf("L1"), NodePayload::leaf("L2")]),
//!     NodePayload::leaf("L3"),
//! ]))
//! .unwrap();
//! assert_eq!(grid.window().visible_count(), 2);
//!
//! assert_eq!(grid.toggle_folder(0).unwrap(), ToggleOutcome::Opened);
//! assert_eq!(grid.window().visible_count(), 4);
//! assert_eq!(grid.window().current_window(), &[0, 1]);
//! ```

use std::collections::HashMap;

use crate::error::{InvalidState, SourceError, TreeError, TreeResult};
use crate::filter::{FilterChange, FilterState};
use crate::flatten::{self, FlatSequence};
use crate::hooks::GridHooks;
use crate::node::{Node, NodeId, NodeKind, Payload};
use crate::options::GridOptions;
use crate::sort::{SortDirection, SortState};
use crate::source::{DataSource, FetchScope, NodePayload, SourceData};
use crate::toggle;
use crate::tree::{IdPolicy, TreeModel};
use crate::window::{AddressMode, WindowState};

/// Permission to deliver the children of one folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    node: NodeId,
    generation: u64,
}

impl FetchTicket {
    /// Folder whose children are requested.
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Structural generation the ticket was issued at.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn scope(&self) -> FetchScope {
        FetchScope::Subtree(self.node)
    }
}

/// What [`TreeGrid::toggle_folder`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Opened,
    Closed,
    /// The folder has no loaded children; fetch them and call
    /// [`TreeGrid::complete_fetch`].
    FetchRequired(FetchTicket),
    /// A fetch for this folder is already outstanding. Nothing changed.
    FetchPending,
}

/// Leading glyph of a rendered row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowGlyph {
    Leaf,
    FolderOpen,
    FolderClosed,
}

/// Renderer-ready view of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowView<'a> {
    /// Position in the flat sequence.
    pub position: usize,
    pub id: NodeId,
    pub depth: usize,
    /// Indentation level; zero while a filter is active.
    pub indent: usize,
    pub glyph: RowGlyph,
    pub payload: &'a Payload,
    /// Whether this row is the detail item.
    pub selected: bool,
}

/// Window start and leading spacer after a scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollPosition {
    pub begin: usize,
    /// Pixels of blank space the renderer places above the window. Always
    /// zero when paginating.
    pub margin: u64,
}

/// Virtualized tree grid.
#[derive(Debug)]
pub struct TreeGrid {
    tree: TreeModel,
    rows: FlatSequence,
    window: WindowState,
    filter: FilterState,
    sorts: Vec<SortState>,
    options: GridOptions,
    hooks: GridHooks,
    detail: Option<NodeId>,
    generation: u64,
    /// Folder -> generation its outstanding ticket was issued at.
    pending: HashMap<NodeId, u64>,
}

impl TreeGrid {
    /// Create an empty grid. Fails if `options` do not validate.
    pub fn new(options: GridOptions, hooks: GridHooks) -> TreeResult<Self> {
        options.validate()?;
        let mut window = WindowState::new(options.window_size);
        if options.paginate {
            window.set_mode(AddressMode::Paginate);
        }
        Ok(Self {
            tree: TreeModel::new(),
            rows: FlatSequence::new(),
            window,
            filter: FilterState::new(),
            sorts: vec![SortState::new(); options.columns.len()],
            options,
            hooks,
            detail: None,
            generation: 0,
            pending: HashMap::new(),
        })
    }

    #[must_use]
    pub fn tree(&self) -> &TreeModel {
        &self.tree
    }

    #[must_use]
    pub fn rows(&self) -> &FlatSequence {
        &self.rows
    }

    #[must_use]
    pub fn window(&self) -> &WindowState {
        &self.window
    }

    #[must_use]
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    #[must_use]
    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    /// Current structural generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a fetch ticket for `id` is outstanding at the current
    /// generation. A ticket issued before a structural change no longer
    /// counts, so the folder can ask for a fresh one.
    #[must_use]
    pub fn is_pending(&self, id: NodeId) -> bool {
        self.pending.get(&id) == Some(&self.generation)
    }

    // --- Loading -----------------------------------------------------------

    /// Replace the whole tree with `data`.
    ///
    /// Duplicate ids are rejected and leave the current tree in place. With
    /// `lazy_load`, children of root-level folders are dropped so they are
    /// fetched on first expand. Returns the number of rows.
    pub fn load(&mut self, data: SourceData) -> TreeResult<usize> {
        let mut items = data.into_items();
        if self.options.lazy_load {
            items = items.into_iter().map(unload_children).collect();
        }
        let mut tree = TreeModel::new();
        let root = tree.root_id();
        tree.insert_payloads(root, items, IdPolicy::Reject)?;

        self.tree = tree;
        self.pending.clear();
        self.detail = None;
        self.generation += 1;
        flatten::flatten(&mut self.tree, &mut self.rows);
        self.recompute(0);
        tracing::debug!(
            rows = self.rows.len(),
            visible = self.window.visible_count(),
            generation = self.generation,
            "tree loaded"
        );
        Ok(self.rows.len())
    }

    /// Fetch the root scope from `source` and load it.
    pub fn load_from(&mut self, source: &mut dyn DataSource) -> TreeResult<usize> {
        let data = source.fetch(FetchScope::Root)?;
        self.load(data)
    }

    // --- Structure ---------------------------------------------------------

    /// Add `payload` (with nested children) under `parent`, which is opened.
    pub fn add_node(&mut self, parent: NodeId, payload: NodePayload) -> TreeResult<NodeId> {
        let id = self.tree.add(parent, payload)?;
        self.structure_changed();
        Ok(id)
    }

    /// Remove `id` and its subtree, then call `on_delete` with the former
    /// parent. Returns `Ok(false)` for the synthetic root.
    pub fn delete_node(&mut self, id: NodeId) -> TreeResult<bool> {
        let Some(parent) = self.tree.get(id)?.parent_id() else {
            return Ok(false);
        };
        self.tree.remove_child(parent, id)?;
        let tree = &self.tree;
        self.pending.retain(|pending, _| tree.contains(*pending));
        if self.detail.is_some_and(|detail| !tree.contains(detail)) {
            self.detail = None;
        }
        self.structure_changed();
        self.hooks.deleted(self.tree.get(parent)?);
        Ok(true)
    }

    /// Re-parent `id` under `new_parent`.
    pub fn move_node(&mut self, id: NodeId, new_parent: NodeId) -> TreeResult<()> {
        self.tree.move_node(id, new_parent)?;
        self.structure_changed();
        Ok(())
    }

    fn structure_changed(&mut self) {
        self.generation += 1;
        flatten::flatten(&mut self.tree, &mut self.rows);
        self.recompute(self.window.window_start());
    }

    fn recompute(&mut self, start_hint: usize) {
        self.window
            .compute_visible(&self.rows, self.filter.visibility(), start_hint);
    }

    // --- Expand / collapse -------------------------------------------------

    /// Expand or collapse the folder at row `row`.
    pub fn toggle_folder(&mut self, row: usize) -> TreeResult<ToggleOutcome> {
        let target = self.rows.row(row)?;
        let id = target.id();
        if !target.kind().is_folder() {
            return Err(InvalidState::NotAFolder(id).into());
        }
        if self.is_pending(id) {
            return Ok(ToggleOutcome::FetchPending);
        }
        let node = self.tree.get(id)?;
        if node.is_unloaded_folder() && !node.is_open() {
            // Replaces any ticket from an older generation.
            self.pending.insert(id, self.generation);
            let ticket = FetchTicket {
                node: id,
                generation: self.generation,
            };
            tracing::trace!(node = %id, generation = self.generation, "fetch required");
            return Ok(ToggleOutcome::FetchRequired(ticket));
        }

        let toggled = toggle::toggle_folder(&mut self.tree, &mut self.rows, row)?;
        self.recompute(self.window.window_start());
        Ok(if toggled.open {
            ToggleOutcome::Opened
        } else {
            ToggleOutcome::Closed
        })
    }

    /// Deliver the result of the fetch for `ticket`.
    ///
    /// On success the children are attached, spliced in after the folder's
    /// row and the folder is opened; returns the number of rows inserted.
    /// A stale ticket fails with [`InvalidState::StaleFetch`]; a failed fetch
    /// surfaces its [`SourceError`]. Either way the folder stays closed. A
    /// stale ticket never clears the pending mark of a newer ticket for the
    /// same folder.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<SourceData, SourceError>,
    ) -> TreeResult<usize> {
        let node = ticket.node;
        let issued = self.pending.get(&node).copied();
        if issued == Some(ticket.generation) {
            self.pending.remove(&node);
        }
        if issued != Some(ticket.generation)
            || ticket.generation != self.generation
            || !self.tree.contains(node)
        {
            tracing::warn!(
                node = %node,
                issued = ticket.generation,
                current = self.generation,
                "discarding stale fetch"
            );
            return Err(InvalidState::StaleFetch {
                node,
                issued: ticket.generation,
                current: self.generation,
            }
            .into());
        }

        let data = match result {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!(node = %node, error = %err, "fetch failed");
                self.tree.set_open(node, false)?;
                return Err(err.into());
            }
        };

        let index = self.rows.position_of(node).ok_or(TreeError::NotFound(node))?;
        let depth = self.rows.row(index)?.depth() + 1;
        let ids = self
            .tree
            .insert_payloads(node, data.into_items(), IdPolicy::Reassign)?;
        let inserted = flatten::lazy_flatten(&self.tree, &mut self.rows, index, &ids, depth)?;
        self.tree.set_open(node, true)?;
        self.recompute(self.window.window_start());
        tracing::debug!(node = %node, inserted, "fetch completed");
        Ok(inserted)
    }

    /// Toggle the folder at `row`, fetching its children from `source` if
    /// they are not loaded.
    pub fn expand_from(
        &mut self,
        row: usize,
        source: &mut dyn DataSource,
    ) -> TreeResult<ToggleOutcome> {
        match self.toggle_folder(row)? {
            ToggleOutcome::FetchRequired(ticket) => {
                let result = source.fetch(ticket.scope());
                self.complete_fetch(ticket, result)?;
                Ok(ToggleOutcome::Opened)
            }
            outcome => Ok(outcome),
        }
    }

    // --- Filter and window -------------------------------------------------

    /// Set the filter text; empty text clears the filter and restores the
    /// window position from before filtering began. While filtering, the
    /// window keeps its start, clamped to the matching rows.
    pub fn set_filter(&mut self, text: &str) -> FilterChange {
        let change = self.filter.set(text, self.window.window_start());
        let hint = match change {
            FilterChange::Cleared { restore } => restore,
            _ => self.window.window_start(),
        };
        self.recompute(hint);
        tracing::trace!(?change, visible = self.window.visible_count(), "filter set");
        change
    }

    pub fn refresh_range(&mut self, begin: usize) -> TreeResult<()> {
        self.window.refresh_range(begin)
    }

    pub fn jump_to_page(&mut self, page: usize) -> TreeResult<()> {
        self.window.jump_to_page(page)
    }

    /// Advance one page. Returns `false` on the last page.
    pub fn page_up(&mut self) -> bool {
        self.window.page_up()
    }

    /// Go back one page. Returns `false` on the first page.
    pub fn page_down(&mut self) -> bool {
        self.window.page_down()
    }

    /// Change the number of rows per window, keeping the start where the
    /// new size allows. Zero fails and leaves the grid unchanged.
    pub fn set_window_size(&mut self, window_size: usize) -> TreeResult<()> {
        let options = self.options.clone().with_window_size(window_size);
        options.validate()?;
        self.options = options;
        self.window.set_window_size(window_size);
        Ok(())
    }

    /// Switch between pagination and scrolling.
    pub fn set_paginate(&mut self, paginate: bool) {
        self.options.paginate = paginate;
        self.window.set_mode(if paginate {
            AddressMode::Paginate
        } else {
            AddressMode::Scroll
        });
    }

    /// Scroll to pixel `offset` of `total_height` pixels of content.
    pub fn scroll_to(&mut self, offset: f64, total_height: f64) -> ScrollPosition {
        let begin = self.window.scroll_to(offset, total_height);
        let margin = if self.options.paginate || total_height <= 0.0 || !offset.is_finite() {
            0
        } else {
            let ratio = (offset / total_height).clamp(0.0, 1.0);
            (self.content_height() as f64 * ratio).round() as u64
        };
        ScrollPosition { begin, margin }
    }

    /// Pixel height of the scrollable content.
    #[must_use]
    pub fn content_height(&self) -> u64 {
        self.window.content_height(self.options.row_height)
    }

    // --- Selection and rendering -------------------------------------------

    /// Make the row at `row` the detail item and call `on_click`.
    pub fn select(&mut self, row: usize) -> TreeResult<NodeId> {
        let id = self.rows.row(row)?.id();
        self.detail = Some(id);
        self.hooks.clicked(self.tree.get(id)?);
        Ok(id)
    }

    /// The selected node, if any.
    #[must_use]
    pub fn detail_item(&self) -> Option<&Node> {
        self.detail.and_then(|id| self.tree.get(id).ok())
    }

    /// Flat-sequence position of `id`.
    #[must_use]
    pub fn position_of(&self, id: NodeId) -> Option<usize> {
        self.rows.position_of(id)
    }

    pub fn row_view(&self, position: usize) -> TreeResult<RowView<'_>> {
        let row = self.rows.row(position)?;
        let glyph = match row.kind() {
            NodeKind::Leaf => RowGlyph::Leaf,
            NodeKind::Folder if self.tree.get(row.id())?.is_open() => RowGlyph::FolderOpen,
            NodeKind::Folder => RowGlyph::FolderClosed,
        };
        let indent = if self.filter.is_active() {
            0
        } else {
            row.depth().saturating_sub(1)
        };
        Ok(RowView {
            position,
            id: row.id(),
            depth: row.depth(),
            indent,
            glyph,
            payload: row.payload(),
            selected: self.detail == Some(row.id()),
        })
    }

    /// Views of the rows in the current window, in order.
    pub fn window_rows(&self) -> TreeResult<Vec<RowView<'_>>> {
        self.window
            .current_window()
            .iter()
            .map(|&position| self.row_view(position))
            .collect()
    }

    // --- Sorting -----------------------------------------------------------

    /// Toggle the ascending or descending indicator of a sortable column.
    pub fn toggle_sort(&mut self, column: usize, ascending: bool) -> TreeResult<SortDirection> {
        let sortable = self.options.columns.get(column).is_some_and(|c| c.sortable);
        let Some(state) = self.sorts.get_mut(column).filter(|_| sortable) else {
            return Err(InvalidState::InvalidOptions(format!("column {column} is not sortable")).into());
        };
        Ok(if ascending {
            state.toggle_ascending()
        } else {
            state.toggle_descending()
        })
    }

    #[must_use]
    pub fn sort_direction(&self, column: usize) -> Option<SortDirection> {
        self.sorts.get(column).map(SortState::direction)
    }
}

/// Drop a folder's nested children, keeping it a (closed) folder.
fn unload_children(mut payload: NodePayload) -> NodePayload {
    if !payload.children.is_empty() {
        payload.kind = Some(payload.resolved_kind());
        payload.children.clear();
        payload.open = false;
    }
    payload
}
