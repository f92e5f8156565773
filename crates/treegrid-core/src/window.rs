//! Window controller: which visible rows are exposed to the renderer.
//!
//! `visible_indexes` holds the flat-sequence positions that satisfy the active
//! [`Visibility`] predicate, in order. The window is up to `window_size`
//! consecutive entries of it starting at `window_start`. Windows near the end
//! are short; they are never padded or wrapped.
//!
//! Two addressing modes map user input to `window_start`:
//!
//! - **Scroll**: a pixel offset into the total content height, mapped
//!   proportionally onto the visible rows.
//! - **Paginate**: page `p` (1-based) starts at `window_size * (p - 1)`.
//!
//! # Invariants
//!
//! 1. `visible_indexes` is strictly increasing.
//! 2. `current_window.len() <= window_size`.
//! 3. `window_start < visible_count` whenever `visible_count > 0`.

use serde::{Deserialize, Serialize};

use crate::error::{InvalidState, TreeResult};
use crate::filter::Visibility;
use crate::flatten::FlatSequence;

/// How the window is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressMode {
    /// Continuous scrolling.
    #[default]
    Scroll,
    /// Discrete pages of `window_size` rows.
    Paginate,
}

/// Visible-index set and the current window over it.
#[derive(Debug, Clone)]
pub struct WindowState {
    visible_indexes: Vec<usize>,
    window_start: usize,
    window_size: usize,
    current_window: Vec<usize>,
    mode: AddressMode,
}

impl WindowState {
    /// Create an empty window of `window_size` rows (at least one).
    #[must_use]
    pub fn new(window_size: usize) -> Self {
        Self {
            visible_indexes: Vec::new(),
            window_start: 0,
            window_size: window_size.max(1),
            current_window: Vec::new(),
            mode: AddressMode::Scroll,
        }
    }

    #[must_use]
    pub fn visible_indexes(&self) -> &[usize] {
        &self.visible_indexes
    }

    #[must_use]
    pub fn visible_count(&self) -> usize {
        self.visible_indexes.len()
    }

    /// Position of the window within `visible_indexes`.
    #[must_use]
    pub fn window_start(&self) -> usize {
        self.window_start
    }

    #[must_use]
    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Flat-sequence positions currently exposed.
    #[must_use]
    pub fn current_window(&self) -> &[usize] {
        &self.current_window
    }

    #[must_use]
    pub fn mode(&self) -> AddressMode {
        self.mode
    }

    /// Rebuild `visible_indexes` with one scan of `rows`, then refresh the
    /// window at `start_hint` clamped to the last non-empty start.
    ///
    /// Returns the visible count.
    pub fn compute_visible(
        &mut self,
        rows: &FlatSequence,
        visibility: Visibility<'_>,
        start_hint: usize,
    ) -> usize {
        self.visible_indexes.clear();
        self.visible_indexes.extend(
            rows.iter()
                .enumerate()
                .filter(|(_, row)| visibility.admits(row))
                .map(|(index, _)| index),
        );
        let begin = self.clamp_start(start_hint);
        self.fill(begin);
        self.visible_indexes.len()
    }

    /// Move the window to start at `begin` within `visible_indexes`.
    ///
    /// Fails with [`InvalidState::WindowOutOfBounds`] if `begin` is past the
    /// last visible row (an empty visible set only accepts `0`).
    pub fn refresh_range(&mut self, begin: usize) -> TreeResult<()> {
        let visible = self.visible_count();
        if begin > 0 && begin >= visible {
            return Err(InvalidState::WindowOutOfBounds { begin, visible }.into());
        }
        self.fill(begin);
        Ok(())
    }

    fn fill(&mut self, begin: usize) {
        self.window_start = begin;
        self.current_window.clear();
        let end = begin.saturating_add(self.window_size).min(self.visible_indexes.len());
        if begin < end {
            self.current_window
                .extend_from_slice(&self.visible_indexes[begin..end]);
        }
        tracing::trace!(
            begin,
            len = self.current_window.len(),
            visible = self.visible_indexes.len(),
            "refresh range"
        );
    }

    fn clamp_start(&self, hint: usize) -> usize {
        let Some(last) = self.visible_count().checked_sub(1) else {
            return 0;
        };
        match self.mode {
            AddressMode::Scroll => hint.min(last),
            AddressMode::Paginate => hint.min(last / self.window_size * self.window_size),
        }
    }

    /// Change the page size, keeping the window start where possible.
    pub fn set_window_size(&mut self, window_size: usize) {
        self.window_size = window_size.max(1);
        let begin = self.clamp_start(self.window_start);
        self.fill(begin);
    }

    /// Total number of pages; an empty list still has one (empty) page.
    #[must_use]
    pub fn total_pages(&self) -> usize {
        self.visible_count().div_ceil(self.window_size).max(1)
    }

    /// 1-based page containing the window start.
    #[must_use]
    pub fn current_page(&self) -> usize {
        self.window_start / self.window_size + 1
    }

    /// Window start for page `page` (1-based).
    pub fn page_start(&self, page: usize) -> TreeResult<usize> {
        let total = self.total_pages();
        if page == 0 || page > total {
            return Err(InvalidState::PageOutOfRange { page, total }.into());
        }
        Ok(self.window_size * (page - 1))
    }

    /// Jump to page `page` (1-based).
    pub fn jump_to_page(&mut self, page: usize) -> TreeResult<()> {
        let begin = self.page_start(page)?;
        self.refresh_range(begin)
    }

    /// Advance one page. Returns `false` (and stays put) on the last page.
    pub fn page_up(&mut self) -> bool {
        let next = self.window_start + self.window_size;
        if next >= self.visible_count() {
            return false;
        }
        self.fill(next);
        true
    }

    /// Go back one page, never below the first row. Returns `false` when
    /// already at the start.
    pub fn page_down(&mut self) -> bool {
        if self.window_start == 0 {
            return false;
        }
        self.fill(self.window_start.saturating_sub(self.window_size));
        true
    }

    /// Switch addressing mode. Entering pagination snaps the window start
    /// down to the beginning of its page.
    pub fn set_mode(&mut self, mode: AddressMode) {
        self.mode = mode;
        if mode == AddressMode::Paginate {
            let snapped = self.window_start / self.window_size * self.window_size;
            self.fill(snapped);
        }
    }

    /// Map a pixel offset within `total_height` pixels of content onto a
    /// window start, rounded to the nearest row. Returns the new start.
    pub fn scroll_to(&mut self, offset: f64, total_height: f64) -> usize {
        let ratio = if total_height > 0.0 && offset.is_finite() {
            (offset / total_height).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let begin = (ratio * self.visible_count() as f64).round() as usize;
        let begin = self.clamp_start(begin);
        self.fill(begin);
        begin
    }

    /// Height of the scrollable content: every visible row when scrolling,
    /// one page when paginating.
    #[must_use]
    pub fn content_height(&self, row_height: u32) -> u64 {
        let rows = match self.mode {
            AddressMode::Scroll => self.visible_count(),
            AddressMode::Paginate => self.window_size,
        };
        rows as u64 * u64::from(row_height)
    }
}
