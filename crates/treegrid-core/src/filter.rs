//! Text filter as an alternate visibility predicate.
//!
//! While a filter is active, rows are visible when their title contains the
//! filter text (case-insensitive), regardless of collapse state. The window
//! position from just before filtering began is remembered and restored when
//! the filter is cleared.

use crate::flatten::FlatRow;

/// Case-insensitive substring match against row titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    text: String,
    needle: String,
}

impl Filter {
    /// `None` for empty text.
    #[must_use]
    pub fn new(text: &str) -> Option<Self> {
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_owned(),
            needle: text.to_lowercase(),
        })
    }

    /// Text as entered.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn matches(&self, row: &FlatRow) -> bool {
        row.payload().title().to_lowercase().contains(&self.needle)
    }
}

/// Which rows count as visible for windowing.
#[derive(Debug, Clone, Copy)]
pub enum Visibility<'a> {
    /// Collapse state (`FlatRow::show`).
    Expanded,
    /// Filter match; collapse state ignored.
    Matching(&'a Filter),
}

impl Visibility<'_> {
    #[must_use]
    pub fn admits(&self, row: &FlatRow) -> bool {
        match self {
            Self::Expanded => row.show(),
            Self::Matching(filter) => filter.matches(row),
        }
    }
}

/// What [`FilterState::set`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterChange {
    /// Filtering started; the previous window start was recorded.
    Activated,
    /// The text of an active filter changed.
    Updated,
    /// Filtering ended; restore the window to `restore`.
    Cleared { restore: usize },
    /// Empty text while no filter was active.
    Unchanged,
}

/// Active filter plus the window start saved when it was activated.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    active: Option<Filter>,
    saved_start: usize,
}

impl FilterState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply new filter text. `window_start` is the current window position,
    /// recorded only when a filter becomes active.
    pub fn set(&mut self, text: &str, window_start: usize) -> FilterChange {
        match (Filter::new(text), self.active.is_some()) {
            (None, false) => FilterChange::Unchanged,
            (None, true) => {
                self.active = None;
                FilterChange::Cleared {
                    restore: self.saved_start,
                }
            }
            (Some(filter), false) => {
                self.saved_start = window_start;
                self.active = Some(filter);
                FilterChange::Activated
            }
            (Some(filter), true) => {
                self.active = Some(filter);
                FilterChange::Updated
            }
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    #[must_use]
    pub fn filter(&self) -> Option<&Filter> {
        self.active.as_ref()
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility<'_> {
        match &self.active {
            Some(filter) => Visibility::Matching(filter),
            None => Visibility::Expanded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeId, NodeKind, Payload};
    use std::sync::Arc;

    fn row(title: &str, show: bool) -> FlatRow {
        FlatRow {
            id: NodeId(1),
            depth: 1,
            show,
            kind: NodeKind::Leaf,
            payload: Arc::new(Payload::new(title)),
            child_ids: Vec::new(),
        }
    }

    #[test]
    fn empty_text_is_no_filter() {
        assert!(Filter::new("").is_none());
    }

    #[test]
    fn match_is_case_insensitive_substring() {
        let filter = Filter::new("WORLD").unwrap();
        assert!(filter.matches(&row("Around the World in 80 Days", true)));
        assert!(!filter.matches(&row("Twenty Thousand Leagues", true)));
        assert_eq!(filter.text(), "WORLD");
    }

    #[test]
    fn matching_ignores_collapse_state() {
        let filter = Filter::new("leaf").unwrap();
        let hidden = row("hidden leaf", false);
        assert!(!Visibility::Expanded.admits(&hidden));
        assert!(Visibility::Matching(&filter).admits(&hidden));
    }

    #[test]
    fn saved_start_survives_updates_and_is_restored() {
        let mut state = FilterState::new();
        assert_eq!(state.set("", 4), FilterChange::Unchanged);
        assert_eq!(state.set("a", 7), FilterChange::Activated);
        assert_eq!(state.set("ab", 0), FilterChange::Updated);
        assert!(state.is_active());
        assert_eq!(state.set("", 0), FilterChange::Cleared { restore: 7 });
        assert!(!state.is_active());
        assert!(matches!(state.visibility(), Visibility::Expanded));
    }
}
