//! Sort toggle state for sortable columns.
//!
//! Only the indicator state is tracked. Rows are never reordered.

use serde::{Deserialize, Serialize};

/// Current sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Unsorted,
    Ascending,
    Descending,
}

/// Ascending and descending toggles; at most one is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortState {
    direction: SortDirection,
}

impl SortState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    /// Turn ascending on (turning descending off), or off if already on.
    pub fn toggle_ascending(&mut self) -> SortDirection {
        self.flip(SortDirection::Ascending)
    }

    /// Turn descending on (turning ascending off), or off if already on.
    pub fn toggle_descending(&mut self) -> SortDirection {
        self.flip(SortDirection::Descending)
    }

    fn flip(&mut self, to: SortDirection) -> SortDirection {
        self.direction = if self.direction == to {
            SortDirection::Unsorted
        } else {
            to
        };
        self.direction
    }
}
