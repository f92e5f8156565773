//! Grid configuration.
//!
//! Options deserialize from JSON. Field names accept both snake_case and the
//! camelCase spellings used by browser hosts (`rowHeight`, `showTotal`,
//! `lazyLoad`). Missing fields take their defaults.

use serde::{Deserialize, Serialize};

use crate::error::{InvalidState, TreeResult};

/// Default pixel height of one row.
pub const DEFAULT_ROW_HEIGHT: u32 = 35;
/// Default number of rows per window.
pub const DEFAULT_WINDOW_SIZE: usize = 15;

/// A display column. Only `sortable` affects engine state (see
/// [`SortState`](crate::sort::SortState)).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub title: String,
    /// Width as a percentage of the grid.
    pub width: u8,
    #[serde(default)]
    pub sortable: bool,
}

impl Column {
    #[must_use]
    pub fn new(title: impl Into<String>, width: u8) -> Self {
        Self {
            title: title.into(),
            width,
            sortable: false,
        }
    }

    #[must_use]
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }
}

fn default_row_height() -> u32 {
    DEFAULT_ROW_HEIGHT
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_columns() -> Vec<Column> {
    vec![
        Column::new("Title", 60).sortable(),
        Column::new("Author", 30),
        Column::new("Actions", 10),
    ]
}

/// Recognized grid options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridOptions {
    #[serde(default = "default_row_height", alias = "rowHeight")]
    pub row_height: u32,
    #[serde(
        default = "default_window_size",
        alias = "windowSize",
        alias = "showTotal"
    )]
    pub window_size: usize,
    #[serde(default)]
    pub paginate: bool,
    /// Drop nested children of folders at load so they are fetched on first
    /// expand.
    #[serde(default, alias = "lazyLoad")]
    pub lazy_load: bool,
    #[serde(default = "default_columns")]
    pub columns: Vec<Column>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            window_size: DEFAULT_WINDOW_SIZE,
            paginate: false,
            lazy_load: false,
            columns: default_columns(),
        }
    }
}

impl GridOptions {
    /// Parse and validate options from JSON.
    pub fn from_json_str(json: &str) -> TreeResult<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| InvalidState::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    #[must_use]
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    #[must_use]
    pub fn with_row_height(mut self, row_height: u32) -> Self {
        self.row_height = row_height;
        self
    }

    #[must_use]
    pub fn with_paginate(mut self, paginate: bool) -> Self {
        self.paginate = paginate;
        self
    }

    #[must_use]
    pub fn with_lazy_load(mut self, lazy_load: bool) -> Self {
        self.lazy_load = lazy_load;
        self
    }

    /// Reject values the window controller cannot work with.
    pub fn validate(&self) -> TreeResult<()> {
        if self.row_height == 0 {
            return Err(InvalidState::InvalidOptions("row height must be positive".into()).into());
        }
        if self.window_size == 0 {
            return Err(InvalidState::InvalidOptions("window size must be positive".into()).into());
        }
        if let Some(col) = self.columns.iter().find(|c| c.width > 100) {
            return Err(InvalidState::InvalidOptions(format!(
                "column {:?} wider than 100%",
                col.title
            ))
            .into());
        }
        Ok(())
    }
}
