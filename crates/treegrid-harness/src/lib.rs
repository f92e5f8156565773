#![forbid(unsafe_code)]

//! Reference host for `treegrid-core`.
//!
//! Plays the renderer and fetcher roles around a [`TreeGrid`]:
//!
//! - [`cli`] - option parsing with `TREEGRID_*` environment overrides
//! - [`json_source`] - [`JsonFileSource`], a data source backed by a JSON file
//! - [`render`] - plain-text rendering of the current window
//! - [`script`] - line-oriented command driver
//! - [`logging`] - `tracing-subscriber` setup
//!
//! [`TreeGrid`]: treegrid_core::TreeGrid

use std::fmt;
use std::io;

use treegrid_core::TreeError;

pub mod cli;
pub mod json_source;
pub mod logging;
pub mod render;
pub mod script;

pub use json_source::JsonFileSource;
pub use render::render_window;
pub use script::{Command, ScriptSummary, run_script};

/// Errors surfaced by the harness.
#[derive(Debug)]
pub enum HarnessError {
    /// Reading input or writing output failed.
    Io(io::Error),
    /// The engine rejected an operation.
    Tree(TreeError),
    /// A script line could not be parsed.
    Parse { line: usize, message: String },
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Tree(e) => write!(f, "{e}"),
            Self::Parse { line, message } => write!(f, "line {line}: {message}"),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Tree(e) => Some(e),
            Self::Parse { .. } => None,
        }
    }
}

impl From<io::Error> for HarnessError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<TreeError> for HarnessError {
    fn from(e: TreeError) -> Self {
        Self::Tree(e)
    }
}
