//! Error types for the tree engine.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `TreeError::NotFound` | Lookup of an id that is not in the tree | Returns error, nothing mutated |
//! | `TreeError::Cycle` | Move into the node itself or a descendant | Returns error, tree unchanged |
//! | `TreeError::InvalidState` | Out-of-range row/window/page, stale fetch | Returns error, state unchanged |
//! | `TreeError::Source` | Data source fetch or decode failure | Folder reverted to closed |

use std::fmt;
use std::io;

use crate::node::NodeId;

/// Reasons an operation was rejected because of the current engine state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidState {
    /// A row index outside the flat sequence.
    RowOutOfBounds { index: usize, len: usize },
    /// A window start past the end of the visible indexes.
    WindowOutOfBounds { begin: usize, visible: usize },
    /// A page number outside `1..=total`.
    PageOutOfRange { page: usize, total: usize },
    /// The row addressed by a folder operation is a leaf.
    NotAFolder(NodeId),
    /// A supplied id is already present in the tree or the batch.
    DuplicateId(NodeId),
    /// A fetch completion whose ticket no longer matches the tree.
    StaleFetch {
        node: NodeId,
        issued: u64,
        current: u64,
    },
    /// Options failed validation.
    InvalidOptions(String),
}

impl fmt::Display for InvalidState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RowOutOfBounds { index, len } => {
                write!(f, "row {index} out of bounds (rows={len})")
            }
            Self::WindowOutOfBounds { begin, visible } => {
                write!(f, "window start {begin} past end of visible rows ({visible})")
            }
            Self::PageOutOfRange { page, total } => {
                write!(f, "page {page} out of range (pages={total})")
            }
            Self::NotAFolder(id) => write!(f, "node {id} is not a folder"),
            Self::DuplicateId(id) => write!(f, "duplicate node id {id}"),
            Self::StaleFetch {
                node,
                issued,
                current,
            } => write!(
                f,
                "stale fetch for node {node} (issued at generation {issued}, now {current})"
            ),
            Self::InvalidOptions(msg) => write!(f, "invalid options: {msg}"),
        }
    }
}

/// Errors raised by a data source.
#[derive(Debug)]
pub enum SourceError {
    /// I/O error while reading payloads.
    Io(io::Error),
    /// Payload could not be decoded.
    Parse(serde_json::Error),
    /// The source has nothing to serve for the requested scope.
    Unavailable(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io(e) => write!(f, "I/O error: {e}"),
            SourceError::Parse(e) => write!(f, "payload decode error: {e}"),
            SourceError::Unavailable(msg) => write!(f, "source unavailable: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Io(e) => Some(e),
            SourceError::Parse(e) => Some(e),
            SourceError::Unavailable(_) => None,
        }
    }
}

impl From<io::Error> for SourceError {
    fn from(e: io::Error) -> Self {
        SourceError::Io(e)
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Parse(e)
    }
}

/// Top-level error for tree, flattening and window operations.
#[derive(Debug)]
pub enum TreeError {
    /// No node with this id is registered.
    NotFound(NodeId),
    /// Moving `node` under `target` would make it its own ancestor.
    Cycle { node: NodeId, target: NodeId },
    /// The operation does not apply to the current state.
    InvalidState(InvalidState),
    /// The data source failed.
    Source(SourceError),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "node {id} not found"),
            Self::Cycle { node, target } => {
                write!(f, "moving node {node} under {target} would create a cycle")
            }
            Self::InvalidState(state) => write!(f, "invalid state: {state}"),
            Self::Source(e) => write!(f, "data source error: {e}"),
        }
    }
}

impl std::error::Error for TreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(e) => Some(e),
            _ => None,
        }
    }
}

impl From<InvalidState> for TreeError {
    fn from(state: InvalidState) -> Self {
        Self::InvalidState(state)
    }
}

impl From<SourceError> for TreeError {
    fn from(e: SourceError) -> Self {
        Self::Source(e)
    }
}

/// Result type for engine operations.
pub type TreeResult<T> = Result<T, TreeError>;
