//! Data source contract for node payloads.
//!
//! A source returns either an array of root payloads or a single payload with
//! a `children` array. The lazy-load path issues the same contract scoped to
//! one folder ([`FetchScope::Subtree`]).
//!
//! ```
//! use treegrid_core::source::SourceData;
//!
//! let data = SourceData::from_json_str(r#"[
//!     {"title": "Docs", "kind": "folder", "children": [{"title": "README"}]},
//!     {"title": "LICENSE"}
//! ]"#).unwrap();
//! assert_eq!(data.items().len(), 2);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SourceError;
use crate::node::{NodeId, NodeKind, Payload};

/// One node as delivered by a data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePayload {
    /// Explicit id; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    /// Explicit kind; inferred from `children` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NodeKind>,
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodePayload>,
    /// Everything else (author, dates, ...), kept in the node payload.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NodePayload {
    #[must_use]
    pub fn leaf(title: impl Into<String>) -> Self {
        Self {
            kind: Some(NodeKind::Leaf),
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn folder(title: impl Into<String>, children: Vec<NodePayload>) -> Self {
        Self {
            kind: Some(NodeKind::Folder),
            title: title.into(),
            children,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(NodeId(id));
        self
    }

    #[must_use]
    pub fn with_open(mut self, open: bool) -> Self {
        self.open = open;
        self
    }

    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Kind after inference: a payload with children is a folder.
    #[must_use]
    pub fn resolved_kind(&self) -> NodeKind {
        match self.kind {
            Some(kind) => kind,
            None if !self.children.is_empty() => NodeKind::Folder,
            None => NodeKind::Leaf,
        }
    }

    /// Split into the node payload and the child payloads.
    pub(crate) fn into_parts(self) -> (Payload, Vec<NodePayload>) {
        (Payload::from_parts(self.title, self.extra), self.children)
    }

    /// Number of payloads in this subtree, including `self`.
    #[must_use]
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Self::subtree_len).sum::<usize>()
    }
}

/// What a data source returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceData {
    /// An array of root-level payloads.
    Roots(Vec<NodePayload>),
    /// A single wrapper payload whose children are the items.
    Node(NodePayload),
}

impl SourceData {
    /// Decode from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, SourceError> {
        Ok(serde_json::from_str(text)?)
    }

    /// The payloads to attach: the array itself, or the wrapper's children.
    #[must_use]
    pub fn items(&self) -> &[NodePayload] {
        match self {
            Self::Roots(items) => items,
            Self::Node(node) => &node.children,
        }
    }

    #[must_use]
    pub fn into_items(self) -> Vec<NodePayload> {
        match self {
            Self::Roots(items) => items,
            Self::Node(node) => node.children,
        }
    }
}

/// Which part of the tree a fetch is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchScope {
    /// The whole tree.
    Root,
    /// The children of one folder.
    Subtree(NodeId),
}

/// External collaborator that produces payloads.
///
/// Synchronous sources implement this directly; asynchronous hosts instead
/// answer [`crate::grid::FetchTicket`]s with [`crate::grid::TreeGrid::complete_fetch`].
pub trait DataSource {
    fn fetch(&mut self, scope: FetchScope) -> Result<SourceData, SourceError>;
}

/// In-memory source with per-folder subtrees and an optional fallback.
#[derive(Debug, Clone)]
pub struct StaticSource {
    root: SourceData,
    subtrees: HashMap<NodeId, SourceData>,
    fallback: Option<SourceData>,
}

impl StaticSource {
    #[must_use]
    pub fn new(root: SourceData) -> Self {
        Self {
            root,
            subtrees: HashMap::new(),
            fallback: None,
        }
    }

    /// Serve `data` when the children of `folder` are fetched.
    #[must_use]
    pub fn with_subtree(mut self, folder: NodeId, data: SourceData) -> Self {
        self.subtrees.insert(folder, data);
        self
    }

    /// Serve `data` for any folder without a dedicated subtree.
    #[must_use]
    pub fn with_fallback(mut self, data: SourceData) -> Self {
        self.fallback = Some(data);
        self
    }
}

impl DataSource for StaticSource {
    fn fetch(&mut self, scope: FetchScope) -> Result<SourceData, SourceError> {
        match scope {
            FetchScope::Root => Ok(self.root.clone()),
            FetchScope::Subtree(id) => self
                .subtrees
                .get(&id)
                .or(self.fallback.as_ref())
                .cloned()
                .ok_or_else(|| SourceError::Unavailable(format!("no payload for folder {id}"))),
        }
    }
}
