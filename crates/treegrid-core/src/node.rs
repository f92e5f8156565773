//! Node identity, kind and payload.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a node, unique across the whole tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a node can hold children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A terminal item.
    #[default]
    #[serde(alias = "item", alias = "file")]
    Leaf,
    /// A container that can be expanded and collapsed.
    Folder,
}

impl NodeKind {
    #[must_use]
    pub const fn is_folder(self) -> bool {
        matches!(self, Self::Folder)
    }
}

/// Opaque application data carried by a node.
///
/// Only the title is interpreted (by the filter); every other field is
/// passed through to the renderer untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    title: String,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Payload {
    /// Create a payload with the given title and no extra fields.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Map::new(),
        }
    }

    /// Attach an arbitrary field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub(crate) fn from_parts(title: String, fields: Map<String, Value>) -> Self {
        Self { title, fields }
    }

    /// Title used for display and filtering.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Look up an extra field such as `person` or `date`.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Extra field as a string, if it is one.
    #[must_use]
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// All extra fields.
    #[must_use]
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// A node stored in the tree arena.
///
/// Parent and child links are ids; the arena owns every node, and a node's
/// subtree is discarded when it is removed from its parent.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) depth: usize,
    pub(crate) kind: NodeKind,
    pub(crate) open: bool,
    pub(crate) payload: Arc<Payload>,
    pub(crate) children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind, payload: Payload) -> Self {
        Self {
            id,
            parent: None,
            depth: 0,
            kind,
            open: false,
            payload: Arc::new(payload),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Owning parent, `None` only for the synthetic root.
    #[must_use]
    pub fn parent_id(&self) -> Option<NodeId> {
        self.parent
    }

    /// Depth below the synthetic root (root-level nodes are at depth 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Whether a folder is expanded. Meaningless for leaves.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn payload(&self) -> &Arc<Payload> {
        &self.payload
    }

    /// Child ids in display order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// A folder whose children have not been loaded yet.
    #[must_use]
    pub fn is_unloaded_folder(&self) -> bool {
        self.kind.is_folder() && self.children.is_empty()
    }

    /// Whether this node hides its descendants.
    #[must_use]
    pub fn hides_descendants(&self) -> bool {
        self.has_children() && !self.open
    }
}
