//! Host callbacks.

use std::fmt;

use crate::node::Node;

/// Callback invoked with a node.
pub type NodeHook = Box<dyn FnMut(&Node)>;

/// Named callback slots. Empty slots are skipped.
#[derive(Default)]
pub struct GridHooks {
    on_delete: Option<NodeHook>,
    on_click: Option<NodeHook>,
}

impl GridHooks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called after a delete, with the former parent of the removed node.
    #[must_use]
    pub fn on_delete(mut self, hook: impl FnMut(&Node) + 'static) -> Self {
        self.on_delete = Some(Box::new(hook));
        self
    }

    /// Called when a row is selected.
    #[must_use]
    pub fn on_click(mut self, hook: impl FnMut(&Node) + 'static) -> Self {
        self.on_click = Some(Box::new(hook));
        self
    }

    pub(crate) fn deleted(&mut self, parent: &Node) {
        if let Some(hook) = self.on_delete.as_mut() {
            hook(parent);
        }
    }

    pub(crate) fn clicked(&mut self, node: &Node) {
        if let Some(hook) = self.on_click.as_mut() {
            hook(node);
        }
    }
}

impl fmt::Debug for GridHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridHooks")
            .field("on_delete", &self.on_delete.is_some())
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}
