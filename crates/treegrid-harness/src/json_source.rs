//! Data source that re-reads a JSON file on every fetch.
//!
//! The root scope returns the whole file. A folder's children come from a
//! sibling file named `<stem>.<id>.json` when one exists, otherwise from the
//! `children` of the payload with that id in the main file (which is what a
//! lazily loaded grid dropped at load time).

use std::fs;
use std::path::{Path, PathBuf};

use treegrid_core::{DataSource, FetchScope, NodeId, NodePayload, SourceData, SourceError};

#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
    fetches: usize,
}

impl JsonFileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fetches: 0,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of fetches served so far.
    #[must_use]
    pub fn fetches(&self) -> usize {
        self.fetches
    }

    fn subtree_path(&self, id: NodeId) -> Option<PathBuf> {
        let stem = self.path.file_stem()?.to_str()?;
        Some(self.path.with_file_name(format!("{stem}.{id}.json")))
    }

    fn read(path: &Path) -> Result<SourceData, SourceError> {
        let text = fs::read_to_string(path)?;
        SourceData::from_json_str(&text)
    }
}

impl DataSource for JsonFileSource {
    fn fetch(&mut self, scope: FetchScope) -> Result<SourceData, SourceError> {
        self.fetches += 1;
        match scope {
            FetchScope::Root => {
                tracing::debug!(path = %self.path.display(), "fetch root");
                Self::read(&self.path)
            }
            FetchScope::Subtree(id) => {
                if let Some(path) = self.subtree_path(id).filter(|p| p.is_file()) {
                    tracing::debug!(node = %id, path = %path.display(), "fetch subtree file");
                    return Self::read(&path);
                }
                let data = Self::read(&self.path)?;
                find(data.items(), id)
                    .map(|payload| SourceData::Roots(payload.children.clone()))
                    .ok_or_else(|| {
                        SourceError::Unavailable(format!(
                            "node {id} not found in {}",
                            self.path.display()
                        ))
                    })
            }
        }
    }
}

fn find(items: &[NodePayload], id: NodeId) -> Option<&NodePayload> {
    items.iter().find_map(|item| {
        if item.id == Some(id) {
            Some(item)
        } else {
            find(&item.children, id)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_io_error() {
        let mut source = JsonFileSource::new("/nonexistent/treegrid/data.json");
        assert!(matches!(
            source.fetch(FetchScope::Root),
            Err(SourceError::Io(_))
        ));
        assert_eq!(source.fetches(), 1);
    }

    #[test]
    fn find_searches_nested_payloads() {
        let items = vec![NodePayload::folder(
            "a",
            vec![NodePayload::folder("b", vec![NodePayload::leaf("c")]).with_id(7)],
        )
        .with_id(1)];
        assert_eq!(find(&items, NodeId(7)).map(|p| p.title.as_str()), Some("b"));
        assert!(find(&items, NodeId(9)).is_none());
    }
}
