#![forbid(unsafe_code)]

//! Tree virtualization engine.
//!
//! Large hierarchies are linearized into a flat pre-order sequence of rows,
//! and only a small window of the visible rows is handed to a renderer:
//!
//! - [`tree`] - id-addressed node arena with structural mutations
//! - [`flatten`] - full and incremental (lazy) flattening into rows
//! - [`toggle`] - bounded-scan expand/collapse without reflattening
//! - [`filter`] - title filter as an alternate visibility predicate
//! - [`window`] - visible-index set, scroll and pagination addressing
//! - [`grid`] - [`TreeGrid`], the controller tying it all together
//! - [`source`] - payload format and the [`DataSource`] contract
//!
//! ```
//! use treegrid_core::{GridHooks, GridOptions, NodePayload, SourceData, TreeGrid};
//!
//! let mut grid = TreeGrid::new(GridOptions::default(), GridHooks::new()).unwrap();
//! grid.load(SourceData::Roots(vec![
//!     NodePayload::folder("Fiction", vec![NodePayload::leaf("Dune")]),
//!     NodePayload::leaf("Atlas"),
//! ]))
//! .unwrap();
//! grid.toggle_folder(0).unwrap();
//! let titles: Vec<_> = grid
//!     .window_rows()
//!     .unwrap()
//!     .iter()
//!     .map(|row| row.payload.title().to_owned())
//!     .collect();
//! assert_eq!(titles, ["Fiction", "Dune", "Atlas"]);
//! ```

pub mod error;
pub mod filter;
pub mod flatten;
pub mod grid;
pub mod hooks;
pub mod node;
pub mod options;
pub mod registry;
pub mod sort;
pub mod source;
pub mod toggle;
pub mod tree;
pub mod window;

pub use error::{InvalidState, SourceError, TreeError, TreeResult};
pub use filter::{Filter, FilterChange, FilterState, Visibility};
pub use flatten::{FlatRow, FlatSequence};
pub use grid::{FetchTicket, RowGlyph, RowView, ScrollPosition, ToggleOutcome, TreeGrid};
pub use hooks::GridHooks;
pub use node::{Node, NodeId, NodeKind, Payload};
pub use options::{Column, GridOptions};
pub use sort::{SortDirection, SortState};
pub use source::{DataSource, FetchScope, NodePayload, SourceData, StaticSource};
pub use tree::{IdPolicy, TreeModel};
pub use window::{AddressMode, WindowState};
