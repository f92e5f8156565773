//! Bounded-scan expand/collapse of a folder's rows.
//!
//! Toggling touches only the rows of the target's subtree: the scan starts at
//! `index + 1` and stops at the first row whose depth is not greater than the
//! target's. No reflatten happens.
//!
//! - Closing hides every row in the subtree.
//! - Opening shows every row except those beneath a nested folder that is
//!   itself closed, so collapsed sub-branches stay collapsed.

use crate::error::{InvalidState, TreeResult};
use crate::flatten::FlatSequence;
use crate::tree::TreeModel;

/// Result of [`toggle_folder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Toggled {
    /// New open state of the folder.
    pub open: bool,
    /// Number of subtree rows scanned.
    pub scanned: usize,
}

/// Flip the folder at `index` and update the `show` flags of its subtree.
///
/// Fails with [`InvalidState::RowOutOfBounds`] or [`InvalidState::NotAFolder`]
/// without changing anything.
pub fn toggle_folder(
    tree: &mut TreeModel,
    rows: &mut FlatSequence,
    index: usize,
) -> TreeResult<Toggled> {
    let target = rows.row(index)?;
    let id = target.id;
    if !target.kind.is_folder() {
        return Err(InvalidState::NotAFolder(id).into());
    }
    let base_depth = target.depth;
    // Rows under a folder can never be more visible than the folder itself.
    let reveal = target.show;
    let closing = tree.get(id)?.is_open();

    let mut skip_below: Option<usize> = None;
    let mut scanned = 0;
    for row in &mut rows.rows_mut()[index + 1..] {
        if row.depth <= base_depth {
            break;
        }
        scanned += 1;
        if let Some(depth) = skip_below {
            if row.depth > depth {
                continue;
            }
            skip_below = None;
        }

        if closing {
            row.show = false;
        } else {
            row.show = reveal;
            if tree.get(row.id)?.hides_descendants() {
                skip_below = Some(row.depth);
            }
        }
    }

    tree.set_open(id, !closing)?;
    tracing::trace!(node = %id, open = !closing, scanned, "toggle folder");
    Ok(Toggled {
        open: !closing,
        scanned,
    })
}
