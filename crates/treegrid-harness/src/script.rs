//! Line-oriented command driver.
//!
//! Each non-blank line not starting with `#` is one command:
//!
//! | Command | Effect |
//! |---------|--------|
//! | `toggle ROW` | Expand/collapse, fetching children from the source if needed |
//! | `select ROW` | Make the row the detail item |
//! | `filter [TEXT]` | Set the filter; no text clears it |
//! | `range BEGIN` | Move the window start |
//! | `page N` | Jump to page N |
//! | `next` / `prev` | Page up / page down |
//! | `paginate on\|off` | Switch addressing mode |
//! | `size N` | Set rows per window |
//! | `scroll OFFSET TOTAL` | Scroll to a pixel offset |
//! | `add PARENT TITLE` / `folder PARENT TITLE` | Add a leaf / empty folder |
//! | `delete ID` | Remove a node and its subtree |
//! | `move ID PARENT` | Re-parent a node |
//! | `sort COLUMN asc\|desc` | Toggle a sort indicator |
//! | `show` | Print the current window |
//!
//! Every command prints one result line. Parse and engine errors are printed
//! as `error: ...` and the script continues.

use std::io::{BufRead, Write};
use std::str::FromStr;

use treegrid_core::{
    DataSource, NodeId, NodePayload, SortDirection, ToggleOutcome, TreeGrid, TreeResult,
};

use crate::HarnessError;
use crate::render::render_window;

/// One parsed script command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Toggle(usize),
    Select(usize),
    Filter(String),
    Range(usize),
    Page(usize),
    Next,
    Prev,
    Paginate(bool),
    Size(usize),
    Scroll { offset: f64, total: f64 },
    Add { parent: NodeId, title: String, folder: bool },
    Delete(NodeId),
    Move { id: NodeId, parent: NodeId },
    Sort { column: usize, ascending: bool },
    Show,
}

fn arg<T: FromStr>(word: Option<&str>, what: &str) -> Result<T, String> {
    let word = word.ok_or_else(|| format!("missing {what}"))?;
    word.parse().map_err(|_| format!("invalid {what}: {word:?}"))
}

fn node_id(word: Option<&str>, what: &str) -> Result<NodeId, String> {
    arg::<u64>(word, what).map(NodeId)
}

impl Command {
    /// Parse one line. `Ok(None)` for blank lines and comments.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let mut words = rest.split_whitespace();

        let command = match verb {
            "toggle" => Self::Toggle(arg(words.next(), "row")?),
            "select" => Self::Select(arg(words.next(), "row")?),
            "filter" => Self::Filter(rest.to_owned()),
            "range" => Self::Range(arg(words.next(), "window start")?),
            "page" => Self::Page(arg(words.next(), "page")?),
            "next" => Self::Next,
            "prev" => Self::Prev,
            "paginate" => match words.next() {
                Some("on") => Self::Paginate(true),
                Some("off") => Self::Paginate(false),
                other => return Err(format!("expected on|off, got {other:?}")),
            },
            "size" => Self::Size(arg(words.next(), "window size")?),
            "scroll" => Self::Scroll {
                offset: arg(words.next(), "offset")?,
                total: arg(words.next(), "total height")?,
            },
            "add" | "folder" => {
                let (parent, title) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                let title = title.trim();
                if title.is_empty() {
                    return Err("missing title".into());
                }
                Self::Add {
                    parent: node_id(Some(parent), "parent id")?,
                    title: title.to_owned(),
                    folder: verb == "folder",
                }
            }
            "delete" => Self::Delete(node_id(words.next(), "node id")?),
            "move" => Self::Move {
                id: node_id(words.next(), "node id")?,
                parent: node_id(words.next(), "parent id")?,
            },
            "sort" => Self::Sort {
                column: arg(words.next(), "column")?,
                ascending: match words.next() {
                    Some("asc") => true,
                    Some("desc") => false,
                    other => return Err(format!("expected asc|desc, got {other:?}")),
                },
            },
            "show" => Self::Show,
            other => return Err(format!("unknown command {other:?}")),
        };
        Ok(Some(command))
    }

    /// Run against `grid`, returning the text to print.
    pub fn apply(&self, grid: &mut TreeGrid, source: &mut dyn DataSource) -> TreeResult<String> {
        Ok(match self {
            Self::Toggle(row) => match grid.expand_from(*row, source)? {
                ToggleOutcome::Opened => format!("opened row {row}"),
                ToggleOutcome::Closed => format!("closed row {row}"),
                ToggleOutcome::FetchPending => format!("row {row} is loading"),
                ToggleOutcome::FetchRequired(ticket) => {
                    format!("fetch required for node {}", ticket.node())
                }
            },
            Self::Select(row) => format!("selected node {}", grid.select(*row)?),
            Self::Filter(text) => {
                grid.set_filter(text);
                format!("{} visible", grid.window().visible_count())
            }
            Self::Range(begin) => {
                grid.refresh_range(*begin)?;
                format!("window at {begin}")
            }
            Self::Page(page) => {
                grid.jump_to_page(*page)?;
                format!("page {page}")
            }
            Self::Next | Self::Prev => {
                let moved = if *self == Self::Next {
                    grid.page_up()
                } else {
                    grid.page_down()
                };
                let page = grid.window().current_page();
                if moved {
                    format!("page {page}")
                } else {
                    format!("still on page {page}")
                }
            }
            Self::Paginate(on) => {
                grid.set_paginate(*on);
                format!("paginate {}", if *on { "on" } else { "off" })
            }
            Self::Size(size) => {
                grid.set_window_size(*size)?;
                format!("window size {size}")
            }
            Self::Scroll { offset, total } => {
                let pos = grid.scroll_to(*offset, *total);
                format!("window at {} (margin {}px)", pos.begin, pos.margin)
            }
            Self::Add {
                parent,
                title,
                folder,
            } => {
                let payload = if *folder {
                    NodePayload::folder(title.as_str(), Vec::new())
                } else {
                    NodePayload::leaf(title.as_str())
                };
                format!("added node {}", grid.add_node(*parent, payload)?)
            }
            Self::Delete(id) => {
                if grid.delete_node(*id)? {
                    format!("deleted node {id}")
                } else {
                    format!("node {id} cannot be deleted")
                }
            }
            Self::Move { id, parent } => {
                grid.move_node(*id, *parent)?;
                format!("moved node {id} under {parent}")
            }
            Self::Sort { column, ascending } => {
                let direction = match grid.toggle_sort(*column, *ascending)? {
                    SortDirection::Ascending => "ascending",
                    SortDirection::Descending => "descending",
                    SortDirection::Unsorted => "unsorted",
                };
                format!("column {column} {direction}")
            }
            Self::Show => render_window(grid)?.trim_end().to_owned(),
        })
    }
}

/// Counts from a script run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScriptSummary {
    pub commands: usize,
    pub errors: usize,
}

/// Execute every command in `input`, writing result lines to `out`.
///
/// Only I/O failures abort the run.
pub fn run_script(
    grid: &mut TreeGrid,
    source: &mut dyn DataSource,
    input: impl BufRead,
    out: &mut impl Write,
) -> Result<ScriptSummary, HarnessError> {
    let mut summary = ScriptSummary::default();
    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let result = match Command::parse(&line) {
            Ok(None) => continue,
            Ok(Some(command)) => {
                summary.commands += 1;
                command.apply(grid, source).map_err(HarnessError::from)
            }
            Err(message) => {
                summary.commands += 1;
                Err(HarnessError::Parse {
                    line: index + 1,
                    message,
                })
            }
        };
        match result {
            Ok(text) => writeln!(out, "{text}")?,
            Err(err) => {
                summary.errors += 1;
                tracing::warn!(line = index + 1, error = %err, "command failed");
                writeln!(out, "error: {err}")?;
            }
        }
    }
    Ok(summary)
}
