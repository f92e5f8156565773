//! Plain-text rendering of the current window.
//!
//! One line per row:
//!
//! ```text
//! *   3   v Fiction | Jules Verne
//! ```
//!
//! A leading `*` marks the detail item, then the flat position, indentation
//! (two spaces per level), the glyph and the title. The author column shows
//! the payload's `author` (or `person`) field when present. A status line
//! follows the rows.

use std::fmt::Write as _;

use treegrid_core::{AddressMode, RowGlyph, RowView, TreeGrid, TreeResult};

fn glyph(glyph: RowGlyph) -> char {
    match glyph {
        RowGlyph::Leaf => '-',
        RowGlyph::FolderOpen => 'v',
        RowGlyph::FolderClosed => '>',
    }
}

/// Render one row without a trailing newline.
#[must_use]
pub fn render_row(row: &RowView<'_>) -> String {
    let mut line = String::new();
    let marker = if row.selected { '*' } else { ' ' };
    let _ = write!(
        line,
        "{marker}{:>4} {:indent$}{} {}",
        row.position,
        "",
        glyph(row.glyph),
        row.payload.title(),
        indent = row.indent * 2
    );
    let author = row
        .payload
        .field_str("author")
        .or_else(|| row.payload.field_str("person"));
    if let Some(author) = author {
        let _ = write!(line, " | {author}");
    }
    line
}

/// Render the current window followed by a status line.
pub fn render_window(grid: &TreeGrid) -> TreeResult<String> {
    let mut out = String::new();
    for row in grid.window_rows()? {
        out.push_str(&render_row(&row));
        out.push('\n');
    }
    out.push_str(&status_line(grid));
    out.push('\n');
    Ok(out)
}

fn status_line(grid: &TreeGrid) -> String {
    let window = grid.window();
    let shown = window.current_window().len();
    let mut status = if shown == 0 {
        format!("[0 of {}]", window.visible_count())
    } else {
        format!(
            "[{}-{} of {}]",
            window.window_start() + 1,
            window.window_start() + shown,
            window.visible_count()
        )
    };
    if window.mode() == AddressMode::Paginate {
        let _ = write!(
            status,
            " page {}/{}",
            window.current_page(),
            window.total_pages()
        );
    }
    if let Some(filter) = grid.filter().filter() {
        let _ = write!(status, " filter={:?}", filter.text());
    }
    status
}
