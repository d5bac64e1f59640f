//! Pipe-table parsing and rendering.

use serde::{Deserialize, Serialize};
use unicode_width::UnicodeWidthStr;

/// Narrowest column width; keeps `---` a valid separator for empty columns.
const MIN_COLUMN_WIDTH: usize = 3;

/// Column alignment, encoded in the separator row by colon placement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl Align {
    /// Infer alignment from one separator cell (`:---:`, `---:`, `---`).
    pub fn from_separator(cell: &str) -> Self {
        let cell = cell.trim();
        if cell.starts_with(':') && cell.ends_with(':') {
            Self::Center
        } else if cell.ends_with(':') {
            Self::Right
        } else {
            Self::Left
        }
    }

    /// The next alignment in left → center → right order, wrapping around.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Left => Self::Center,
            Self::Center => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Separator cell for a column of `width` display columns.
    fn separator(self, width: usize) -> String {
        match self {
            Self::Center => format!(":{}:", "-".repeat(width.saturating_sub(2))),
            Self::Right => format!("{}:", "-".repeat(width.saturating_sub(1))),
            Self::Left => "-".repeat(width),
        }
    }
}

/// A table as edited in the structured editor.
///
/// Every row has exactly `headers.len()` cells and `aligns` has one entry per
/// header. Parsed tables always carry at least one data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub aligns: Vec<Align>,
    pub rows: Vec<Vec<String>>,
}

impl ParsedTable {
    /// A fresh grid of `rows` rows (header included) by `cols` columns.
    ///
    /// Headers are numbered `Header 1..Header N`; at least one column and one
    /// data row are always created.
    pub fn new(rows: usize, cols: usize) -> Self {
        let cols = cols.max(1);
        let data_rows = rows.saturating_sub(1).max(1);
        Self {
            headers: (1..=cols).map(default_header).collect(),
            aligns: vec![Align::Left; cols],
            rows: vec![vec![String::new(); cols]; data_rows],
        }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Rows including the header row.
    pub fn row_count(&self) -> usize {
        self.rows.len() + 1
    }

    /// The cell at `row`/`col`, where row 0 is the header row.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        let cell = if row == 0 {
            self.headers.get(col)
        } else {
            self.rows.get(row - 1).and_then(|cells| cells.get(col))
        };
        cell.map(String::as_str)
    }

    /// Overwrite a cell, where row 0 is the header row.
    ///
    /// Returns `false` when the position is outside the grid.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) -> bool {
        let slot = if row == 0 {
            self.headers.get_mut(col)
        } else {
            self.rows.get_mut(row - 1).and_then(|cells| cells.get_mut(col))
        };
        match slot {
            Some(cell) => {
                *cell = value.into();
                true
            }
            None => false,
        }
    }

    /// Append an empty data row.
    pub fn add_row(&mut self) {
        self.rows.push(vec![String::new(); self.column_count()]);
    }

    /// Drop the last data row, keeping at least one.
    pub fn remove_row(&mut self) -> bool {
        if self.rows.len() <= 1 {
            return false;
        }
        self.rows.pop();
        true
    }

    /// Append a left-aligned column with a numbered header.
    pub fn add_column(&mut self) {
        let header = default_header(self.column_count() + 1);
        self.headers.push(header);
        self.aligns.push(Align::Left);
        for row in &mut self.rows {
            row.push(String::new());
        }
    }

    /// Drop the last column, keeping at least one.
    pub fn remove_column(&mut self) -> bool {
        if self.column_count() <= 1 {
            return false;
        }
        self.headers.pop();
        self.aligns.pop();
        for row in &mut self.rows {
            row.pop();
        }
        true
    }

    /// Rotate the alignment of `col`. Returns the new alignment.
    pub fn cycle_align(&mut self, col: usize) -> Option<Align> {
        let align = self.aligns.get_mut(col)?;
        *align = align.next();
        Some(*align)
    }

    /// Render as padded pipe-table markdown.
    pub fn render(&self) -> String {
        render_table(self)
    }
}

impl Default for ParsedTable {
    fn default() -> Self {
        Self::new(3, 3)
    }
}

fn default_header(n: usize) -> String {
    format!("Header {n}")
}

/// Split a table line into trimmed cells.
///
/// One leading and one trailing `|` are removed; escaped pipes are not
/// recognized.
fn parse_cells(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    let inner = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

/// Parse the lines of one table block.
///
/// Never fails: fewer than two lines yield a one-column table, and data rows
/// are padded or truncated to the header width.
pub fn parse_table<S: AsRef<str>>(lines: &[S]) -> ParsedTable {
    let [header, separator, data @ ..] = lines else {
        tracing::trace!(lines = lines.len(), "table block too short, using default");
        return ParsedTable {
            headers: vec![default_header(1)],
            aligns: vec![Align::Left],
            rows: vec![vec![String::new()]],
        };
    };

    let headers = parse_cells(header.as_ref());
    let width = headers.len();

    let mut aligns: Vec<Align> = parse_cells(separator.as_ref())
        .iter()
        .map(|cell| Align::from_separator(cell))
        .collect();
    aligns.resize(width, Align::Left);

    let mut rows: Vec<Vec<String>> = data
        .iter()
        .map(|line| {
            let mut cells = parse_cells(line.as_ref());
            cells.resize(width, String::new());
            cells
        })
        .collect();

    if rows.is_empty() {
        rows.push(vec![String::new(); width]);
    }

    ParsedTable {
        headers,
        aligns,
        rows,
    }
}

/// Render `table` as aligned pipe-table markdown without a trailing newline.
///
/// Columns are padded to their widest cell (at least three columns wide);
/// empty cells render as a single space before padding. Widths are terminal
/// display widths, which equal character counts for ASCII and other
/// single-width text.
pub fn render_table(table: &ParsedTable) -> String {
    let cols = table.column_count();

    let widths: Vec<usize> = (0..cols)
        .map(|col| {
            std::iter::once(table.headers.as_slice())
                .chain(table.rows.iter().map(Vec::as_slice))
                .map(|row| cell_at(row, col).width())
                .max()
                .unwrap_or(0)
                .max(MIN_COLUMN_WIDTH)
        })
        .collect();

    let render_row = |row: &[String]| {
        let cells: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(col, &width)| pad_cell(cell_at(row, col), width))
            .collect();
        format!("| {} |", cells.join(" | "))
    };

    let separator: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(col, &width)| {
            table
                .aligns
                .get(col)
                .copied()
                .unwrap_or_default()
                .separator(width)
        })
        .collect();

    let mut lines = Vec::with_capacity(table.rows.len() + 2);
    lines.push(render_row(table.headers.as_slice()));
    lines.push(format!("| {} |", separator.join(" | ")));
    lines.extend(table.rows.iter().map(|row| render_row(row.as_slice())));
    lines.join("\n")
}

fn cell_at(row: &[String], col: usize) -> &str {
    row.get(col).map_or("", String::as_str)
}

/// Left-justify `text` to `width` display columns.
fn pad_cell(text: &str, width: usize) -> String {
    let text = if text.is_empty() { " " } else { text };
    let padding = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(padding))
}
