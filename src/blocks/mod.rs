//! Detection of editable blocks inside free-form markdown.
//!
//! Two block shapes are recognized:
//! - GitHub-style pipe tables (header row, separator row, data rows)
//! - Task lists (`- [ ]` / `- [x]` items, optionally indented)
//!
//! Detection is a single forward scan over the `\n`-separated lines of the
//! document. It keeps no state between calls, so hosts simply re-run it on
//! every text change.

mod table;
mod tasks;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use table::{Align, ParsedTable, parse_table, render_table};
pub use tasks::{MAX_INDENT, ParsedTask, TaskList, parse_tasks, render_tasks};

static SEPARATOR_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\|[\s:]*-+[\s:]*(\|[\s:]*-*[\s:]*)*\|$").expect("separator pattern is valid")
});

static TASK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*-\s+\[(x| )\]\s").expect("task pattern is valid"));

/// The shape of a detected block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Table,
    Tasks,
}

impl BlockKind {
    /// Short label used in gutter markers and CLI output.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Tasks => "tasks",
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.label())
    }
}

/// An inclusive, zero-based line span occupied by one block.
///
/// Line numbers shift with every edit, so a range is only meaningful for
/// the exact text it was detected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRange {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    pub start_line: usize,
    pub end_line: usize,
}

impl BlockRange {
    pub const fn new(kind: BlockKind, start_line: usize, end_line: usize) -> Self {
        Self {
            kind,
            start_line,
            end_line,
        }
    }

    /// Number of lines covered by the block.
    pub const fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }

    pub const fn contains(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

/// Blocks detected in one version of a document, ordered by start line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMap {
    blocks: Vec<BlockRange>,
}

impl BlockMap {
    /// The block covering `line`, if any.
    pub fn get(&self, line: usize) -> Option<&BlockRange> {
        let idx = self
            .blocks
            .partition_point(|block| block.end_line < line);
        self.blocks.get(idx).filter(|block| block.contains(line))
    }

    /// The block whose first line is `line`.
    pub fn block_at(&self, line: usize) -> Option<&BlockRange> {
        self.get(line).filter(|block| block.start_line == line)
    }

    /// Each block once, in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &BlockRange> {
        self.blocks.iter()
    }

    /// Every mapped line paired with the block it belongs to.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &BlockRange)> {
        self.blocks
            .iter()
            .flat_map(|block| (block.start_line..=block.end_line).map(move |line| (line, block)))
    }

    pub fn contains_line(&self, line: usize) -> bool {
        self.get(line).is_some()
    }

    /// Number of distinct blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl<'a> IntoIterator for &'a BlockMap {
    type Item = &'a BlockRange;
    type IntoIter = std::slice::Iter<'a, BlockRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.blocks.iter()
    }
}

/// Scan `text` and classify runs of lines as tables or task lists.
///
/// A table needs a table row immediately followed by a separator row; it
/// then extends over every following table row. A task list extends over
/// consecutive task lines. The scan never looks backward.
pub fn detect_blocks(text: &str) -> BlockMap {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if is_table_row(lines[i]) && lines.get(i + 1).is_some_and(|next| is_separator_row(next)) {
            let start_line = i;
            i += 2;
            while i < lines.len() && is_table_row(lines[i]) {
                i += 1;
            }
            blocks.push(BlockRange::new(BlockKind::Table, start_line, i - 1));
            continue;
        }

        if is_task_line(lines[i]) {
            let start_line = i;
            while i < lines.len() && is_task_line(lines[i]) {
                i += 1;
            }
            blocks.push(BlockRange::new(BlockKind::Tasks, start_line, i - 1));
            continue;
        }

        i += 1;
    }

    tracing::debug!(lines = lines.len(), blocks = blocks.len(), "detected blocks");
    BlockMap { blocks }
}

/// A trimmed line that starts and ends with `|` and is longer than two characters.
pub fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('|') && trimmed.ends_with('|') && trimmed.chars().count() > 2
}

/// A table separator such as `| --- | :-: | --: |`.
pub fn is_separator_row(line: &str) -> bool {
    SEPARATOR_ROW.is_match(line.trim())
}

/// A checkbox list item such as `  - [x] done`.
pub fn is_task_line(line: &str) -> bool {
    TASK_LINE.is_match(line)
}

/// The lines of `block` joined with `\n`.
///
/// Ranges reaching past the end of `text` are clamped.
pub fn extract_block_text(text: &str, block: &BlockRange) -> String {
    block_lines(text, block).join("\n")
}

/// The lines of `block`, clamped to the lines present in `text`.
pub fn block_lines<'a>(text: &'a str, block: &BlockRange) -> Vec<&'a str> {
    text.split('\n')
        .skip(block.start_line)
        .take(block.line_count())
        .collect()
}

/// Replace the lines of `block` with `content`.
///
/// Everything before `start_line` and after `end_line` is kept verbatim;
/// `content` may itself span several lines.
pub fn splice_block(text: &str, block: &BlockRange, content: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let start = block.start_line.min(lines.len());
    let after = (block.end_line + 1).min(lines.len()).max(start);

    let mut spliced = Vec::with_capacity(lines.len() - (after - start) + 1);
    spliced.extend_from_slice(&lines[..start]);
    spliced.push(content);
    spliced.extend_from_slice(&lines[after..]);
    spliced.join("\n")
}
