use ropey::Rope;

use crate::blocks::{self, BlockMap, BlockRange};
use crate::stats::DocumentStats;

/// Cursor position in the editor buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column (byte offset within the line).
    pub col: usize,
}

impl Cursor {
    /// Create a cursor at a specific position.
    pub const fn at(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// The document being edited, backed by a rope.
///
/// This is the only place document text lives; block edits are spliced into
/// it once confirmed.
pub struct EditorBuffer {
    rope: Rope,
    cursor: Cursor,
    dirty: bool,
}

impl EditorBuffer {
    /// Create a new buffer from a string.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Cursor::default(),
            dirty: false,
        }
    }

    /// Create an empty buffer.
    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// The current cursor position.
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Whether the buffer has been modified since creation or last save.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the buffer as clean (e.g., after saving).
    pub const fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Total number of lines in the buffer.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the content of a line (without trailing newline).
    pub fn line_at(&self, line_idx: usize) -> Option<String> {
        if line_idx >= self.rope.len_lines() {
            return None;
        }
        let s = self.rope.line(line_idx).to_string();
        Some(s.trim_end_matches('\n').trim_end_matches('\r').to_string())
    }

    /// Length of a line in bytes (without trailing newline).
    pub fn line_len(&self, line_idx: usize) -> usize {
        self.line_at(line_idx).map_or(0, |s| s.len())
    }

    /// The full text content of the buffer.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Character, word and line counts for the status bar.
    pub fn stats(&self) -> DocumentStats {
        DocumentStats::from_text(&self.text())
    }

    /// Detect tables and task lists in the current text.
    pub fn detect_blocks(&self) -> BlockMap {
        blocks::detect_blocks(&self.text())
    }

    /// The lines of `block` in the current text.
    pub fn block_lines(&self, block: &BlockRange) -> Vec<String> {
        let text = self.text();
        blocks::block_lines(&text, block)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Move cursor to a specific line and column.
    ///
    /// The column is clamped to the line and snapped back to a char boundary.
    pub fn move_to(&mut self, line: usize, col: usize) {
        let max_line = self.line_count().saturating_sub(1);
        self.cursor.line = line.min(max_line);
        let line_str = self.line_at(self.cursor.line).unwrap_or_default();
        let mut col = col.min(line_str.len());
        while !line_str.is_char_boundary(col) {
            col -= 1;
        }
        self.cursor.col = col;
    }

    /// Move the cursor to the end of the buffer.
    pub fn move_to_end(&mut self) {
        let last_line = self.line_count().saturating_sub(1);
        self.cursor = Cursor::at(last_line, self.line_len(last_line));
    }

    /// Insert a string at the cursor position.
    pub fn insert_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        let char_idx = self.cursor_char_idx();
        self.rope.insert(char_idx, s);

        // Move cursor to end of inserted text
        let lines: Vec<&str> = s.split('\n').collect();
        if lines.len() > 1 {
            self.cursor.line += lines.len() - 1;
            self.cursor.col = lines.last().map_or(0, |l| l.len());
        } else {
            self.cursor.col += s.len();
        }
        self.dirty = true;
    }

    /// Insert a newly built block at the cursor.
    ///
    /// A blank line is added first when the cursor sits in the middle of a
    /// line, and the block is always followed by a newline.
    pub fn insert_block(&mut self, content: &str) {
        let char_idx = self.cursor_char_idx();
        let needs_break = char_idx > 0 && self.rope.char(char_idx - 1) != '\n';
        let prefix = if needs_break { "\n\n" } else { "" };
        self.insert_str(&format!("{prefix}{content}\n"));
    }

    /// Replace the lines of `block` with `content`.
    ///
    /// Lines outside the block are untouched. A block starting past the end
    /// of the buffer is appended on a new line. The cursor moves to the start
    /// of the replaced block.
    pub fn replace_block(&mut self, block: &BlockRange, content: &str) {
        let text = self.text();
        let line_starts: Vec<usize> = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();

        let (start_byte, end_byte, content) = match line_starts.get(block.start_line) {
            Some(&start) => {
                let end = line_starts
                    .get(block.end_line + 1)
                    .map_or(text.len(), |next| next - 1);
                (start, end.max(start), content.to_string())
            }
            None => (text.len(), text.len(), format!("\n{content}")),
        };

        let start_char = self.rope.byte_to_char(start_byte);
        let end_char = self.rope.byte_to_char(end_byte);
        self.rope.remove(start_char..end_char);
        self.rope.insert(start_char, &content);

        let cursor_line = self.rope.char_to_line(start_char);
        self.move_to(cursor_line, 0);
        self.dirty = true;
        tracing::debug!(
            kind = %block.kind,
            start_line = block.start_line,
            end_line = block.end_line,
            "replaced block"
        );
    }

    /// Convert cursor position to a ropey char index.
    fn cursor_char_idx(&self) -> usize {
        let line_start = self.rope.line_to_char(self.cursor.line);
        let line_str = self.rope.line(self.cursor.line).to_string();
        // Convert byte offset to char offset within the line
        let byte_col = self.cursor.col.min(line_str.len());
        let char_offset = line_str[..byte_col].chars().count();
        line_start + char_offset
    }
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field(
                "rope",
                &format_args!("Rope({} lines)", self.rope.len_lines()),
            )
            .field("cursor", &self.cursor)
            .field("dirty", &self.dirty)
            .finish()
    }
}
