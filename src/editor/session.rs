use crate::blocks::{
    BlockKind, BlockRange, ParsedTable, TaskList, parse_table, parse_tasks, render_table,
};
use crate::editor::EditorBuffer;
use crate::error::{Error, Result};

/// Structured working copy of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockEditor {
    Table(ParsedTable),
    Tasks(TaskList),
}

impl BlockEditor {
    pub const fn kind(&self) -> BlockKind {
        match self {
            Self::Table(_) => BlockKind::Table,
            Self::Tasks(_) => BlockKind::Tasks,
        }
    }

    /// Markdown for the current state.
    pub fn render(&self) -> String {
        match self {
            Self::Table(table) => render_table(table),
            Self::Tasks(list) => list.render(),
        }
    }
}

/// Where a confirmed edit lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    /// Replace the lines of a block detected when the session opened.
    Existing(BlockRange),
    /// Insert at the buffer's cursor.
    New,
}

/// One structured edit of one block.
///
/// The session owns its working copy; the buffer is only touched by
/// [`EditSession::confirm`]. Dropping the session discards the edit.
#[derive(Debug, Clone)]
pub struct EditSession {
    target: EditTarget,
    editor: BlockEditor,
}

impl EditSession {
    /// Open the block covering `line` for editing.
    ///
    /// # Errors
    /// Returns [`Error::NoBlockAtLine`] when `line` is not inside a table or
    /// task list.
    pub fn open(buffer: &EditorBuffer, line: usize) -> Result<Self> {
        let blocks = buffer.detect_blocks();
        let block = *blocks.get(line).ok_or(Error::NoBlockAtLine { line })?;
        let lines = buffer.block_lines(&block);

        let editor = match block.kind {
            BlockKind::Table => BlockEditor::Table(parse_table(&lines)),
            BlockKind::Tasks => BlockEditor::Tasks(TaskList::from_tasks(parse_tasks(&lines))),
        };
        tracing::debug!(
            kind = %block.kind,
            start_line = block.start_line,
            end_line = block.end_line,
            "opened edit session"
        );

        Ok(Self {
            target: EditTarget::Existing(block),
            editor,
        })
    }

    /// Start building a new table with the default grid.
    pub fn new_table() -> Self {
        Self {
            target: EditTarget::New,
            editor: BlockEditor::Table(ParsedTable::default()),
        }
    }

    /// Start building a new task list with one blank item.
    pub fn new_tasks() -> Self {
        Self {
            target: EditTarget::New,
            editor: BlockEditor::Tasks(TaskList::default()),
        }
    }

    pub const fn target(&self) -> EditTarget {
        self.target
    }

    pub const fn editor(&self) -> &BlockEditor {
        &self.editor
    }

    pub const fn editor_mut(&mut self) -> &mut BlockEditor {
        &mut self.editor
    }

    /// The markdown that confirming would write.
    pub fn preview(&self) -> String {
        self.editor.render()
    }

    /// Write the edit into `buffer`.
    ///
    /// Existing blocks are replaced in place; new blocks are inserted at the
    /// cursor.
    ///
    /// # Errors
    /// Returns [`Error::StaleBlock`] when the buffer no longer has a block of
    /// the same kind starting at the original line. The buffer is left
    /// unchanged in that case.
    pub fn confirm(self, buffer: &mut EditorBuffer) -> Result<()> {
        let content = self.editor.render();
        match self.target {
            EditTarget::Existing(block) => {
                let current = buffer.detect_blocks().block_at(block.start_line).copied();
                let Some(current) = current.filter(|current| current.kind == block.kind) else {
                    return Err(Error::StaleBlock {
                        kind: block.kind,
                        start_line: block.start_line,
                    });
                };
                buffer.replace_block(&current, &content);
            }
            EditTarget::New => buffer.insert_block(&content),
        }
        tracing::debug!(kind = %self.editor.kind(), "confirmed edit session");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Align, ParsedTask};

    const DOC: &str = "# Plan\n\n| Item | Qty |\n|---|--:|\n| Tea | 2 |\n\n- [ ] call\n  - [x] email\n";

    #[test]
    fn test_open_table_parses_block() {
        let buffer = EditorBuffer::from_text(DOC);
        let session = EditSession::open(&buffer, 3).unwrap();
        assert_eq!(
            session.target(),
            EditTarget::Existing(BlockRange::new(BlockKind::Table, 2, 4))
        );
        let BlockEditor::Table(table) = session.editor() else {
            panic!("expected table editor");
        };
        assert_eq!(table.headers, vec!["Item", "Qty"]);
        assert_eq!(table.aligns, vec![Align::Left, Align::Right]);
        assert_eq!(table.rows, vec![vec!["Tea", "2"]]);
    }

    #[test]
    fn test_open_tasks_parses_block() {
        let buffer = EditorBuffer::from_text(DOC);
        let session = EditSession::open(&buffer, 7).unwrap();
        let BlockEditor::Tasks(list) = session.editor() else {
            panic!("expected task editor");
        };
        assert_eq!(
            list.tasks(),
            &[
                ParsedTask::new("call", false, 0),
                ParsedTask::new("email", true, 1)
            ]
        );
        assert!(list.title.is_empty());
    }

    #[test]
    fn test_open_plain_line_fails() {
        let buffer = EditorBuffer::from_text(DOC);
        let err = EditSession::open(&buffer, 0).unwrap_err();
        assert!(matches!(err, Error::NoBlockAtLine { line: 0 }));
    }

    #[test]
    fn test_confirm_table_edit_replaces_block() {
        let mut buffer = EditorBuffer::from_text(DOC);
        let mut session = EditSession::open(&buffer, 2).unwrap();
        if let BlockEditor::Table(table) = session.editor_mut() {
            table.add_row();
            table.set_cell(2, 0, "Coffee");
            table.set_cell(2, 1, "10");
        }
        session.confirm(&mut buffer).unwrap();

        assert_eq!(
            buffer.text(),
            "# Plan\n\n\
             | Item   | Qty |\n\
             | ------ | --: |\n\
             | Tea    | 2   |\n\
             | Coffee | 10  |\n\
             \n- [ ] call\n  - [x] email\n"
        );
    }

    #[test]
    fn test_confirm_task_edit_replaces_block() {
        let mut buffer = EditorBuffer::from_text(DOC);
        let mut session = EditSession::open(&buffer, 6).unwrap();
        if let BlockEditor::Tasks(list) = session.editor_mut() {
            list.toggle(0);
            list.outdent(1);
        }
        session.confirm(&mut buffer).unwrap();
        assert!(buffer.text().ends_with("\n\n- [x] call\n- [x] email\n"));
    }

    #[test]
    fn test_confirm_new_tasks_inserts_at_cursor() {
        let mut buffer = EditorBuffer::from_text("intro");
        buffer.move_to_end();
        let mut session = EditSession::new_tasks();
        if let BlockEditor::Tasks(list) = session.editor_mut() {
            list.title = "Todo".to_string();
            list.set_text(0, "first");
        }
        session.confirm(&mut buffer).unwrap();
        assert_eq!(buffer.text(), "intro\n\n## Todo\n\n- [ ] first\n");
    }

    #[test]
    fn test_new_table_preview_is_default_grid() {
        let session = EditSession::new_table();
        assert_eq!(session.target(), EditTarget::New);
        assert_eq!(
            session.preview(),
            "| Header 1 | Header 2 | Header 3 |\n\
             | -------- | -------- | -------- |\n\
             |          |          |          |\n\
             |          |          |          |"
        );
    }

    #[test]
    fn test_confirm_after_document_change_is_stale() {
        let mut buffer = EditorBuffer::from_text(DOC);
        let session = EditSession::open(&buffer, 2).unwrap();

        buffer.move_to(0, 0);
        buffer.insert_str("shifted\n");
        let before = buffer.text();

        let err = session.confirm(&mut buffer).unwrap_err();
        assert!(matches!(
            err,
            Error::StaleBlock {
                kind: BlockKind::Table,
                start_line: 2
            }
        ));
        assert_eq!(buffer.text(), before);
    }

    #[test]
    fn test_confirm_when_block_changed_kind_is_stale() {
        let mut buffer = EditorBuffer::from_text(DOC);
        let session = EditSession::open(&buffer, 6).unwrap();

        buffer.replace_block(&BlockRange::new(BlockKind::Tasks, 6, 7), "| A |\n|---|");
        let before = buffer.text();
        assert_eq!(
            buffer.detect_blocks().block_at(6).copied(),
            Some(BlockRange::new(BlockKind::Table, 6, 7))
        );

        let err = session.confirm(&mut buffer).unwrap_err();
        assert!(matches!(
            err,
            Error::StaleBlock {
                kind: BlockKind::Tasks,
                start_line: 6
            }
        ));
        assert_eq!(buffer.text(), before);
    }

    #[test]
    fn test_dropping_session_leaves_buffer_untouched() {
        let buffer = EditorBuffer::from_text(DOC);
        {
            let mut session = EditSession::open(&buffer, 6).unwrap();
            if let BlockEditor::Tasks(list) = session.editor_mut() {
                list.remove(0);
            }
        }
        assert_eq!(buffer.text(), DOC);
        assert!(!buffer.is_dirty());
    }
}
