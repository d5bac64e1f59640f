//! Errors surfaced to hosts driving block edits.
//!
//! Detection and the codecs are total and never fail; only operations that
//! tie a structured edit back to a live buffer can.

use crate::blocks::BlockKind;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested line is not part of any table or task list.
    #[error("no table or task list at line {line}")]
    NoBlockAtLine { line: usize },

    /// The document changed under an open edit session.
    #[error("{kind} block starting at line {start_line} is no longer present")]
    StaleBlock { kind: BlockKind, start_line: usize },
}
