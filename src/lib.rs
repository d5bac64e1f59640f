#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. blocks::BlockMap)
    clippy::module_name_repetitions
)]

//! # mdblocks
//!
//! Inline editing of tables and task lists embedded in markdown.
//!
//! A host editor hands the whole document to [`blocks::detect_blocks`] after
//! every change and places gutter markers at each detected block. When the
//! user edits a block, its lines are parsed into a structured record, edited
//! in a form, rendered back to canonical markdown and spliced over the
//! original line range.
//!
//! ```
//! use mdblocks::blocks::{detect_blocks, extract_block_text, parse_table, render_table};
//!
//! let doc = "intro\n| a | b |\n|:-|-:|\n| 1 | 2 |\noutro";
//! let blocks = detect_blocks(doc);
//! let table = blocks.get(1).unwrap();
//! let lines: Vec<String> = extract_block_text(doc, table)
//!     .split('\n')
//!     .map(String::from)
//!     .collect();
//! let parsed = parse_table(&lines);
//! assert_eq!(parsed.headers, ["a", "b"]);
//! assert!(render_table(&parsed).starts_with("| a   | b   |"));
//! ```
//!
//! ## Modules
//!
//! - [`blocks`]: Block detection plus the table and task codecs
//! - [`editor`]: Rope-backed document buffer and edit sessions
//! - [`stats`]: Character, word and line counts
//! - [`config`]: Saved CLI defaults
//! - [`watcher`]: File watching
//! - [`perf`]: Timing scopes

pub mod blocks;
pub mod config;
pub mod editor;
pub mod error;
pub mod perf;
pub mod stats;
pub mod watcher;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::blocks::{
        Align, BlockKind, BlockMap, BlockRange, ParsedTable, ParsedTask, TaskList, detect_blocks,
        extract_block_text, parse_table, parse_tasks, render_table, render_tasks, splice_block,
    };
    pub use crate::editor::{BlockEditor, EditSession, EditorBuffer};
}
