//! Host-side editing of detected blocks.
//!
//! Provides a rope-backed text buffer that owns the document, and edit
//! sessions that carry a structured copy of one block from parse to splice.

mod buffer;
mod session;

pub use buffer::{Cursor, EditorBuffer};
pub use session::{BlockEditor, EditSession, EditTarget};
