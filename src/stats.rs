//! Document statistics for the status bar.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentStats {
    pub chars: usize,
    pub words: usize,
    pub lines: usize,
}

impl DocumentStats {
    pub fn from_text(text: &str) -> Self {
        Self {
            chars: text.chars().count(),
            words: text.split_whitespace().count(),
            lines: text.split('\n').count(),
        }
    }
}

impl std::fmt::Display for DocumentStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} lines  {} words  {} chars",
            self.lines, self.words, self.chars
        )
    }
}
