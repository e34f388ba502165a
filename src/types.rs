use std::fmt;

use serde::Serialize;

/// One flagged word, as printed in report mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Misspelling {
    pub file: String,
    pub line: usize,
    pub col: usize,
    pub word: String,
    pub suggestions: Vec<String>,
}

impl fmt::Display for Misspelling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}: {}", self.file, self.line, self.col, self.word)?;
        if !self.suggestions.is_empty() {
            write!(f, " ({})", self.suggestions.join(", "))?;
        }
        Ok(())
    }
}
