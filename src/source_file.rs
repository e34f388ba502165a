//! A parsed file: its rendered buffer plus the words to present.

use std::path::{Path, PathBuf};

use crate::text_buffer::{SliceIndex, TextBuffer};

/// A flagged comment word and where it sits in the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Text as found in the file.
    pub original: String,
    pub index: SliceIndex,
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: TextBuffer,
    pub words: Vec<Word>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, text: TextBuffer, words: Vec<Word>) -> Self {
        Self {
            path: path.into(),
            text,
            words,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current text at `index`.
    pub fn text_at(&self, index: SliceIndex) -> Option<&str> {
        self.text.slice(index).map(|s| s.text.as_str())
    }

    /// Returns `false` if `index` does not exist.
    pub fn replace(&mut self, index: SliceIndex, text: &str) -> bool {
        self.text.set_slice_text(index, text)
    }

    /// 1-based `(line, column)` of `word`.
    pub fn position(&self, word: &Word) -> (usize, usize) {
        (word.index.line + 1, self.text.column_of(word.index))
    }
}
