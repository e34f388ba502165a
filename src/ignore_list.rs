//! Words the user never wants flagged.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

/// Fold `word` if case is to be ignored.
pub fn fold(word: &str, ignore_case: bool) -> String {
    if ignore_case {
        word.to_lowercase()
    } else {
        word.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct IgnoreList {
    words: HashSet<String>,
    ignore_case: bool,
}

impl IgnoreList {
    pub fn new(ignore_case: bool) -> Self {
        Self {
            words: HashSet::new(),
            ignore_case,
        }
    }

    /// The list every session starts from.
    pub fn with_defaults(ignore_case: bool) -> Self {
        let mut list = Self::new(ignore_case);
        list.add("TODO");
        list.add("FIXME");
        list
    }

    pub fn add(&mut self, word: &str) {
        self.words.insert(fold(word, self.ignore_case));
    }

    pub fn remove(&mut self, word: &str) -> bool {
        self.words.remove(&fold(word, self.ignore_case))
    }

    pub fn ignore(&self, word: &str) -> bool {
        self.words.contains(&fold(word, self.ignore_case))
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Add every line of `path` longer than one char.  Returns how many words
    /// were read, or `None` if the file could not be read.
    pub fn add_file(&mut self, path: &Path) -> Option<usize> {
        let content = fs::read_to_string(path).ok()?;
        let mut count = 0;
        for word in content.lines().map(str::trim).filter(|w| w.chars().count() > 1) {
            self.add(word);
            count += 1;
        }
        debug!(path = %path.display(), count, "loaded ignore list");
        Some(count)
    }

    /// Load `names` from each of `dirs`; missing files are skipped.
    pub fn load(&mut self, names: &[String], dirs: &[&Path]) {
        for name in names {
            for dir in dirs {
                self.add_file(&dir.join(name));
            }
        }
    }
}

/// Append `words` to the list file at `path`, one per line, creating it if
/// needed.  A missing final newline is added first.
pub fn append_words(path: &Path, words: &[String]) -> io::Result<()> {
    let existing = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e),
    };
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if existing.last().is_some_and(|&b| b != b'\n') {
        file.write_all(b"\n")?;
    }
    for word in words {
        writeln!(file, "{word}")?;
    }
    Ok(())
}
