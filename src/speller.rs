//! Spelling oracle.
//!
//! The rest of the crate only talks to the [`Speller`] trait.  The shipped
//! implementation, [`DictionarySpeller`], works from plain word lists such as
//! `/usr/share/dict/words`.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::debug;

pub trait Speller: Send + Sync {
    /// Is `word` spelled correctly?
    fn check(&self, word: &str) -> bool;
    /// Suggestions, best first.
    fn suggest(&self, word: &str) -> Vec<String>;
    /// Feedback: the user replaced `original` with `chosen`.
    fn replace(&self, original: &str, chosen: &str);
}

/// Largest edit distance a suggestion may have.
const MAX_DISTANCE: usize = 2;

#[derive(Debug, Default)]
pub struct DictionarySpeller {
    words: HashSet<String>,
    /// Lowercase forms, for words written capitalised at sentence start.
    folded: HashSet<String>,
    /// Previous replacements, keyed by lowercase original.
    replacements: Mutex<HashMap<String, String>>,
}

impl DictionarySpeller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut speller = Self::new();
        for word in words {
            speller.add_word(word);
        }
        speller
    }

    pub fn add_word(&mut self, word: &str) {
        let word = word.trim();
        if word.is_empty() {
            return;
        }
        self.folded.insert(word.to_lowercase());
        self.words.insert(word.to_string());
    }

    /// Load a newline separated word list.  Returns how many words it held.
    pub fn load(&mut self, path: &Path) -> Result<usize> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("could not read dictionary {}", path.display()))?;
        let before = self.words.len();
        for word in content.lines() {
            self.add_word(word);
        }
        let added = self.words.len() - before;
        debug!(path = %path.display(), added, "loaded dictionary");
        Ok(added)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    fn known(&self, word: &str) -> bool {
        self.words.contains(word) || self.folded.contains(&word.to_lowercase())
    }
}

impl Speller for DictionarySpeller {
    fn check(&self, word: &str) -> bool {
        if self.known(word) {
            return true;
        }
        if let Some(stem) = word.strip_suffix("'s") {
            if self.known(stem) {
                return true;
            }
        }
        // `snake_case` and `well-known` are fine if every part is.
        let mut parts = word.split(['-', '_']).filter(|p| !p.is_empty()).peekable();
        if parts.peek().is_none() || !word.contains(['-', '_']) {
            return false;
        }
        parts.all(|p| self.known(p))
    }

    fn suggest(&self, word: &str) -> Vec<String> {
        let lower = word.to_lowercase();
        let len = lower.chars().count();
        let mut scored: Vec<(usize, &str)> = self
            .folded
            .iter()
            .filter(|w| w.chars().count().abs_diff(len) <= MAX_DISTANCE)
            .filter_map(|w| {
                let d = edit_distance(&lower, w);
                (d > 0 && d <= MAX_DISTANCE).then_some((d, w.as_str()))
            })
            .collect();
        scored.sort_unstable_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(b.1)));

        let mut out: Vec<String> = Vec::with_capacity(scored.len() + 1);
        if let Ok(map) = self.replacements.lock() {
            if let Some(previous) = map.get(&lower) {
                out.push(previous.clone());
            }
        }
        for (_, candidate) in scored {
            let adapted = match_case(word, candidate);
            if !out.contains(&adapted) {
                out.push(adapted);
            }
        }
        out
    }

    fn replace(&self, original: &str, chosen: &str) {
        if let Ok(mut map) = self.replacements.lock() {
            map.insert(original.to_lowercase(), chosen.to_string());
        }
    }
}

/// Give `candidate` the capitalisation pattern of `original`.
fn match_case(original: &str, candidate: &str) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return candidate.to_uppercase();
    }
    if original.chars().next().is_some_and(char::is_uppercase) {
        let mut chars = candidate.chars();
        if let Some(first) = chars.next() {
            return first.to_uppercase().chain(chars).collect();
        }
    }
    candidate.to_string()
}

/// Optimal string alignment distance (Damerau–Levenshtein without repeated
/// edits of a substring).
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (n, m) = (a.len(), b.len());
    let mut d = vec![vec![0usize; m + 1]; n + 1];
    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=m {
        d[0][j] = j;
    }
    for i in 1..=n {
        for j in 1..=m {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (d[i - 1][j] + 1)
                .min(d[i][j - 1] + 1)
                .min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(d[i - 2][j - 2] + 1);
            }
            d[i][j] = best;
        }
    }
    d[n][m]
}
