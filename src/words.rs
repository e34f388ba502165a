//! Deciding which comment words are spelling candidates.

use regex::Regex;

use crate::ignore_list::IgnoreList;
use crate::speller::Speller;

/// Split `word` into `(leading, core, trailing)` where `leading` and
/// `trailing` are runs of ASCII punctuation.  Non-ASCII punctuation counts as
/// part of the word.
pub fn trim_symbols(word: &str) -> (&str, &str, &str) {
    let core_start = word
        .find(|c: char| !c.is_ascii_punctuation())
        .unwrap_or(word.len());
    let (leading, rest) = word.split_at(core_start);
    let core_end = rest
        .rfind(|c: char| !c.is_ascii_punctuation())
        .map(|i| i + rest[i..].chars().next().map_or(0, char::len_utf8))
        .unwrap_or(0);
    let (core, trailing) = rest.split_at(core_end);
    (leading, core, trailing)
}

/// At least two letters and at most one apostrophe.
pub fn is_word(word: &str) -> bool {
    let letters = word.chars().filter(|c| c.is_alphabetic()).count();
    let apostrophes = word.chars().filter(|&c| c == '\'').count();
    letters >= 2 && apostrophes <= 1
}

/// Everything that decides whether a trimmed word gets flagged.
pub struct WordFilter<'a> {
    pub speller: &'a dyn Speller,
    pub ignore: &'a IgnoreList,
    /// A word matching any of these is treated as correct.
    pub exclude: &'a [Regex],
}

impl WordFilter<'_> {
    /// Should `core` be presented to the user?
    pub fn is_candidate(&self, core: &str) -> bool {
        // The oracle is cheaper on average than the regex scan, so it goes
        // first.
        is_word(core)
            && !self.ignore.ignore(core)
            && !self.speller.check(core)
            && !self.exclude.iter().any(|re| re.is_match(core))
    }
}
