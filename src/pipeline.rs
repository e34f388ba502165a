//! Turning paths into parsed files.
//!
//! Interactive sessions get their files from a single background worker
//! over an unbuffered channel, so file N+1 is parsed while the user works on
//! file N.  Report mode parses everything in parallel with rayon; each file
//! is still lexed on one thread.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, sync_channel};
use std::thread;

use anyhow::{Context, Result};
use rayon::prelude::*;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::Dialects;
use crate::highlight::highlight;
use crate::ignore_list::IgnoreList;
use crate::parser::{ParseOptions, parse};
use crate::source_file::SourceFile;
use crate::speller::Speller;
use crate::text_buffer::Style;
use crate::types::Misspelling;
use crate::words::WordFilter;

/// Everything needed to parse any file.  Immutable once built, so it can be
/// shared between threads.
pub struct FileParser {
    pub dialects: Dialects,
    pub speller: Arc<dyn Speller>,
    /// Snapshot taken at startup; words ignored later are re-checked by the
    /// session.
    pub ignore: IgnoreList,
    pub exclude: Vec<Regex>,
    pub highlight_commands: Vec<String>,
    pub dim_code: bool,
    pub filter_commented_code: bool,
    pub comment_color: Option<Style>,
}

impl FileParser {
    pub fn accepts(&self, path: &Path) -> bool {
        self.dialects.for_path(path).is_some()
    }

    /// Parse `text` as the contents of `path`.  `None` if no style covers
    /// the file.
    pub fn parse_text(&self, path: &Path, text: &str) -> Option<SourceFile> {
        let entry = self.dialects.for_path(path)?;
        let opts = ParseOptions {
            style: &entry.style,
            dialect: &entry.dialect,
            filter: WordFilter {
                speller: self.speller.as_ref(),
                ignore: &self.ignore,
                exclude: &self.exclude,
            },
            dim_code: self.dim_code,
            filter_commented_code: self.filter_commented_code,
            comment_color: self.comment_color.clone(),
        };
        Some(parse(path, text, &opts))
    }

    /// Read and parse `path`, through the highlighter if `highlighted`.
    pub fn parse_path(&self, path: &Path, highlighted: bool) -> Result<Option<SourceFile>> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("could not read {}", path.display()))?;
        let text = if highlighted && !self.highlight_commands.is_empty() {
            highlight(&self.highlight_commands, path, &raw)
        } else {
            raw
        };
        let file = self.parse_text(path, &text);
        if let Some(f) = &file {
            debug!(path = %path.display(), words = f.words.len(), "parsed");
        }
        Ok(file)
    }
}

/// Parse `files` on a background thread.  Files without candidates are not
/// sent.  The worker stops once the receiver is dropped.
pub fn spawn_parser(parser: Arc<FileParser>, files: Vec<PathBuf>) -> Receiver<SourceFile> {
    let (tx, rx) = sync_channel(0);
    thread::spawn(move || {
        for path in files {
            let file = match parser.parse_path(&path, true) {
                Ok(Some(file)) if !file.words.is_empty() => file,
                Ok(_) => continue,
                Err(e) => {
                    warn!("{e:#}");
                    continue;
                }
            };
            if tx.send(file).is_err() {
                debug!("session ended, parser stopping");
                return;
            }
        }
    });
    rx
}

/// Every candidate in `files`, sorted by file and position.
pub fn report(parser: &FileParser, files: &[PathBuf], suggestions: usize) -> Vec<Misspelling> {
    let mut found: Vec<Misspelling> = files
        .par_iter()
        .filter_map(|path| match parser.parse_path(path, false) {
            Ok(file) => file,
            Err(e) => {
                warn!("{e:#}");
                None
            }
        })
        .flat_map_iter(|file| {
            let name = file.path.display().to_string();
            file.words
                .iter()
                .map(|word| {
                    let (line, col) = file.position(word);
                    let mut suggested = parser.speller.suggest(&word.original);
                    suggested.truncate(suggestions);
                    Misspelling {
                        file: name.clone(),
                        line,
                        col,
                        word: word.original.clone(),
                        suggestions: suggested,
                    }
                })
                .collect::<Vec<_>>()
        })
        .collect();

    found.sort_by(|a, b| {
        a.file
            .cmp(&b.file)
            .then(a.line.cmp(&b.line))
            .then(a.col.cmp(&b.col))
    });
    found
}

// ── Tests ─────────────────────────────────────────────────────────────────────
