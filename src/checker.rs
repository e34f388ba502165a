//! The interactive spell checking session.
//!
//! Files arrive one at a time from the parse pipeline.  For every flagged
//! word the [`Frontend`] is asked for an [`Action`]; replacements are kept in
//! memory until [`SpellChecker::finish`] writes the changed files.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::backup::{Backup, BackupLine};
use crate::ignore_list::{IgnoreList, fold};
use crate::source_file::{SourceFile, Word};
use crate::speller::Speller;
use crate::text_buffer::SliceIndex;

// ── Actions ───────────────────────────────────────────────────────────────────

/// Everything the user can do with a flagged word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// 0-based index into the shown suggestions.
    SelectSuggestion(usize),
    Ignore { all: bool },
    Replace { all: bool },
    Undo,
    /// Skip the rest of the current file.
    Skip,
    /// Stop and write what was changed so far.
    Exit,
    /// Stop and discard every change.
    Abort,
}

/// Outcome of handling one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptResult<T> {
    Accepted(T),
    /// Ask again for the same word.
    Retry,
    /// End the session.
    Cancelled,
}

/// Where to continue after an accepted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    NextWord,
    NextFile,
    Jump { file: usize, word: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum UndoKind {
    Replacement { index: SliceIndex },
    /// `word` is set for "ignore all".
    Ignore { word: Option<String> },
    Skip,
    ReplaceAll { start: SliceIndex, from: String },
}

#[derive(Debug, Clone)]
struct UndoEvent {
    file: usize,
    word: usize,
    kind: UndoKind,
}

/// User interaction needed by the session.
pub trait Frontend {
    /// Present `word` with `suggestions` and return the chosen action.
    fn prompt(&mut self, file: &SourceFile, word: &Word, suggestions: &[String])
    -> Result<Action>;
    /// Ask for replacement text.  `None` or an empty string cancels.
    fn read_replacement(&mut self, word: &str, all: bool) -> Result<Option<String>>;
    fn confirm(&mut self, question: &str) -> Result<bool>;
}

// ── File context ──────────────────────────────────────────────────────────────

/// A source file plus the changes made to it.
pub struct FileContext {
    pub file: SourceFile,
    /// Changed slices and their text before the first change.
    changes: BTreeMap<SliceIndex, String>,
}

impl FileContext {
    pub fn new(file: SourceFile) -> Self {
        Self {
            file,
            changes: BTreeMap::new(),
        }
    }

    pub fn change(&mut self, index: SliceIndex, text: &str) {
        if let Some(current) = self.file.text_at(index) {
            let current = current.to_string();
            self.changes.entry(index).or_insert(current);
            self.file.replace(index, text);
        }
    }

    pub fn remove_change(&mut self, index: SliceIndex) {
        if let Some(original) = self.changes.remove(&index) {
            self.file.replace(index, &original);
        }
    }

    pub fn is_changed(&self, index: SliceIndex) -> bool {
        self.changes.contains_key(&index)
    }

    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// Text of every changed line as it was before any change.
    pub fn original_lines(&self) -> Vec<BackupLine> {
        let mut lines: Vec<usize> = self.changes.keys().map(|i| i.line).collect();
        lines.dedup();
        lines
            .into_iter()
            .map(|line| {
                let text = self
                    .file
                    .text
                    .line(line)
                    .iter()
                    .enumerate()
                    .map(|(slice, s)| {
                        self.changes
                            .get(&SliceIndex::new(line, slice))
                            .map_or(s.text.as_str(), String::as_str)
                    })
                    .collect();
                BackupLine { line, text }
            })
            .collect()
    }

    pub fn write(&self) -> Result<()> {
        fs::write(&self.file.path, self.file.text.to_plain_string())
            .with_context(|| format!("could not write {}", self.file.path.display()))
    }
}

// ── Session ───────────────────────────────────────────────────────────────────

pub struct SessionOptions {
    pub ignore_case: bool,
    /// Maximum number of suggestions shown.
    pub suggestions: usize,
}

pub struct SpellChecker<F: Frontend> {
    frontend: F,
    speller: Arc<dyn Speller>,
    ignore_case: bool,
    max_suggestions: usize,
    ignore: IgnoreList,
    /// Words ignored with "ignore all", in order.
    ignored_all: Vec<String>,
    /// Folded original → replacement, applied to every later file.
    replacements: HashMap<String, String>,
    files: Vec<FileContext>,
    current: usize,
    undo: Vec<UndoEvent>,
    changed: bool,
    discard_all: bool,
    interrupted: Arc<AtomicBool>,
}

/// Summary of [`SpellChecker::finish`].
#[derive(Debug, Default)]
pub struct FinishReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
    pub backup: Option<PathBuf>,
}

impl<F: Frontend> SpellChecker<F> {
    pub fn new(frontend: F, speller: Arc<dyn Speller>, options: SessionOptions) -> Self {
        Self {
            frontend,
            speller,
            ignore_case: options.ignore_case,
            max_suggestions: options.suggestions,
            ignore: IgnoreList::new(options.ignore_case),
            ignored_all: Vec::new(),
            replacements: HashMap::new(),
            files: Vec::new(),
            current: 0,
            undo: Vec::new(),
            changed: false,
            discard_all: false,
            interrupted: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Setting the returned flag aborts the session before the next prompt.
    pub fn interrupt_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupted)
    }

    pub fn set_interrupt_handle(&mut self, flag: Arc<AtomicBool>) {
        self.interrupted = flag;
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    pub fn files(&self) -> &[FileContext] {
        &self.files
    }

    pub fn ignored_words(&self) -> &[String] {
        &self.ignored_all
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    fn key(&self, word: &str) -> String {
        fold(word, self.ignore_case)
    }

    /// Change every word of file `id` at or after `start` that folds to
    /// `from`.
    fn replace_all_in_file(&mut self, id: usize, from: &str, to: &str, start: SliceIndex) {
        for index in self.matching_words(id, from, start) {
            self.files[id].change(index, to);
        }
    }

    fn matching_words(&self, id: usize, from: &str, start: SliceIndex) -> Vec<SliceIndex> {
        self.files[id]
            .file
            .words
            .iter()
            .filter(|w| w.index >= start && self.key(&w.original) == from)
            .map(|w| w.index)
            .collect()
    }

    /// Queue `file`, applying every replace-all mapping made so far.
    pub fn add_file(&mut self, file: SourceFile) {
        self.files.push(FileContext::new(file));
        self.current = self.files.len() - 1;
        let replacements: Vec<(String, String)> = self
            .replacements
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (from, to) in replacements {
            self.replace_all_in_file(self.current, &from, &to, SliceIndex::default());
        }
    }

    fn undo_event(&mut self, event: UndoEvent) -> Step {
        match event.kind {
            UndoKind::Replacement { index } => self.files[event.file].remove_change(index),
            UndoKind::Ignore { word: Some(word) } => {
                self.ignore.remove(&word);
                self.ignored_all.retain(|w| *w != word);
            }
            UndoKind::Ignore { word: None } | UndoKind::Skip => {}
            UndoKind::ReplaceAll { start, from } => {
                self.replacements.remove(&from);
                for id in event.file..self.files.len() {
                    let start = if id == event.file {
                        start
                    } else {
                        SliceIndex::default()
                    };
                    for index in self.matching_words(id, &from, start) {
                        self.files[id].remove_change(index);
                    }
                }
            }
        }
        Step::Jump {
            file: event.file,
            word: event.word,
        }
    }

    fn handle(
        &mut self,
        action: Action,
        file: usize,
        word_id: usize,
        word: &Word,
        suggestions: &[String],
    ) -> Result<PromptResult<Step>> {
        let record = |kind: UndoKind| UndoEvent {
            file,
            word: word_id,
            kind,
        };
        let result = match action {
            Action::SelectSuggestion(n) => {
                let Some(replacement) = suggestions.get(n) else {
                    return Ok(PromptResult::Retry);
                };
                self.files[file].change(word.index, replacement);
                self.speller.replace(&word.original, replacement);
                self.undo
                    .push(record(UndoKind::Replacement { index: word.index }));
                self.changed = true;
                PromptResult::Accepted(Step::NextWord)
            }
            Action::Ignore { all } => {
                let ignored = if all {
                    let key = self.key(&word.original);
                    self.ignore.add(&key);
                    if !self.ignored_all.contains(&key) {
                        self.ignored_all.push(key.clone());
                    }
                    Some(key)
                } else {
                    None
                };
                self.undo.push(record(UndoKind::Ignore { word: ignored }));
                PromptResult::Accepted(Step::NextWord)
            }
            Action::Replace { all } => {
                let text = match self.frontend.read_replacement(&word.original, all)? {
                    Some(text) if !text.is_empty() => text,
                    _ => return Ok(PromptResult::Retry),
                };
                if all {
                    let from = self.key(&word.original);
                    self.replacements.insert(from.clone(), text.clone());
                    for id in file..self.files.len() {
                        let start = if id == file {
                            word.index
                        } else {
                            SliceIndex::default()
                        };
                        self.replace_all_in_file(id, &from, &text, start);
                    }
                    self.undo.push(record(UndoKind::ReplaceAll {
                        start: word.index,
                        from,
                    }));
                } else {
                    self.files[file].change(word.index, &text);
                    self.undo
                        .push(record(UndoKind::Replacement { index: word.index }));
                }
                self.speller.replace(&word.original, &text);
                self.changed = true;
                PromptResult::Accepted(Step::NextWord)
            }
            Action::Undo => match self.undo.pop() {
                Some(event) => PromptResult::Accepted(self.undo_event(event)),
                None => PromptResult::Retry,
            },
            Action::Skip => {
                self.undo.push(record(UndoKind::Skip));
                PromptResult::Accepted(Step::NextFile)
            }
            Action::Exit => PromptResult::Cancelled,
            Action::Abort => {
                if !self.changed || self.frontend.confirm("Discard all changes and quit?")? {
                    self.discard_all = true;
                    PromptResult::Cancelled
                } else {
                    PromptResult::Retry
                }
            }
        };
        Ok(result)
    }

    fn interrupted(&mut self) -> bool {
        if self.interrupted.load(Ordering::SeqCst) {
            debug!("session interrupted");
            self.discard_all = true;
            return true;
        }
        false
    }

    /// Check every file added so far, starting with the last one added.
    /// Returns `true` when the session should end.
    pub fn run(&mut self) -> Result<bool> {
        let mut file_id = self.current;
        let mut word_id = 0;
        loop {
            if self.interrupted() {
                return Ok(true);
            }
            let Some(ctx) = self.files.get(file_id) else {
                return Ok(false);
            };
            let Some(word) = ctx.file.words.get(word_id).cloned() else {
                file_id += 1;
                word_id = 0;
                continue;
            };
            self.current = file_id;
            if self.ignore.ignore(&word.original) || ctx.is_changed(word.index) {
                word_id += 1;
                continue;
            }

            let mut suggestions = self.speller.suggest(&word.original);
            suggestions.truncate(self.max_suggestions);

            let step = loop {
                if self.interrupted() {
                    return Ok(true);
                }
                let action =
                    self.frontend
                        .prompt(&self.files[file_id].file, &word, &suggestions)?;
                match self.handle(action, file_id, word_id, &word, &suggestions)? {
                    PromptResult::Accepted(step) => break step,
                    PromptResult::Retry => continue,
                    PromptResult::Cancelled => return Ok(true),
                }
            };
            match step {
                Step::NextWord => word_id += 1,
                Step::NextFile => {
                    file_id += 1;
                    word_id = 0;
                }
                Step::Jump { file, word } => {
                    file_id = file;
                    word_id = word;
                }
            }
        }
    }

    /// Write changed files, storing a backup in `backup_dir` if given.
    pub fn finish(&mut self, backup_dir: Option<&Path>) -> Result<FinishReport> {
        let mut report = FinishReport::default();
        if self.discard_all || !self.changed {
            info!(discarded = self.discard_all, "nothing to write");
            return Ok(report);
        }
        let mut backup = Backup::default();
        for ctx in self.files.iter().filter(|c| c.has_changes()) {
            let originals = ctx.original_lines();
            if let Err(e) = ctx.write() {
                warn!("{e:#}");
                report.failed.push((ctx.file.path.clone(), e));
                continue;
            }
            if backup_dir.is_some() {
                backup.add_file(&ctx.file.path, originals)?;
            }
            report.written.push(ctx.file.path.clone());
        }
        if let Some(dir) = backup_dir {
            if !backup.is_empty() {
                report.backup = Some(backup.save(dir)?);
            }
        }
        Ok(report)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speller::DictionarySpeller;
    use crate::text_buffer::TextBuffer;
    use std::collections::VecDeque;
    use tempfile::TempDir;

    /// Plays back canned answers and records what it was asked.
    #[derive(Default)]
    struct Scripted {
        actions: VecDeque<Action>,
        replacements: VecDeque<Option<String>>,
        confirm: bool,
        prompted: Vec<String>,
        /// Raised while the first prompt is open, like a Ctrl-C would.
        interrupt: Option<Arc<AtomicBool>>,
    }

    impl Frontend for Scripted {
        fn prompt(&mut self, file: &SourceFile, word: &Word, _: &[String]) -> Result<Action> {
            self.prompted
                .push(file.text_at(word.index).unwrap_or_default().to_string());
            if let Some(flag) = self.interrupt.take() {
                flag.store(true, Ordering::SeqCst);
            }
            Ok(self.actions.pop_front().unwrap_or(Action::Exit))
        }

        fn read_replacement(&mut self, _: &str, _: bool) -> Result<Option<String>> {
            Ok(self.replacements.pop_front().flatten())
        }

        fn confirm(&mut self, _: &str) -> Result<bool> {
            Ok(self.confirm)
        }
    }

    /// A one-line comment file holding `words`, each flagged.
    fn source(path: &Path, words: &[&str]) -> SourceFile {
        let mut tb = TextBuffer::new();
        tb.add_slice("//");
        let mut flagged = Vec::new();
        for w in words {
            tb.add_slice(" ");
            let index = tb.add_slice(w);
            flagged.push(Word {
                original: w.to_string(),
                index,
            });
        }
        tb.newline();
        SourceFile::new(path, tb, flagged)
    }

    fn checker(actions: &[Action]) -> SpellChecker<Scripted> {
        let frontend = Scripted {
            actions: actions.iter().copied().collect(),
            ..Scripted::default()
        };
        let speller = Arc::new(DictionarySpeller::from_words(["hello", "world"]));
        SpellChecker::new(
            frontend,
            speller,
            SessionOptions {
                ignore_case: true,
                suggestions: 20,
            },
        )
    }

    fn text(checker: &SpellChecker<Scripted>, file: usize) -> String {
        checker.files()[file].file.text.to_plain_string()
    }

    #[test]
    fn test_select_suggestion_and_finish_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.c");
        fs::write(&path, "// helo\n").unwrap();

        let mut c = checker(&[Action::SelectSuggestion(0)]);
        c.add_file(source(&path, &["helo"]));
        assert!(!c.run().unwrap());
        assert_eq!(text(&c, 0), "// hello\n");

        let report = c.finish(Some(dir.path())).unwrap();
        assert_eq!(report.written, [path.clone()]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "// hello\n");

        let backup = Backup::load(dir.path()).unwrap().unwrap();
        assert_eq!(backup.files[0].lines[0].text, "// helo");
    }

    #[test]
    fn test_out_of_range_suggestion_retries() {
        let mut c = checker(&[Action::SelectSuggestion(9), Action::Ignore { all: false }]);
        c.add_file(source(Path::new("a.c"), &["helo"]));
        assert!(!c.run().unwrap());
        assert_eq!(c.frontend().prompted, ["helo", "helo"]);
        assert!(!c.is_changed());
    }

    #[test]
    fn test_ignore_all_is_case_folded_and_spans_files() {
        let mut c = checker(&[Action::Ignore { all: true }]);
        c.add_file(source(Path::new("a.c"), &["Wrold", "wrold"]));
        assert!(!c.run().unwrap());
        c.add_file(source(Path::new("b.c"), &["WROLD"]));
        assert!(!c.run().unwrap());
        assert_eq!(c.frontend().prompted, ["Wrold"]);
        assert_eq!(c.ignored_words(), ["wrold"]);
    }

    #[test]
    fn test_replace_all_applies_to_later_files() {
        let mut c = checker(&[Action::Replace { all: true }]);
        c.frontend.replacements.push_back(Some("world".into()));
        c.add_file(source(Path::new("a.c"), &["wrold", "Wrold"]));
        assert!(!c.run().unwrap());
        assert_eq!(text(&c, 0), "// world world\n");

        c.add_file(source(Path::new("b.c"), &["helo", "wrold"]));
        assert_eq!(text(&c, 1), "// helo world\n");
    }

    #[test]
    fn test_empty_replacement_retries() {
        let mut c = checker(&[Action::Replace { all: false }, Action::Skip]);
        c.frontend.replacements.push_back(Some(String::new()));
        c.add_file(source(Path::new("a.c"), &["helo", "wrold"]));
        assert!(!c.run().unwrap());
        assert_eq!(c.frontend().prompted, ["helo", "helo"]);
        assert!(!c.is_changed());
    }

    #[test]
    fn test_undo_replacement_returns_to_the_word() {
        let mut c = checker(&[
            Action::SelectSuggestion(0),
            Action::Undo,
            Action::Ignore { all: false },
        ]);
        c.add_file(source(Path::new("a.c"), &["helo", "x-y"]));
        // "x-y" is asked once, the undo goes back to "helo", then "x-y" again
        // and the script runs out (Exit).
        assert!(c.run().unwrap());
        assert_eq!(c.frontend().prompted, ["helo", "x-y", "helo", "x-y"]);
        assert_eq!(text(&c, 0), "// helo x-y\n");
    }

    #[test]
    fn test_undo_replace_all() {
        let mut c = checker(&[Action::Replace { all: true }, Action::Undo]);
        c.frontend.replacements.push_back(Some("world".into()));
        c.add_file(source(Path::new("a.c"), &["wrold", "helo", "wrold"]));
        // undo is given at "helo"; afterwards the script runs out and the
        // session exits
        assert!(c.run().unwrap());
        assert_eq!(c.frontend().prompted, ["wrold", "helo", "wrold"]);
        assert_eq!(text(&c, 0), "// wrold helo wrold\n");
        c.add_file(source(Path::new("b.c"), &["wrold"]));
        assert_eq!(text(&c, 1), "// wrold\n");
    }

    #[test]
    fn test_undo_on_empty_stack_retries() {
        let mut c = checker(&[Action::Undo, Action::Ignore { all: false }]);
        c.add_file(source(Path::new("a.c"), &["helo"]));
        assert!(!c.run().unwrap());
        assert_eq!(c.frontend().prompted, ["helo", "helo"]);
    }

    #[test]
    fn test_skip_moves_to_next_file() {
        let mut c = checker(&[Action::Skip]);
        c.add_file(source(Path::new("a.c"), &["helo", "wrold"]));
        assert!(!c.run().unwrap());
        assert_eq!(c.frontend().prompted, ["helo"]);
    }

    #[test]
    fn test_abort_discards_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.c");
        fs::write(&path, "// helo wrold\n").unwrap();

        let mut c = checker(&[Action::SelectSuggestion(0), Action::Abort]);
        c.frontend.confirm = true;
        c.add_file(source(&path, &["helo", "wrold"]));
        assert!(c.run().unwrap());
        let report = c.finish(None).unwrap();
        assert!(report.written.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "// helo wrold\n");
    }

    #[test]
    fn test_abort_not_confirmed_retries() {
        let mut c = checker(&[
            Action::SelectSuggestion(0),
            Action::Abort,
            Action::Ignore { all: false },
        ]);
        c.add_file(source(Path::new("a.c"), &["helo", "wrold"]));
        assert!(!c.run().unwrap());
        assert_eq!(c.frontend().prompted, ["helo", "wrold", "wrold"]);
        assert!(c.is_changed());
    }

    #[test]
    fn test_interrupt_ends_session_without_writing() {
        let mut c = checker(&[]);
        c.add_file(source(Path::new("a.c"), &["helo"]));
        c.interrupt_handle().store(true, Ordering::SeqCst);
        assert!(c.run().unwrap());
        assert!(c.frontend().prompted.is_empty());
    }

    #[test]
    fn test_interrupt_between_prompts_discards_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.c");
        fs::write(&path, "// helo wrold\n").unwrap();

        let mut c = checker(&[Action::SelectSuggestion(0), Action::SelectSuggestion(0)]);
        let flag = Arc::new(AtomicBool::new(false));
        c.set_interrupt_handle(Arc::clone(&flag));
        c.frontend.interrupt = Some(flag);
        c.add_file(source(&path, &["helo", "wrold"]));

        assert!(c.run().unwrap());
        assert_eq!(c.frontend().prompted, ["helo"]);
        assert!(c.is_changed());
        let report = c.finish(Some(dir.path())).unwrap();
        assert!(report.written.is_empty());
        assert!(report.backup.is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), "// helo wrold\n");
    }

    #[test]
    fn test_original_lines_restore_changed_slices() {
        let mut ctx = FileContext::new(source(Path::new("a.c"), &["helo", "wrold"]));
        let index = ctx.file.words[1].index;
        ctx.change(index, "world");
        ctx.change(index, "word");
        assert!(ctx.is_changed(index));
        assert_eq!(ctx.original_lines()[0].text, "// helo wrold");
        ctx.remove_change(index);
        assert!(!ctx.has_changes());
        assert_eq!(ctx.file.text.to_plain_string(), "// helo wrold\n");
    }
}
