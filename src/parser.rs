//! Comment-word extraction: lexer tokens → [`SourceFile`].
//!
//! The extractor walks the token stream with one token of lookahead.  Code is
//! copied into the render buffer as is; every comment word is split into
//! punctuation and core, and the core is recorded when the [`WordFilter`]
//! flags it.  Style tokens from a highlighter set the buffer style; with
//! dimming on, code outside comments is dimmed, except for a style that
//! directly precedes a comment (the comment's own colour).

use std::path::Path;

use crate::comment_lexer::{Dialect, Lexer, TokenKind};
use crate::commented_code::{CommentRange, looks_like_code};
use crate::source_file::{SourceFile, Word};
use crate::style::CommentStyle;
use crate::text_buffer::{SliceIndex, Style, TextBuffer};
use crate::words::{WordFilter, trim_symbols};

/// Per-file parse settings.
pub struct ParseOptions<'a> {
    pub style: &'a CommentStyle,
    pub dialect: &'a Dialect,
    pub filter: WordFilter<'a>,
    pub dim_code: bool,
    pub filter_commented_code: bool,
    /// Overrides any highlighter colour for comment text.
    pub comment_color: Option<Style>,
}

/// Mutable state of one parse.
struct Extractor<'o, 'a> {
    opts: &'o ParseOptions<'a>,
    tb: TextBuffer,
    words: Vec<Word>,
    ranges: Vec<CommentRange>,
    open_range: Option<SliceIndex>,
    /// Last style seen in the input, before dimming.
    raw_style: Style,
}

impl<'o, 'a> Extractor<'o, 'a> {
    fn new(opts: &'o ParseOptions<'a>) -> Self {
        let mut ex = Self {
            opts,
            tb: TextBuffer::new(),
            words: Vec::new(),
            ranges: Vec::new(),
            open_range: None,
            raw_style: Style::plain(),
        };
        ex.apply_code_style(Style::plain(), false);
        ex
    }

    fn in_comment(&self) -> bool {
        self.open_range.is_some()
    }

    fn apply_code_style(&mut self, raw: Style, before_comment: bool) {
        let style = if self.opts.dim_code && !before_comment {
            raw.clone().dimmed()
        } else {
            raw.clone()
        };
        self.raw_style = raw;
        self.tb.set_style(style);
    }

    fn add_code(&mut self, text: &str) {
        if !text.is_empty() {
            self.tb.add_slice(text);
        }
    }

    fn add_word(&mut self, text: &str) {
        let (leading, core, trailing) = trim_symbols(text);
        self.add_code(leading);
        if !core.is_empty() {
            let index = self.tb.add_slice(core);
            if self.opts.filter.is_candidate(core) {
                self.words.push(Word {
                    original: core.to_string(),
                    index,
                });
            }
        }
        self.add_code(trailing);
    }

    fn style(&mut self, text: &str, before_comment: bool) {
        let raw = Style::new(text);
        if !self.in_comment() {
            self.apply_code_style(raw, before_comment);
            return;
        }
        if self.opts.comment_color.is_none() {
            self.tb.set_style(raw.clone());
        }
        self.raw_style = raw;
    }

    fn begin_comment(&mut self) {
        self.open_range = Some(self.tb.next_index());
        let style = self
            .opts
            .comment_color
            .clone()
            .unwrap_or_else(|| self.raw_style.clone());
        self.tb.set_style(style);
    }

    fn end_comment(&mut self) {
        if let Some(begin) = self.open_range.take() {
            self.ranges.push(CommentRange {
                begin,
                end: self.tb.next_index(),
            });
        }
        self.apply_code_style(self.raw_style.clone(), false);
    }

    fn run(mut self, path: &Path, source: &str) -> SourceFile {
        let mut lexer = Lexer::new(source, self.opts.dialect);
        loop {
            let token = lexer.next_token();
            match token.kind {
                TokenKind::Code => self.add_code(&token.text),
                TokenKind::CommentWord => self.add_word(&token.text),
                TokenKind::Style => {
                    let before_comment = lexer.peek().kind == TokenKind::CommentBegin;
                    self.style(&token.text, before_comment);
                }
                TokenKind::CommentBegin => self.begin_comment(),
                TokenKind::CommentEnd => self.end_comment(),
                TokenKind::Newline => self.tb.newline(),
                TokenKind::Eof => {
                    if self.in_comment() {
                        self.end_comment();
                    }
                    break;
                }
            }
        }

        if self.opts.filter_commented_code {
            for range in &self.ranges {
                if looks_like_code(&self.tb, range, self.opts.style) {
                    self.words.retain(|w| !range.contains(w.index));
                }
            }
        }
        SourceFile::new(path, self.tb, self.words)
    }
}

/// Parse `source` (possibly colour-highlighted) into a [`SourceFile`].
pub fn parse(path: &Path, source: &str, opts: &ParseOptions<'_>) -> SourceFile {
    Extractor::new(opts).run(path, source)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
