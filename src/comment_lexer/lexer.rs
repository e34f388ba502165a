//! Token stream over (possibly colour-highlighted) source text.
//!
//! The lexer drives the dialect automaton one char at a time and turns its
//! state changes into [`Token`]s.  Inside comments a second, much simpler
//! scanner splits letter runs out of the comment text so they can be spell
//! checked on their own.
//!
//! Invariants:
//! - concatenating the text of every `Code`, `CommentWord` and `Style` token,
//!   plus one `\n` per `Newline`, reproduces the input exactly; `Style` text
//!   is the raw escape bytes, so highlighted input round-trips as well
//! - once `Eof` has been returned every further call returns `Eof`

use std::collections::VecDeque;
use std::fmt;

use super::dfa::{Matcher, StateId};
use super::dialect::{Dialect, END_OF_INPUT, LexState};

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Code,
    /// A raw SGR escape sequence.
    Style,
    CommentBegin,
    CommentWord,
    CommentEnd,
    Newline,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Code => "Code",
            TokenKind::Style => "Style",
            TokenKind::CommentBegin => "CommentBegin",
            TokenKind::CommentWord => "CommentWord",
            TokenKind::CommentEnd => "CommentEnd",
            TokenKind::Newline => "Newline",
            TokenKind::Eof => "Eof",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Empty for marker kinds.
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn marker(kind: TokenKind) -> Self {
        Self::new(kind, String::new())
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind, self.text.replace('\x1b', "\\e"))
    }
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

fn is_word_char(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '-' | '\'' | '_')
}

/// Chars that make the comment scanner skip the following word
/// (`@param`, `\brief`).
fn is_directive_char(c: char) -> bool {
    matches!(c, '@' | '\\')
}

pub struct Lexer<'d> {
    chars: Vec<char>,
    /// First char not yet handed out in a token.
    start: usize,
    /// One past the last char read.  May point one past the input while the
    /// end-of-input sentinel is being processed.
    end: usize,
    dfa: Matcher<'d, LexState>,
    state: LexState,
    /// Comment or string state to resume once a colour escape inside it ends.
    saved_state: Option<StateId>,
    ignore_word: bool,
    word_len: usize,
    pending: VecDeque<Token>,
    finished: bool,
    peeked: Option<Token>,
}

impl<'d> Lexer<'d> {
    pub fn new(source: &str, dialect: &'d Dialect) -> Self {
        Self {
            chars: source.chars().collect(),
            start: 0,
            end: 0,
            dfa: dialect.matcher(),
            state: LexState::Code,
            saved_state: None,
            ignore_word: false,
            word_len: 0,
            pending: VecDeque::new(),
            finished: false,
            peeked: None,
        }
    }

    // ── public interface ──────────────────────────────────────────────────────

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token {
        match self.peeked.take() {
            Some(t) => t,
            None => self.pull(),
        }
    }

    /// Return (but do not consume) the next token.
    pub fn peek(&mut self) -> &Token {
        if self.peeked.is_none() {
            let t = self.pull();
            self.peeked = Some(t);
        }
        self.peeked
            .as_ref()
            .expect("peeked is always Some after the fill above")
    }

    /// Every token up to and including the first `Eof`.
    pub fn collect_all(&mut self) -> Vec<Token> {
        let mut out = Vec::new();
        loop {
            let t = self.next_token();
            let done = t.is_eof();
            out.push(t);
            if done {
                return out;
            }
        }
    }

    // ── internals ─────────────────────────────────────────────────────────────

    fn pull(&mut self) -> Token {
        loop {
            if let Some(t) = self.pending.pop_front() {
                return t;
            }
            self.refill();
        }
    }

    /// Read the next char, or the sentinel once the input is exhausted.
    fn read(&mut self) -> (char, bool) {
        let at_end = self.end >= self.chars.len();
        let c = if at_end {
            END_OF_INPUT
        } else {
            self.chars[self.end]
        };
        self.end += 1;
        (c, at_end)
    }

    /// Hand out the chars read so far as a token of `kind`.
    fn flush(&mut self, kind: TokenKind) {
        let stop = self.end.min(self.chars.len());
        if stop <= self.start {
            return;
        }
        let text: String = self.chars[self.start..stop].iter().collect();
        self.start = stop;
        self.pending.push_back(Token::new(kind, text));
    }

    fn mark(&mut self, kind: TokenKind) {
        self.pending.push_back(Token::marker(kind));
    }

    /// Skip `count` chars that are represented by a marker instead.
    fn drop_chars(&mut self, count: usize) {
        self.start += count;
        if self.end < self.start {
            self.end = self.start;
        }
    }

    /// Word scanner, run on every char read while inside a comment.
    fn process_in_comment(&mut self, c: char) {
        let in_word = self.word_len > 1;
        if is_directive_char(c) && !in_word {
            self.flush(TokenKind::Code);
            self.ignore_word = true;
        } else if is_word_char(c) {
            self.word_len += 1;
        } else if in_word {
            if self.ignore_word {
                self.ignore_word = false;
            } else {
                // `c` itself is not part of the word.
                let stop = self.end - 1;
                self.end = stop.saturating_sub(self.word_len).max(self.start);
                self.flush(TokenKind::Code);
                self.end = stop;
                self.flush(TokenKind::CommentWord);
                self.end = stop + 1;
            }
            self.word_len = 0;
        } else {
            self.word_len = 0;
        }
    }

    /// The comment just ended with a `token_len` char token.  If that token
    /// is made of word chars (`'''`) the scanner counted it into the word
    /// before it; cut the word off at the token start.
    fn split_word_before_end(&mut self, token_len: usize) {
        let token_start = self.end - token_len;
        let token_is_wordlike = self.chars[token_start..self.end]
            .iter()
            .all(|&c| is_word_char(c));
        let word_len = if token_is_wordlike {
            self.word_len.saturating_sub(token_len)
        } else {
            0
        };
        if word_len > 1 && !self.ignore_word {
            let stop = self.end;
            self.end = (token_start - word_len).max(self.start);
            self.flush(TokenKind::Code);
            self.end = token_start;
            self.flush(TokenKind::CommentWord);
            self.end = stop;
        }
        self.word_len = 0;
        self.ignore_word = false;
    }

    /// Run the automaton until at least one state change happened.  Only a
    /// state change can produce tokens, but not every change does, so the
    /// caller loops.
    fn refill(&mut self) {
        if self.finished {
            self.mark(TokenKind::Eof);
            return;
        }
        let last = self.dfa.current().info();
        let last_id = self.dfa.current().id();
        loop {
            let (c, at_end) = self.read();
            if self.state == LexState::Comment {
                self.process_in_comment(c);
            }
            // NUL inside the input is plain text; only the real end of the
            // input may reach the EOF state.
            let changed = if c == END_OF_INPUT && !at_end {
                self.dfa.reset();
                None
            } else {
                self.dfa.process(c)
            };
            let Some(token_len) = changed else {
                continue;
            };
            self.state = self.dfa.current().info();
            let newline = c == '\n';

            match (last, self.state) {
                (_, LexState::Eof) => {
                    self.end -= 1;
                    self.flush(TokenKind::Code);
                    self.finished = true;
                    self.mark(TokenKind::Eof);
                }
                (LexState::Code, LexState::Comment) => {
                    self.end -= token_len;
                    self.flush(TokenKind::Code);
                    self.mark(TokenKind::CommentBegin);
                    self.end += token_len;
                    // The begin token itself may have looked like a word.
                    self.word_len = 0;
                    self.ignore_word = false;
                }
                (LexState::Code, LexState::Escape) => {
                    self.end -= token_len;
                    self.flush(TokenKind::Code);
                }
                (LexState::Comment | LexState::String, LexState::Escape) => {
                    self.end -= token_len;
                    self.saved_state = Some(last_id);
                    self.flush(TokenKind::Code);
                }
                (LexState::Comment, LexState::Code) => {
                    if newline {
                        self.end -= 1;
                    } else {
                        self.split_word_before_end(token_len);
                    }
                    self.flush(TokenKind::Code);
                    self.mark(TokenKind::CommentEnd);
                    if newline {
                        self.drop_chars(1);
                        self.mark(TokenKind::Newline);
                    }
                }
                (LexState::Escape, LexState::Code) => {
                    self.flush(TokenKind::Style);
                    // Escapes always formally return to code; put the run
                    // back into the comment or string it interrupted.
                    if let Some(id) = self.saved_state.take() {
                        self.dfa.force_state(id);
                        self.state = self.dfa.current().info();
                    }
                }
                (LexState::Code, LexState::Code)
                | (LexState::Comment, LexState::Comment)
                | (LexState::String, LexState::String)
                    if newline =>
                {
                    self.end -= 1;
                    self.flush(TokenKind::Code);
                    self.drop_chars(1);
                    self.mark(TokenKind::Newline);
                }
                // Strings are opaque code; entering or leaving them and
                // escape sequences inside them produce nothing.
                _ => {}
            }
            return;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
