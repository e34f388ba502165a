//! Comment dialect descriptions and the builtin set.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::comment_lexer::dfa::MAX_TOKEN_LEN;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StyleError {
    #[error("token longer than 8 bytes: {0:?}")]
    TokenTooLong(String),
    #[error("empty token in {0}")]
    EmptyToken(&'static str),
    #[error("block-begin has {begin} entries but block-end has {end}")]
    BlockMismatch { begin: usize, end: usize },
}

/// A string literal: its delimiters and the escape that does not end it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StringStyle {
    pub begin: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escape: Option<String>,
}

impl StringStyle {
    pub fn new(begin: &str, end: &str, escape: Option<&str>) -> Self {
        Self {
            begin: begin.to_string(),
            end: end.to_string(),
            escape: escape.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CommentStyle {
    pub line: Vec<String>,
    pub block_begin: Vec<String>,
    pub block_end: Vec<String>,
    /// Applies to every block pair.
    pub block_nesting: bool,
    pub strings: Vec<StringStyle>,
}

fn check_tokens<'a>(
    field: &'static str,
    tokens: impl IntoIterator<Item = &'a String>,
) -> Result<(), StyleError> {
    for token in tokens {
        if token.is_empty() {
            return Err(StyleError::EmptyToken(field));
        }
        if token.len() > MAX_TOKEN_LEN {
            return Err(StyleError::TokenTooLong(token.clone()));
        }
    }
    Ok(())
}

impl CommentStyle {
    /// Reject styles the automaton cannot represent.
    pub fn validate(&self) -> Result<(), StyleError> {
        if self.block_begin.len() != self.block_end.len() {
            return Err(StyleError::BlockMismatch {
                begin: self.block_begin.len(),
                end: self.block_end.len(),
            });
        }
        check_tokens("line", &self.line)?;
        check_tokens("block-begin", &self.block_begin)?;
        check_tokens("block-end", &self.block_end)?;
        check_tokens("string begin", self.strings.iter().map(|s| &s.begin))?;
        check_tokens("string end", self.strings.iter().map(|s| &s.end))?;
        // An empty escape means "no escape".
        check_tokens(
            "string escape",
            self.strings
                .iter()
                .filter_map(|s| s.escape.as_ref())
                .filter(|e| !e.is_empty()),
        )?;
        Ok(())
    }
}

fn quoted(tokens: &[String]) -> String {
    tokens
        .iter()
        .map(|t| format!("{t:?}"))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for CommentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  line:          [{}]", quoted(&self.line))?;
        writeln!(f, "  block-begin:   [{}]", quoted(&self.block_begin))?;
        writeln!(f, "  block-end:     [{}]", quoted(&self.block_end))?;
        writeln!(f, "  block-nesting: {}", self.block_nesting)?;
        write!(f, "  strings:       [")?;
        for (i, s) in self.strings.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?}…{:?}", s.begin, s.end)?;
            if let Some(escape) = &s.escape {
                write!(f, " (escape {escape:?})")?;
            }
        }
        write!(f, "]")
    }
}

// ── builtin styles ────────────────────────────────────────────────────────────

pub struct BuiltinStyle {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    pub style: CommentStyle,
}

fn tokens(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// No special support for character literals.
fn default_strings() -> Vec<StringStyle> {
    vec![
        StringStyle::new("\"", "\"", Some("\\\"")),
        StringStyle::new("'", "'", Some("\\'")),
    ]
}

/// Styles available without any configuration.
pub fn builtin_styles() -> Vec<BuiltinStyle> {
    vec![
        BuiltinStyle {
            name: "builtin-c",
            extensions: &[
                "c", "cc", "cpp", "cxx", "h", "hh", "hpp", "hxx", "go", "js", "cs", "java",
            ],
            style: CommentStyle {
                line: tokens(&["//"]),
                block_begin: tokens(&["/*"]),
                block_end: tokens(&["*/"]),
                block_nesting: false,
                strings: default_strings(),
            },
        },
        BuiltinStyle {
            name: "builtin-rust",
            extensions: &["rs"],
            style: CommentStyle {
                line: tokens(&["//"]),
                block_begin: tokens(&["/*"]),
                block_end: tokens(&["*/"]),
                block_nesting: true,
                // `'` also starts lifetimes, so char literals are not strings.
                // `'"'` must come first, its end overlaps the plain string.
                strings: vec![
                    StringStyle::new("'\"", "'", None),
                    StringStyle::new("\"", "\"", Some("\\\"")),
                    StringStyle::new("r#\"", "\"#", None),
                ],
            },
        },
        BuiltinStyle {
            name: "builtin-python",
            extensions: &["py"],
            style: CommentStyle {
                line: tokens(&["#"]),
                block_begin: tokens(&["\"\"\"", "'''"]),
                block_end: tokens(&["\"\"\"", "'''"]),
                block_nesting: false,
                // Plain strings would always win over doc strings.
                strings: Vec::new(),
            },
        },
        BuiltinStyle {
            name: "builtin-#",
            extensions: &["sh", "bashrc", "toml", "ini", "cfg", "rb"],
            style: CommentStyle {
                line: tokens(&["#"]),
                strings: default_strings(),
                ..CommentStyle::default()
            },
        },
    ]
}
