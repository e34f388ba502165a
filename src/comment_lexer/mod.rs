//! Comment-aware lexer.
//!
//! Splits source text (plain or already colour-highlighted) into code,
//! comment words and style escapes, for any configured comment dialect.
//!
//! # Usage
//! ```
//! use spellcheck_comments::comment_lexer::{compile, Lexer, TokenKind};
//! use spellcheck_comments::style::CommentStyle;
//!
//! let style = CommentStyle {
//!     line: vec!["//".into()],
//!     ..CommentStyle::default()
//! };
//! let dialect = compile(&style).unwrap();
//! let mut lexer = Lexer::new("x = 1; // one", &dialect);
//! let words: Vec<_> = lexer
//!     .collect_all()
//!     .into_iter()
//!     .filter(|t| t.kind == TokenKind::CommentWord)
//!     .map(|t| t.text)
//!     .collect();
//! assert_eq!(words, ["one"]);
//! ```

pub mod dfa;
pub mod dialect;
pub mod lexer;

pub use dialect::{Dialect, LexState, compile};
pub use lexer::{Lexer, Token, TokenKind};
