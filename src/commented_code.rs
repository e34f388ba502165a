//! Heuristic detection of commented-out code.
//!
//! Each physical comment is scored line by line from how its lines end.
//! Lines ending like statements (`;`, `{`, `}`) push the score up, lines
//! ending like prose (`.`) push it down.  A comment scoring at least
//! `0.8 × lines` (or `1.0` for a single line) is treated as code and its
//! words are not reported.  This is best effort: prose ending in a brace or
//! code without terminators will be misjudged.

use crate::style::CommentStyle;
use crate::text_buffer::{SliceIndex, TextBuffer};

/// `[begin, end)` span of one comment in the rendered buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRange {
    pub begin: SliceIndex,
    pub end: SliceIndex,
}

impl CommentRange {
    pub fn contains(&self, index: SliceIndex) -> bool {
        self.begin <= index && index < self.end
    }

    pub fn line_count(&self) -> usize {
        self.end.line - self.begin.line + 1
    }
}

const STATEMENT_END: f64 = 1.0;
const CALL_END: f64 = 0.5;
const PROSE_END: f64 = -1.0;
const EMPTY_LINE: f64 = 0.5;
const NESTED_LINE_COMMENT: f64 = 3.0;

fn line_end_score(line: &str) -> f64 {
    match line.chars().last() {
        None => EMPTY_LINE,
        Some(';' | '{' | '}') => STATEMENT_END,
        Some(')' | ',') => CALL_END,
        Some('.') => PROSE_END,
        Some(_) => 0.0,
    }
}

fn strip_any<'a>(line: &'a str, tokens: &[String]) -> Option<&'a str> {
    tokens.iter().find_map(|t| line.strip_prefix(t.as_str()))
}

fn strip_any_suffix<'a>(line: &'a str, tokens: &[String]) -> Option<&'a str> {
    tokens.iter().find_map(|t| line.strip_suffix(t.as_str()))
}

/// Confidence that `range` holds code rather than prose.
pub fn score(tb: &TextBuffer, range: &CommentRange, style: &CommentStyle) -> f64 {
    let mut confidence = 0.0;
    let mut is_block = false;
    let last_line = range.end.line;

    for line in range.begin.line..=last_line {
        let from = if line == range.begin.line {
            range.begin.slice
        } else {
            0
        };
        let to = if line == last_line {
            range.end.slice
        } else {
            usize::MAX
        };
        let raw = tb.line_text_between(line, from, to);
        let mut text = raw.trim();

        if line == range.begin.line {
            if let Some(rest) = strip_any(text, &style.block_begin) {
                is_block = true;
                text = rest.trim();
            } else if let Some(rest) = strip_any(text, &style.line) {
                text = rest.trim();
            }
        }
        if is_block && line == last_line {
            if let Some(rest) = strip_any_suffix(text, &style.block_end) {
                text = rest.trim();
            }
        }
        if is_block && line != range.begin.line {
            if let Some(rest) = strip_any(text, &style.line) {
                confidence += NESTED_LINE_COMMENT;
                text = rest.trim();
            } else if let Some(rest) = text.strip_prefix('*') {
                text = rest.trim();
            }
        }

        confidence += line_end_score(text);
    }
    confidence
}

pub fn looks_like_code(tb: &TextBuffer, range: &CommentRange, style: &CommentStyle) -> bool {
    let lines = range.line_count();
    let target = if lines == 1 { 1.0 } else { 0.8 * lines as f64 };
    score(tb, range, style) >= target
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_style() -> CommentStyle {
        CommentStyle {
            line: vec!["//".into()],
            block_begin: vec!["/*".into()],
            block_end: vec!["*/".into()],
            ..CommentStyle::default()
        }
    }

    /// Build a buffer where `text` is one comment, one slice per line.
    fn comment(text: &str) -> (TextBuffer, CommentRange) {
        let mut tb = TextBuffer::new();
        let begin = tb.next_index();
        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                tb.newline();
            }
            tb.add_slice(line);
        }
        let end = tb.next_index();
        (tb, CommentRange { begin, end })
    }

    #[test]
    fn test_range_contains() {
        let range = CommentRange {
            begin: SliceIndex::new(1, 2),
            end: SliceIndex::new(3, 1),
        };
        assert!(range.contains(SliceIndex::new(1, 2)));
        assert!(range.contains(SliceIndex::new(2, 9)));
        assert!(range.contains(SliceIndex::new(3, 0)));
        assert!(!range.contains(SliceIndex::new(3, 1)));
        assert!(!range.contains(SliceIndex::new(1, 1)));
        assert_eq!(range.line_count(), 3);
    }

    #[test]
    fn test_block_of_statements_is_code() {
        let (tb, range) = comment(
            "/* int a = 1;\n   int b = 2;\n   int c = 3;\n   int d = 4;\n   int e = 5; */",
        );
        assert_eq!(score(&tb, &range, &c_style()), 5.0);
        assert!(looks_like_code(&tb, &range, &c_style()));
    }

    #[test]
    fn test_prose_is_not_code() {
        let (tb, range) = comment("/* This function does things.\n * It is very nice.\n */");
        assert!(!looks_like_code(&tb, &range, &c_style()));
    }

    #[test]
    fn test_single_line() {
        let (tb, range) = comment("// foo(bar);");
        assert!(looks_like_code(&tb, &range, &c_style()));
        let (tb, range) = comment("// Explain the thing");
        assert!(!looks_like_code(&tb, &range, &c_style()));
    }

    #[test]
    fn test_nested_line_comment_is_suspicious() {
        let (tb, range) = comment("/*\n// old_call()\nnote\n*/");
        // empty + nested + nothing + empty
        assert_eq!(score(&tb, &range, &c_style()), 0.5 + 3.5 + 0.0 + 0.5);
        assert!(looks_like_code(&tb, &range, &c_style()));
    }
}
