//! Compile a [`CommentStyle`] into the automaton the lexer runs on.

use super::dfa::Automaton;
use crate::style::{CommentStyle, StyleError};

/// Sentinel fed once after the last input character.
pub const END_OF_INPUT: char = '\0';

/// Introduces a colour escape sequence in highlighter output.
pub const ESCAPE_BEGIN: &str = "\x1b";

/// Only SGR sequences are passed through, and those always end in `m`.
pub const ESCAPE_END: &str = "m";

/// What a state means to the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexState {
    Code,
    Escape,
    Comment,
    String,
    Eof,
}

/// A compiled dialect, ready to be shared by any number of lexers.
pub type Dialect = Automaton<LexState>;

/// Build the automaton for `style`.
///
/// The style is validated first so a bad token can never silently turn into
/// a missing transition.
pub fn compile(style: &CommentStyle) -> Result<Dialect, StyleError> {
    style.validate()?;

    let eof_sentinel = END_OF_INPUT.to_string();
    let mut dfa = Automaton::new();

    let code = dfa.add_state(LexState::Code);
    let escape = dfa.add_state(LexState::Escape);
    let eof = dfa.add_state(LexState::Eof);

    {
        let s = dfa.state_mut(code);
        s.add_transition("\n", code);
        s.add_transition(ESCAPE_BEGIN, escape);
        s.add_transition(&eof_sentinel, eof);
    }
    {
        let s = dfa.state_mut(escape);
        s.add_transition(ESCAPE_END, code);
        s.add_transition(&eof_sentinel, eof);
    }

    // The lexer only cares whether it is inside *a* comment, so every line
    // comment spelling shares one state.
    if !style.line.is_empty() {
        let line = dfa.add_state(LexState::Comment);
        for token in &style.line {
            dfa.state_mut(code).add_transition(token, line);
        }
        let s = dfa.state_mut(line);
        s.add_transition("\n", code);
        s.add_transition(ESCAPE_BEGIN, escape);
        s.add_transition(&eof_sentinel, eof);
    }

    // A block comment must close with the partner of the token that opened
    // it (`"""` vs `'''`), so each pair gets a state of its own.
    for (begin, end) in style.block_begin.iter().zip(&style.block_end) {
        let block = dfa.add_state(LexState::Comment);
        dfa.state_mut(code).add_transition(begin, block);
        let s = dfa.state_mut(block);
        s.add_transition(end, code);
        s.add_transition(ESCAPE_BEGIN, escape);
        s.add_transition("\n", block);
        s.add_transition(&eof_sentinel, eof);
        if style.block_nesting {
            s.make_recursive(begin, end);
        }
    }

    for string in &style.strings {
        let state = dfa.add_state(LexState::String);
        dfa.state_mut(code).add_transition(&string.begin, state);
        let s = dfa.state_mut(state);
        // Registered before the terminator so `\"` beats `"`.
        if let Some(escape_token) = string.escape.as_deref().filter(|e| !e.is_empty()) {
            s.add_transition(escape_token, state);
        }
        s.add_transition(&string.end, code);
        s.add_transition("\n", state);
        s.add_transition(ESCAPE_BEGIN, escape);
        s.add_transition(&eof_sentinel, eof);
    }

    Ok(dfa)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::StringStyle;

    fn c_style() -> CommentStyle {
        CommentStyle {
            line: vec!["//".into()],
            block_begin: vec!["/*".into()],
            block_end: vec!["*/".into()],
            block_nesting: false,
            strings: vec![StringStyle::new("\"", "\"", Some("\\\""))],
        }
    }

    fn run(dialect: &Dialect, input: &str) -> Vec<LexState> {
        let mut m = dialect.matcher();
        input
            .chars()
            .filter_map(|c| m.process(c).map(|_| m.current().info()))
            .collect()
    }

    #[test]
    fn test_state_layout() {
        let dialect = compile(&c_style()).unwrap();
        // code, escape, eof, line, one block, one string
        assert_eq!(dialect.len(), 6);
        assert_eq!(dialect.matcher().current().info(), LexState::Code);
    }

    #[test]
    fn test_line_comment_round_trip() {
        let dialect = compile(&c_style()).unwrap();
        assert_eq!(
            run(&dialect, "x // y\nz"),
            vec![LexState::Comment, LexState::Code]
        );
    }

    #[test]
    fn test_comment_token_inside_string_is_ignored() {
        let dialect = compile(&c_style()).unwrap();
        assert_eq!(
            run(&dialect, "\"//\\\"\""),
            vec![LexState::String, LexState::String, LexState::Code]
        );
    }

    #[test]
    fn test_block_pairs_close_with_their_partner() {
        let style = CommentStyle {
            line: vec!["#".into()],
            block_begin: vec!["\"\"\"".into(), "'''".into()],
            block_end: vec!["\"\"\"".into(), "'''".into()],
            block_nesting: false,
            strings: Vec::new(),
        };
        let dialect = compile(&style).unwrap();
        // `'''` inside a `"""` block does not close it.
        assert_eq!(
            run(&dialect, "\"\"\" a ''' b \"\"\""),
            vec![LexState::Comment, LexState::Code]
        );
    }

    #[test]
    fn test_escape_from_any_state() {
        let dialect = compile(&c_style()).unwrap();
        assert_eq!(
            run(&dialect, "\x1b[1m// \x1b[0m"),
            vec![
                LexState::Escape,
                LexState::Code,
                LexState::Comment,
                LexState::Escape,
                LexState::Code
            ]
        );
    }

    #[test]
    fn test_end_of_input_from_comment() {
        let dialect = compile(&c_style()).unwrap();
        assert_eq!(
            run(&dialect, "/* open\0"),
            vec![LexState::Comment, LexState::Eof]
        );
    }

    #[test]
    fn test_invalid_style_is_rejected() {
        let mut style = c_style();
        style.block_end.clear();
        assert!(compile(&style).is_err());
    }
}
