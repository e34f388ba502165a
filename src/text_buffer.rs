//! Rendered view of a source file: lines of styled text slices.
//!
//! The parser appends slices in token order; words are later addressed by
//! their [`SliceIndex`] for display and replacement.

use std::fmt;

/// `(line, slice)` coordinate; orders top to bottom, left to right.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SliceIndex {
    pub line: usize,
    pub slice: usize,
}

impl SliceIndex {
    pub fn new(line: usize, slice: usize) -> Self {
        Self { line, slice }
    }
}

impl fmt::Display for SliceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.slice)
    }
}

const SGR_RESET: &str = "\x1b[0m";
const SGR_DIM: &str = "\x1b[2m";

/// One or more raw SGR sequences, applied in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style(String);

impl Style {
    pub fn new(sgr: impl Into<String>) -> Self {
        Self(sgr.into())
    }

    /// Terminal defaults.
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn dimmed(mut self) -> Self {
        self.0.push_str(SGR_DIM);
        self
    }

    pub fn as_sgr(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSlice {
    pub text: String,
    pub style: Style,
}

#[derive(Debug, Clone)]
pub struct TextBuffer {
    lines: Vec<Vec<TextSlice>>,
    style: Style,
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self {
            lines: vec![Vec::new()],
            style: Style::plain(),
        }
    }
}

impl TextBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    // ── building ──────────────────────────────────────────────────────────────

    /// Style used for every following slice.
    pub fn set_style(&mut self, style: Style) {
        self.style = style;
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn add_slice(&mut self, text: &str) -> SliceIndex {
        let line = self.lines.len() - 1;
        let slices = &mut self.lines[line];
        slices.push(TextSlice {
            text: text.to_string(),
            style: self.style.clone(),
        });
        SliceIndex::new(line, slices.len() - 1)
    }

    pub fn newline(&mut self) {
        self.lines.push(Vec::new());
    }

    /// Index the next added slice will get.
    pub fn next_index(&self) -> SliceIndex {
        let line = self.lines.len() - 1;
        SliceIndex::new(line, self.lines[line].len())
    }

    // ── access ────────────────────────────────────────────────────────────────

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line(&self, line: usize) -> &[TextSlice] {
        self.lines.get(line).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn slice(&self, index: SliceIndex) -> Option<&TextSlice> {
        self.lines.get(index.line)?.get(index.slice)
    }

    /// Returns `false` if `index` does not exist.
    pub fn set_slice_text(&mut self, index: SliceIndex, text: &str) -> bool {
        match self
            .lines
            .get_mut(index.line)
            .and_then(|l| l.get_mut(index.slice))
        {
            Some(slice) => {
                slice.text = text.to_string();
                true
            }
            None => false,
        }
    }

    pub fn line_text(&self, line: usize) -> String {
        self.line(line).iter().map(|s| s.text.as_str()).collect()
    }

    /// Text of `line` restricted to slices in `[from, to)`.
    pub fn line_text_between(&self, line: usize, from: usize, to: usize) -> String {
        self.line(line)
            .iter()
            .enumerate()
            .filter(|(i, _)| *i >= from && *i < to)
            .map(|(_, s)| s.text.as_str())
            .collect()
    }

    /// 1-based char column where the slice starts.
    pub fn column_of(&self, index: SliceIndex) -> usize {
        self.line(index.line)
            .iter()
            .take(index.slice)
            .map(|s| s.text.chars().count())
            .sum::<usize>()
            + 1
    }

    /// The file contents as they should be written back to disk.
    pub fn to_plain_string(&self) -> String {
        (0..self.lines.len())
            .map(|l| self.line_text(l))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// ANSI rendering of one line with tabs expanded.  The slice at
    /// `highlight` (if it is on this line) is drawn in `highlight_style`.
    pub fn render_line(
        &self,
        line: usize,
        tab_size: usize,
        highlight: Option<(SliceIndex, &Style)>,
    ) -> String {
        let mut out = String::new();
        let mut column = 0;
        for (i, slice) in self.line(line).iter().enumerate() {
            out.push_str(SGR_RESET);
            match highlight {
                Some((index, style)) if index == SliceIndex::new(line, i) => {
                    out.push_str(style.as_sgr())
                }
                _ => out.push_str(slice.style.as_sgr()),
            }
            for c in slice.text.chars() {
                match c {
                    '\t' => {
                        let width = tab_size.max(1);
                        let pad = width - column % width;
                        out.extend(std::iter::repeat_n(' ', pad));
                        column += pad;
                    }
                    '\r' => {}
                    _ => {
                        out.push(c);
                        column += 1;
                    }
                }
            }
        }
        out.push_str(SGR_RESET);
        out
    }
}
