use crate::domain::Position;

/// How a captured line ended in the original source. `None` can only occur for a truncated final
/// line while a scan is still awaiting more input; a completed block never contains one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    Lf,
    CrLf,
    None,
}

/// One line captured verbatim from the inside of a block. The terminator bytes themselves are not
/// part of `text`. Immutable once captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub(crate) text: String,
    pub(crate) terminator: Terminator,
}

impl Line {
    pub(crate) fn new(text: String, terminator: Terminator) -> Self {
        Self { text, terminator }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn terminator(&self) -> Terminator {
        self.terminator
    }

    /// Zero-length lines are exempt from indentation stripping.
    pub fn is_blank(&self) -> bool {
        self.text.is_empty()
    }
}

/// The raw capture of one multi-line literal: everything between a matched pair of quote markers,
/// before any normalization. Produced by the scanner, consumed exactly once by the normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawQuoteBlock {
    pub(crate) quote_char: char,
    pub(crate) quote_len: usize,
    pub(crate) open_trailing: String,
    pub(crate) content_lines: Vec<Line>,
    pub(crate) close_indent: String,
    pub(crate) start: Position,
}

impl RawQuoteBlock {
    /// The quote character this block is delimited by, either `'` or `"`.
    pub fn quote_char(&self) -> char {
        self.quote_char
    }

    /// The length of the quote runs delimiting this block. Always at least 3, and fixed for the
    /// lifetime of the block: the closing run matched this exact count.
    pub fn quote_len(&self) -> usize {
        self.quote_len
    }

    /// The characters between the opening marker and its line's newline. Whitespace-only, or the
    /// scan would have failed.
    pub fn open_trailing(&self) -> &str {
        &self.open_trailing
    }

    /// The lines strictly between the opening and closing marker lines.
    pub fn content_lines(&self) -> &[Line] {
        &self.content_lines
    }

    /// The whitespace preceding the closing marker on its line.
    pub fn close_indent(&self) -> &str {
        &self.close_indent
    }

    /// The source position of the first character of the opening marker.
    pub fn start(&self) -> Position {
        self.start
    }
}
