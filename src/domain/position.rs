use std::fmt::{Display, Error, Formatter};

/// A 1-based line and column location in the source being scanned. Columns count characters, not
/// bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// The position of the first character of a source.
    pub fn start() -> Self {
        Self::new(1, 1)
    }

    pub(crate) fn advance(&mut self) {
        self.col += 1;
    }

    pub(crate) fn newline(&mut self) {
        self.line += 1;
        self.col = 1;
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "line {}, column {}", self.line, self.col)
    }
}
