use thiserror::Error;

use crate::domain::Position;

/// Everything that can go wrong while capturing a block. Each variant carries the position of the
/// offending character, or of the point where the input ran out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    #[error("{0}: non-whitespace character after the opening quote marker")]
    NonWhitespaceAfterOpenMarker(Position),

    /// In a batch context this is a terminal syntax error. Interactive callers never see it from
    /// `Scanner::add_line`, which reports `ScanProgress::NeedMoreInput` instead so they can resume
    /// with further input.
    #[error("{0}: block was never terminated by a matching quote marker")]
    UnterminatedBlock(Position),
}

/// Everything that can go wrong while normalizing a captured block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormError {
    /// `line_index` is the zero-based position of the offending line within the block's content
    /// lines; `position` points at the first character that diverges from the closing indentation.
    #[error("{position}: content line {line_index} does not begin with the closing line's indentation")]
    IndentationMismatch { line_index: usize, position: Position },
}
