use std::fmt::{Display, Error, Formatter};

use crate::{
    core::{log, LogLevel},
    domain::Position,
    scanner::RawQuoteBlock,
};

/// A non-fatal diagnostic: under the grammar that predates this literal form, a run of four or
/// more quote characters lexed as a concatenation of empty string literals, so this block's
/// source text previously carried different semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyAmbiguity {
    position: Position,
    quote_char: char,
    quote_len: usize,
}

impl LegacyAmbiguity {
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn quote_len(&self) -> usize {
        self.quote_len
    }
}

impl Display for LegacyAmbiguity {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(
            f,
            "{}: a marker of {} {:?} characters would previously have parsed as empty-string concatenation",
            self.position, self.quote_len, self.quote_char
        )
    }
}

/// Inspect a captured block for legacy-syntax ambiguity.
///
/// Read-only: the block is untouched and the normalized value is never affected; the caller
/// decides whether and where to surface the diagnostic, and compilation proceeds either way. A
/// marker of exactly three quote characters could not form a complete expression under the prior
/// grammar, so only longer markers are ambiguous.
pub fn check_legacy_ambiguity(block: &RawQuoteBlock) -> Option<LegacyAmbiguity> {
    if block.quote_len() < 4 {
        return None;
    }

    let warning = LegacyAmbiguity {
        position: block.start(),
        quote_char: block.quote_char(),
        quote_len: block.quote_len(),
    };
    log(LogLevel::Warn, || format!("{warning}"));

    Some(warning)
}
