mod compat;
mod core;
mod domain;
mod errors;
mod normalizer;
#[cfg(feature = "repl")]
mod repl;
mod scanner;

pub use compat::{check_legacy_ambiguity, LegacyAmbiguity};
pub use domain::Position;
pub use errors::{NormError, ScanError};
pub use normalizer::{normalize, NormalizedString};
#[cfg(feature = "repl")]
pub use repl::Repl;
pub use scanner::{scan, Line, RawQuoteBlock, ScanProgress, Scanner, Terminator};
