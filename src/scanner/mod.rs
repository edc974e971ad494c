mod block;
#[allow(clippy::module_inception)]
mod scanner;

pub use block::{Line, RawQuoteBlock, Terminator};
pub use scanner::{scan, ScanProgress, Scanner};
