mod log;

#[allow(unused_imports)]
pub use log::{log, LogLevel};
