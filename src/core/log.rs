/// Each level is allowed to be dead code in case the code base happens to have no call sites at
/// that level at the moment.
#[derive(Debug, PartialEq, PartialOrd)]
pub enum LogLevel {
    #[allow(dead_code)]
    Error,
    #[allow(dead_code)]
    Warn,
    #[allow(dead_code)]
    Info,
    #[allow(dead_code)]
    Debug,
    #[allow(dead_code)]
    Trace,
}

static CURRENT_LOG_LEVEL: LogLevel = LogLevel::Info;

/// Accept a closure so the formatted string is only constructed when the current logging level
/// actually asks for it.
pub fn log<F: FnOnce() -> String>(level: LogLevel, message_fn: F) {
    if level <= CURRENT_LOG_LEVEL {
        let message = message_fn();
        println!("[{:?}] {}", level, message);
    }
}
