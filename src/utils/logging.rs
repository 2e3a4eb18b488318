//! Logging macros gated on a module-level `ENABLE_LOGS` flag.
//!
//! Chatty modules (the run ticker fires every second) declare
//! `const ENABLE_LOGS: bool = ...;` and use these instead of the `log`
//! macros directly, so their output can be silenced in one place without
//! touching `RUST_LOG` for the rest of the crate.

/// Info-level log, emitted only when the caller's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Debug-level log, emitted only when the caller's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}
