//! Performance logging macros
//!
//! Timing of transcription calls and other slow paths is logged in debug
//! builds only; in release builds these macros expand to nothing.

/// Performance debug logging - only active in debug builds
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! perf_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

/// Performance debug logging - no-op in release builds
#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! perf_debug {
    ($($arg:tt)*) => {};
}

/// Performance trace logging - only active in debug builds
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! perf_trace {
    ($($arg:tt)*) => { log::trace!($($arg)*) };
}

/// Performance trace logging - no-op in release builds
#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! perf_trace {
    ($($arg:tt)*) => {};
}

