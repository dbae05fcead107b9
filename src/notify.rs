//! Notification level and progress/diagnostic output.
//!
//! A crate-level atomic holds the current verbosity; the [`notify!`] macro
//! writes to stderr when its level is at or below the current setting.
//! 0 = silent; 1 = errors only; 2 = results + progress (default); 3 = verbose.

use std::sync::atomic::{AtomicI32, Ordering};

/// Global notification level. Shared by the library and the CLI binaries.
pub static NOTIFY_LEVEL: AtomicI32 = AtomicI32::new(2);

/// Returns the current notification level.
#[inline]
pub fn notification_level() -> i32 {
    NOTIFY_LEVEL.load(Ordering::Relaxed)
}

/// Sets the notification level; returns the previous value.
pub fn set_notification_level(level: i32) -> i32 {
    NOTIFY_LEVEL.swap(level, Ordering::Relaxed)
}

/// Write a formatted message to stderr when the current notification level
/// is ≥ `level`.
#[macro_export]
macro_rules! notify {
    ($level:expr, $($arg:tt)*) => {
        if $crate::notify::notification_level() >= $level {
            eprint!($($arg)*);
        }
    };
}
