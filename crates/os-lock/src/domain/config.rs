//! # Lock Service Configuration

use std::env;

/// Configuration for [`FileLockService`](crate::FileLockService).
///
/// Blocking lock attempts always run on a dedicated waiter thread; only
/// non-waiting calls are affected by these settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LockConfig {
    /// Run immediate lock attempts and unlocks on the calling task instead of
    /// the blocking pool (default: false).
    ///
    /// These calls return without waiting on other holders, so running them
    /// inline saves a thread hop. A slow filesystem can still stall the
    /// executor thread for the duration of the syscall.
    pub inline_immediate: bool,
}

impl LockConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `inline_immediate`.
    pub fn with_inline_immediate(mut self, inline: bool) -> Self {
        self.inline_immediate = inline;
        self
    }

    /// Read configuration from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `OS_LOCK_INLINE_IMMEDIATE`: `true`/`1` to enable (default: false)
    pub fn from_env() -> Self {
        Self {
            inline_immediate: env::var("OS_LOCK_INLINE_IMMEDIATE")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }
}

pub(crate) fn parse_flag(value: &str) -> bool {
    let value = value.trim();
    value.eq_ignore_ascii_case("true") || value == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_runs_everything_on_blocking_pool() {
        assert!(!LockConfig::default().inline_immediate);
    }

    #[test]
    fn test_builder() {
        let config = LockConfig::new().with_inline_immediate(true);
        assert!(config.inline_immediate);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("yes"));
    }
}
