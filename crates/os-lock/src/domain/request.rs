//! # Lock Requests
//!
//! Argument resolution for `lock` and `unlock`.
//!
//! A lock call comes in one of two mutually exclusive shapes:
//!
//! ```text
//! lock(fd, options)                  -> LockArgs::Options
//! lock(fd, start?, length?, options?) -> LockArgs::Range
//! ```
//!
//! Both are resolved once, at entry, into the 5-tuple
//! `(fd, start, length, exclusive, immediate)` carried by [`LockRequest`].

use std::fmt;

use crate::domain::value_objects::{Acquisition, ByteRange, Descriptor, LockMode, LockOptions};

/// Arguments following the descriptor in a lock call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockArgs {
    /// Options object in second position: `start = 0`, `length = 0`.
    Options(LockOptions),
    /// Positional form; absent values take their defaults.
    Range {
        /// Defaults to 0.
        start: Option<u64>,
        /// Defaults to 0 (to end of file).
        length: Option<u64>,
        /// Defaults to shared, blocking.
        options: Option<LockOptions>,
    },
}

impl LockArgs {
    /// Positional form with every value given.
    pub const fn range(start: u64, length: u64, options: LockOptions) -> Self {
        LockArgs::Range {
            start: Some(start),
            length: Some(length),
            options: Some(options),
        }
    }

    /// Apply defaults and return `(start, length, options)`.
    pub fn resolve(self) -> (u64, u64, LockOptions) {
        match self {
            LockArgs::Options(options) => (0, 0, options),
            LockArgs::Range {
                start,
                length,
                options,
            } => (
                start.unwrap_or(0),
                length.unwrap_or(0),
                options.unwrap_or_default(),
            ),
        }
    }
}

impl Default for LockArgs {
    fn default() -> Self {
        LockArgs::Range {
            start: None,
            length: None,
            options: None,
        }
    }
}

impl From<()> for LockArgs {
    fn from(_: ()) -> Self {
        LockArgs::default()
    }
}

impl From<LockOptions> for LockArgs {
    fn from(options: LockOptions) -> Self {
        LockArgs::Options(options)
    }
}

impl From<u64> for LockArgs {
    fn from(start: u64) -> Self {
        LockArgs::Range {
            start: Some(start),
            length: None,
            options: None,
        }
    }
}

impl From<(u64, u64)> for LockArgs {
    fn from((start, length): (u64, u64)) -> Self {
        LockArgs::Range {
            start: Some(start),
            length: Some(length),
            options: None,
        }
    }
}

impl From<(u64, u64, LockOptions)> for LockArgs {
    fn from((start, length, options): (u64, u64, LockOptions)) -> Self {
        LockArgs::range(start, length, options)
    }
}

/// A resolved lock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockRequest {
    /// File to lock.
    pub descriptor: Descriptor,
    /// Range to lock.
    pub range: ByteRange,
    /// Shared or exclusive.
    pub mode: LockMode,
    /// Blocking or immediate.
    pub acquisition: Acquisition,
}

impl LockRequest {
    /// Resolve a call shape into a request.
    pub fn resolve(descriptor: Descriptor, args: impl Into<LockArgs>) -> Self {
        let (start, length, options) = args.into().resolve();
        Self {
            descriptor,
            range: ByteRange::new(start, length),
            mode: options.mode(),
            acquisition: options.acquisition(),
        }
    }

    /// The canonical `(fd, start, length, exclusive, immediate)` tuple.
    pub fn as_tuple(&self) -> (Descriptor, u64, u64, bool, bool) {
        (
            self.descriptor,
            self.range.start(),
            self.range.length(),
            self.mode.is_exclusive(),
            self.acquisition.is_immediate(),
        )
    }
}

impl fmt::Display for LockRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "lock fd={} range={} mode={:?} acquisition={:?}",
            self.descriptor, self.range, self.mode, self.acquisition
        )
    }
}

/// A resolved unlock request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnlockRequest {
    /// File to unlock.
    pub descriptor: Descriptor,
    /// Range to release.
    pub range: ByteRange,
}

impl UnlockRequest {
    /// Build an unlock request; pass `0, 0` for the whole file.
    pub const fn new(descriptor: Descriptor, start: u64, length: u64) -> Self {
        Self {
            descriptor,
            range: ByteRange::new(start, length),
        }
    }

    /// The canonical `(fd, start, length)` tuple.
    pub fn as_tuple(&self) -> (Descriptor, u64, u64) {
        (self.descriptor, self.range.start(), self.range.length())
    }
}

impl fmt::Display for UnlockRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unlock fd={} range={}", self.descriptor, self.range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FD: Descriptor = Descriptor::from_raw(7);

    #[test]
    fn test_no_arguments_take_all_defaults() {
        let request = LockRequest::resolve(FD, ());
        assert_eq!(request.as_tuple(), (FD, 0, 0, false, false));
    }

    #[test]
    fn test_options_in_second_position() {
        let request = LockRequest::resolve(FD, LockOptions::exclusive());
        assert_eq!(request.as_tuple(), (FD, 0, 0, true, false));

        let request = LockRequest::resolve(FD, LockOptions::immediate());
        assert_eq!(request.as_tuple(), (FD, 0, 0, false, true));
    }

    #[test]
    fn test_numeric_second_argument_is_start() {
        let request = LockRequest::resolve(FD, 128u64);
        assert_eq!(request.as_tuple(), (FD, 128, 0, false, false));
    }

    #[test]
    fn test_start_and_length() {
        let request = LockRequest::resolve(FD, (16u64, 32u64));
        assert_eq!(request.as_tuple(), (FD, 16, 32, false, false));
    }

    #[test]
    fn test_full_positional_form() {
        let options = LockOptions::new().with_exclusive(true).with_immediate(true);
        let request = LockRequest::resolve(FD, (16u64, 32u64, options));
        assert_eq!(request.as_tuple(), (FD, 16, 32, true, true));
    }

    #[test]
    fn test_options_form_matches_positional_form() {
        let by_options = LockRequest::resolve(FD, LockOptions::exclusive());
        let by_position = LockRequest::resolve(FD, (0u64, 0u64, LockOptions::exclusive()));
        assert_eq!(by_options, by_position);
    }

    #[test]
    fn test_partial_range_fills_defaults() {
        let args = LockArgs::Range {
            start: None,
            length: Some(10),
            options: Some(LockOptions::immediate()),
        };
        let request = LockRequest::resolve(FD, args);
        assert_eq!(request.as_tuple(), (FD, 0, 10, false, true));
    }

    #[test]
    fn test_unlock_request_tuple() {
        assert_eq!(UnlockRequest::new(FD, 0, 0).as_tuple(), (FD, 0, 0));
        assert_eq!(UnlockRequest::new(FD, 5, 9).as_tuple(), (FD, 5, 9));
    }

    #[test]
    fn test_display() {
        let request = LockRequest::resolve(FD, (4u64, 6u64, LockOptions::exclusive()));
        assert_eq!(
            request.to_string(),
            "lock fd=7 range=[4, 10) mode=Exclusive acquisition=Blocking"
        );
        assert_eq!(
            UnlockRequest::new(FD, 0, 0).to_string(),
            "unlock fd=7 range=[0, EOF)"
        );
    }
}
