//! # Value Objects
//!
//! Immutable values that make up a lock request.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::errors::LockError;

/// Raw descriptor value as the platform spells it.
#[cfg(unix)]
pub type RawDescriptor = std::os::unix::io::RawFd;

/// Raw descriptor value as the platform spells it.
///
/// Handles are kept as integers so descriptors stay `Send` and `Copy`.
#[cfg(windows)]
pub type RawDescriptor = isize;

/// Raw descriptor value as the platform spells it.
#[cfg(not(any(unix, windows)))]
pub type RawDescriptor = i32;

/// A borrowed platform file handle.
///
/// The core never opens, closes or duplicates descriptors. The caller owns the
/// file and must keep it open for as long as it wants its locks to live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor(RawDescriptor);

impl Descriptor {
    /// Wrap a raw descriptor value.
    pub const fn from_raw(raw: RawDescriptor) -> Self {
        Self(raw)
    }

    /// The raw descriptor value.
    pub const fn raw(&self) -> RawDescriptor {
        self.0
    }

    /// Descriptor of an open file.
    #[cfg(unix)]
    pub fn of(file: &impl std::os::unix::io::AsRawFd) -> Self {
        Self(file.as_raw_fd())
    }

    /// Descriptor of an open file.
    #[cfg(windows)]
    pub fn of(file: &impl std::os::windows::io::AsRawHandle) -> Self {
        Self(file.as_raw_handle() as isize)
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Byte range `[start, start + length)`.
///
/// `length == 0` means "from `start` to end of file, following growth".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ByteRange {
    start: u64,
    length: u64,
}

impl ByteRange {
    /// The whole file: `start = 0`, `length = 0`.
    pub const WHOLE_FILE: ByteRange = ByteRange::new(0, 0);

    /// Create a range.
    pub const fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    /// First locked byte.
    pub const fn start(&self) -> u64 {
        self.start
    }

    /// Number of locked bytes, 0 meaning "to end of file".
    pub const fn length(&self) -> u64 {
        self.length
    }

    /// True when the range runs to end of file.
    pub const fn is_to_end(&self) -> bool {
        self.length == 0
    }

    /// Check that the range fits a platform whose largest offset is
    /// `max_offset`.
    pub fn validate(&self, max_offset: u64) -> Result<(), LockError> {
        if self.start > max_offset {
            return Err(LockError::invalid_range(format!(
                "start {} exceeds maximum offset {}",
                self.start, max_offset
            )));
        }
        if self.length > max_offset {
            return Err(LockError::invalid_range(format!(
                "length {} exceeds maximum offset {}",
                self.length, max_offset
            )));
        }
        match self.start.checked_add(self.length) {
            Some(end) if end <= max_offset => Ok(()),
            _ => Err(LockError::invalid_range(format!(
                "range {}+{} overflows maximum offset {}",
                self.start, self.length, max_offset
            ))),
        }
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_to_end() {
            write!(f, "[{}, EOF)", self.start)
        } else {
            write!(f, "[{}, {})", self.start, self.start.saturating_add(self.length))
        }
    }
}

/// Lock mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LockMode {
    /// Any number of shared holders; excludes exclusive holders.
    #[default]
    Shared,
    /// Sole holder of the range.
    Exclusive,
}

impl LockMode {
    /// Mode for the `exclusive` flag of [`LockOptions`].
    pub const fn from_exclusive(exclusive: bool) -> Self {
        if exclusive {
            LockMode::Exclusive
        } else {
            LockMode::Shared
        }
    }

    /// True for [`LockMode::Exclusive`].
    pub const fn is_exclusive(&self) -> bool {
        matches!(self, LockMode::Exclusive)
    }
}

/// Acquisition policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Acquisition {
    /// Suspend the calling task until the lock is granted.
    #[default]
    Blocking,
    /// Fail at once with `WouldBlock` when the range is taken.
    Immediate,
}

impl Acquisition {
    /// Policy for the `immediate` flag of [`LockOptions`].
    pub const fn from_immediate(immediate: bool) -> Self {
        if immediate {
            Acquisition::Immediate
        } else {
            Acquisition::Blocking
        }
    }

    /// True for [`Acquisition::Immediate`].
    pub const fn is_immediate(&self) -> bool {
        matches!(self, Acquisition::Immediate)
    }
}

/// The options object of a lock call.
///
/// Exactly two flags are recognized, each defaulting to `false` when absent.
/// Unknown keys in a serialized options object are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LockOptions {
    /// Request sole ownership instead of a shared lock.
    pub exclusive: bool,
    /// Fail instead of waiting when the range is taken.
    pub immediate: bool,
}

impl LockOptions {
    /// Shared, blocking.
    pub const fn new() -> Self {
        Self {
            exclusive: false,
            immediate: false,
        }
    }

    /// Set the `exclusive` flag.
    pub const fn with_exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    /// Set the `immediate` flag.
    pub const fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    /// Shorthand for `{ exclusive: true }`.
    pub const fn exclusive() -> Self {
        Self::new().with_exclusive(true)
    }

    /// Shorthand for `{ immediate: true }`.
    pub const fn immediate() -> Self {
        Self::new().with_immediate(true)
    }

    /// Lock mode selected by these options.
    pub const fn mode(&self) -> LockMode {
        LockMode::from_exclusive(self.exclusive)
    }

    /// Acquisition policy selected by these options.
    pub const fn acquisition(&self) -> Acquisition {
        Acquisition::from_immediate(self.immediate)
    }
}
