//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the `NativeLockPrimitive` port, one adapter per platform family.
//! [`NativeLock`] names the adapter for the compilation target.

#[cfg(unix)]
mod posix;
#[cfg(not(any(unix, windows)))]
mod unsupported;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use posix::{errno_code, PosixRecordLock};
#[cfg(not(any(unix, windows)))]
pub use unsupported::UnsupportedPlatform;
#[cfg(windows)]
pub use windows::{win32_code, WindowsRangeLock};

/// Native lock adapter for this target.
#[cfg(unix)]
pub type NativeLock = PosixRecordLock;

/// Native lock adapter for this target.
#[cfg(windows)]
pub type NativeLock = WindowsRangeLock;

/// Native lock adapter for this target.
#[cfg(not(any(unix, windows)))]
pub type NativeLock = UnsupportedPlatform;
