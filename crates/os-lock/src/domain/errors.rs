//! # Domain Errors
//!
//! Error taxonomy for lock and unlock requests.
//!
//! ## Design Principles
//!
//! - Every error exposes a POSIX-style code name (`EBADF`, `EAGAIN`, ...) on
//!   every platform, so callers can match on one vocabulary
//! - Native codes are preserved verbatim next to the name
//! - The core never retries; a failure is surfaced exactly once

use std::fmt;

use thiserror::Error;

use crate::domain::value_objects::Acquisition;
use crate::ports::outbound::NativeError;

/// A platform-stable error code.
///
/// `name` is the POSIX spelling of the condition; `raw` is the native code the
/// platform reported (errno on Unix, `GetLastError` on Windows), if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode {
    name: &'static str,
    raw: Option<i32>,
}

impl ErrorCode {
    /// Code raised by argument validation before any native call.
    pub const EINVAL: ErrorCode = ErrorCode::synthetic("EINVAL");
    /// Code for platforms without a native lock adapter.
    pub const ENOTSUP: ErrorCode = ErrorCode::synthetic("ENOTSUP");
    /// Catch-all name for native codes without a POSIX equivalent.
    pub const UNKNOWN_NAME: &'static str = "UNKNOWN";

    /// A code reported by the platform.
    pub const fn native(name: &'static str, raw: i32) -> Self {
        Self {
            name,
            raw: Some(raw),
        }
    }

    /// A code produced by the core itself.
    pub const fn synthetic(name: &'static str) -> Self {
        Self { name, raw: None }
    }

    /// POSIX-style name, e.g. `"EBADF"`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Native code as reported by the OS.
    pub fn raw_os_error(&self) -> Option<i32> {
        self.raw
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Coarse classification of a [`LockError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockErrorKind {
    /// Descriptor closed or invalid.
    BadDescriptor,
    /// Immediate acquisition refused because another holder owns the range.
    WouldBlock,
    /// Malformed range, rejected before or by the native call.
    InvalidArgument,
    /// Descriptor does not refer to a lockable resource.
    Unsupported,
    /// Any other native failure.
    Os,
    /// The worker running the native call never produced an outcome.
    Worker,
}

/// Errors returned by `lock` and `unlock`.
#[derive(Debug, Clone, Error)]
pub enum LockError {
    /// The descriptor is closed or invalid.
    #[error("{code}: bad file descriptor, {syscall}")]
    BadDescriptor {
        /// Platform code.
        code: ErrorCode,
        /// Native call that failed.
        syscall: &'static str,
    },

    /// An immediate request hit a range held by someone else.
    #[error("{code}: lock is held by another owner, {syscall}")]
    WouldBlock {
        /// One of `EAGAIN`, `EACCES`, `EBUSY`.
        code: ErrorCode,
        /// Native call that failed.
        syscall: &'static str,
    },

    /// The range cannot be expressed on this platform.
    #[error("{code}: invalid lock range, {reason}")]
    InvalidArgument {
        /// Always named `EINVAL`.
        code: ErrorCode,
        /// What was wrong.
        reason: String,
    },

    /// The descriptor cannot carry advisory locks.
    #[error("{code}: descriptor does not support locking, {syscall}")]
    Unsupported {
        /// Platform code.
        code: ErrorCode,
        /// Native call that failed.
        syscall: &'static str,
    },

    /// Native failure passed through unmodified.
    #[error("{code}: {message}, {syscall}")]
    Os {
        /// Platform code.
        code: ErrorCode,
        /// Native call that failed.
        syscall: &'static str,
        /// OS description of the code.
        message: String,
    },

    /// The worker running the native call panicked or was cancelled.
    #[error("lock worker failed: {0}")]
    Worker(String),
}

impl LockError {
    /// Build an `InvalidArgument` raised before the native call.
    pub fn invalid_range(reason: impl Into<String>) -> Self {
        LockError::InvalidArgument {
            code: ErrorCode::EINVAL,
            reason: reason.into(),
        }
    }

    /// Translate a native failure.
    ///
    /// `acquisition` is `None` for unlock requests. Contention codes only mean
    /// `WouldBlock` for immediate lock requests; anywhere else they are passed
    /// through as `Os`.
    pub fn from_native(failure: NativeError, acquisition: Option<Acquisition>) -> Self {
        let NativeError { code, syscall } = failure;
        match code.name() {
            "EBADF" => LockError::BadDescriptor { code, syscall },
            "EAGAIN" | "EACCES" | "EBUSY" if acquisition == Some(Acquisition::Immediate) => {
                LockError::WouldBlock { code, syscall }
            }
            "EINVAL" => LockError::InvalidArgument {
                code,
                reason: format!("rejected by {syscall}"),
            },
            "ENOTSUP" | "EOPNOTSUPP" => LockError::Unsupported { code, syscall },
            _ => LockError::Os {
                code,
                syscall,
                message: describe(code),
            },
        }
    }

    /// Classification of this error.
    pub fn kind(&self) -> LockErrorKind {
        match self {
            LockError::BadDescriptor { .. } => LockErrorKind::BadDescriptor,
            LockError::WouldBlock { .. } => LockErrorKind::WouldBlock,
            LockError::InvalidArgument { .. } => LockErrorKind::InvalidArgument,
            LockError::Unsupported { .. } => LockErrorKind::Unsupported,
            LockError::Os { .. } => LockErrorKind::Os,
            LockError::Worker(_) => LockErrorKind::Worker,
        }
    }

    /// POSIX-style code name, e.g. `"EBADF"`.
    pub fn code(&self) -> &'static str {
        match self {
            LockError::BadDescriptor { code, .. }
            | LockError::WouldBlock { code, .. }
            | LockError::InvalidArgument { code, .. }
            | LockError::Unsupported { code, .. }
            | LockError::Os { code, .. } => code.name(),
            LockError::Worker(_) => ErrorCode::UNKNOWN_NAME,
        }
    }

    /// Native code, when the error came from the OS.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            LockError::BadDescriptor { code, .. }
            | LockError::WouldBlock { code, .. }
            | LockError::InvalidArgument { code, .. }
            | LockError::Unsupported { code, .. }
            | LockError::Os { code, .. } => code.raw_os_error(),
            LockError::Worker(_) => None,
        }
    }

    /// True for the contention outcome of an immediate request.
    pub fn is_would_block(&self) -> bool {
        self.kind() == LockErrorKind::WouldBlock
    }
}

fn describe(code: ErrorCode) -> String {
    match code.raw_os_error() {
        Some(raw) => std::io::Error::from_raw_os_error(raw).to_string(),
        None => "native lock call failed".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn native(name: &'static str, raw: i32) -> NativeError {
        NativeError {
            code: ErrorCode::native(name, raw),
            syscall: "fcntl",
        }
    }

    #[test]
    fn test_bad_descriptor_translation() {
        let err = LockError::from_native(native("EBADF", 9), Some(Acquisition::Blocking));
        assert_eq!(err.kind(), LockErrorKind::BadDescriptor);
        assert_eq!(err.code(), "EBADF");
        assert_eq!(err.raw_os_error(), Some(9));
    }

    #[test]
    fn test_contention_codes_are_would_block_when_immediate() {
        for name in ["EAGAIN", "EACCES", "EBUSY"] {
            let err = LockError::from_native(native(name, 11), Some(Acquisition::Immediate));
            assert!(err.is_would_block(), "{name} should be WouldBlock");
            assert_eq!(err.code(), name);
        }
    }

    #[test]
    fn test_contention_codes_pass_through_when_blocking() {
        let err = LockError::from_native(native("EAGAIN", 11), Some(Acquisition::Blocking));
        assert_eq!(err.kind(), LockErrorKind::Os);
        assert_eq!(err.code(), "EAGAIN");
    }

    #[test]
    fn test_contention_codes_pass_through_on_unlock() {
        let err = LockError::from_native(native("EACCES", 13), None);
        assert_eq!(err.kind(), LockErrorKind::Os);
    }

    #[test]
    fn test_unsupported_translation() {
        let err = LockError::from_native(native("EOPNOTSUPP", 95), Some(Acquisition::Blocking));
        assert_eq!(err.kind(), LockErrorKind::Unsupported);
        let err = LockError::from_native(
            NativeError {
                code: ErrorCode::ENOTSUP,
                syscall: "none",
            },
            None,
        );
        assert_eq!(err.kind(), LockErrorKind::Unsupported);
        assert_eq!(err.raw_os_error(), None);
    }

    #[test]
    fn test_unknown_code_preserved() {
        let err = LockError::from_native(native("EDEADLK", 35), Some(Acquisition::Blocking));
        assert_eq!(err.kind(), LockErrorKind::Os);
        assert_eq!(err.code(), "EDEADLK");
        assert_eq!(err.raw_os_error(), Some(35));
        assert!(err.to_string().starts_with("EDEADLK: "));
        assert!(err.to_string().ends_with(", fcntl"));
    }

    #[test]
    fn test_invalid_range_display() {
        let err = LockError::invalid_range("start exceeds maximum offset");
        assert_eq!(err.code(), "EINVAL");
        assert!(err.to_string().contains("start exceeds maximum offset"));
    }

    #[test]
    fn test_worker_error_code() {
        let err = LockError::Worker("task panicked".to_string());
        assert_eq!(err.kind(), LockErrorKind::Worker);
        assert_eq!(err.code(), "UNKNOWN");
        assert!(err.to_string().contains("task panicked"));
    }
}
