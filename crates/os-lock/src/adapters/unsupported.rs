//! Fallback for targets without byte-range locks: every call is `ENOTSUP`.

use crate::domain::{ByteRange, Descriptor, ErrorCode, LockMode};
use crate::ports::outbound::{NativeError, NativeLockPrimitive};

const UNSUPPORTED: NativeError = NativeError {
    code: ErrorCode::ENOTSUP,
    syscall: "lock",
};

/// Adapter that refuses every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedPlatform;

impl UnsupportedPlatform {
    /// Create the adapter.
    pub fn new() -> Self {
        Self
    }
}

impl NativeLockPrimitive for UnsupportedPlatform {
    fn lock_blocking(
        &self,
        _descriptor: Descriptor,
        _range: ByteRange,
        _mode: LockMode,
    ) -> Result<(), NativeError> {
        Err(UNSUPPORTED)
    }

    fn try_lock(
        &self,
        _descriptor: Descriptor,
        _range: ByteRange,
        _mode: LockMode,
    ) -> Result<(), NativeError> {
        Err(UNSUPPORTED)
    }

    fn unlock(&self, _descriptor: Descriptor, _range: ByteRange) -> Result<(), NativeError> {
        Err(UNSUPPORTED)
    }
}
