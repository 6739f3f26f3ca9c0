//! # Windows Range Lock Adapter
//!
//! Implements `NativeLockPrimitive` with `LockFileEx`/`UnlockFileEx`.
//!
//! Differences from POSIX record locks that callers can observe:
//!
//! - Locks belong to the handle, so two handles in one process DO conflict
//! - `length == 0` locks `u64::MAX` bytes from `start`
//! - An unlock must name exactly a locked region; anything else fails with
//!   `ERROR_NOT_LOCKED`, which is passed through
//! - Locking a region twice from the same handle does not convert its mode

use std::io;

use windows_sys::Win32::Foundation::{
    ERROR_ACCESS_DENIED, ERROR_INVALID_FUNCTION, ERROR_INVALID_HANDLE, ERROR_INVALID_PARAMETER,
    ERROR_IO_PENDING, ERROR_LOCK_VIOLATION, ERROR_NOT_ENOUGH_MEMORY, ERROR_NOT_SUPPORTED,
    ERROR_SHARING_VIOLATION, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{
    LockFileEx, UnlockFileEx, LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY,
};
use windows_sys::Win32::System::IO::{OVERLAPPED, OVERLAPPED_0_0};

use crate::domain::{ByteRange, Descriptor, ErrorCode, LockMode};
use crate::ports::outbound::{NativeError, NativeLockPrimitive};

/// Win32 error codes and the POSIX names they are reported under.
const WIN32_NAMES: &[(u32, &str)] = &[
    (ERROR_INVALID_HANDLE, "EBADF"),
    (ERROR_LOCK_VIOLATION, "EBUSY"),
    (ERROR_SHARING_VIOLATION, "EBUSY"),
    (ERROR_IO_PENDING, "EAGAIN"),
    (ERROR_ACCESS_DENIED, "EPERM"),
    (ERROR_INVALID_PARAMETER, "EINVAL"),
    (ERROR_NOT_SUPPORTED, "ENOTSUP"),
    (ERROR_INVALID_FUNCTION, "EISDIR"),
    (ERROR_NOT_ENOUGH_MEMORY, "ENOMEM"),
];

/// Map a `GetLastError` value to its platform-stable code.
pub fn win32_code(error: u32) -> ErrorCode {
    let name = WIN32_NAMES
        .iter()
        .find(|(code, _)| *code == error)
        .map(|(_, name)| *name)
        .unwrap_or(ErrorCode::UNKNOWN_NAME);
    ErrorCode::native(name, error as i32)
}

/// `LockFileEx` range locks.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsRangeLock;

impl WindowsRangeLock {
    /// Create the adapter.
    pub fn new() -> Self {
        Self
    }

    fn handle(descriptor: Descriptor, syscall: &'static str) -> Result<HANDLE, NativeError> {
        let handle = descriptor.raw() as HANDLE;
        if handle == INVALID_HANDLE_VALUE || handle.is_null() {
            return Err(NativeError {
                code: win32_code(ERROR_INVALID_HANDLE),
                syscall,
            });
        }
        Ok(handle)
    }

    /// Offset in the OVERLAPPED structure, length split into low/high words.
    fn region(range: ByteRange) -> (OVERLAPPED, u32, u32) {
        let length = if range.is_to_end() {
            u64::MAX
        } else {
            range.length()
        };
        // SAFETY: OVERLAPPED is plain old data; all-zero is a valid value.
        let mut overlapped: OVERLAPPED = unsafe { std::mem::zeroed() };
        overlapped.Anonymous.Anonymous = OVERLAPPED_0_0 {
            Offset: range.start() as u32,
            OffsetHigh: (range.start() >> 32) as u32,
        };
        (overlapped, length as u32, (length >> 32) as u32)
    }

    fn last_error(syscall: &'static str) -> NativeError {
        let raw = io::Error::last_os_error().raw_os_error().unwrap_or(0);
        NativeError {
            code: win32_code(raw as u32),
            syscall,
        }
    }

    fn lock(
        descriptor: Descriptor,
        range: ByteRange,
        mode: LockMode,
        flags: u32,
    ) -> Result<(), NativeError> {
        let handle = Self::handle(descriptor, "LockFileEx")?;
        let flags = flags
            | match mode {
                LockMode::Exclusive => LOCKFILE_EXCLUSIVE_LOCK,
                LockMode::Shared => 0,
            };
        let (mut overlapped, low, high) = Self::region(range);
        // SAFETY: the handle is caller-owned; `overlapped` lives across the
        // call, which completes synchronously on handles opened without
        // FILE_FLAG_OVERLAPPED.
        let ok = unsafe { LockFileEx(handle, flags, 0, low, high, &mut overlapped) };
        if ok == 0 {
            return Err(Self::last_error("LockFileEx"));
        }
        Ok(())
    }
}

impl NativeLockPrimitive for WindowsRangeLock {
    fn lock_blocking(
        &self,
        descriptor: Descriptor,
        range: ByteRange,
        mode: LockMode,
    ) -> Result<(), NativeError> {
        Self::lock(descriptor, range, mode, 0)
    }

    fn try_lock(
        &self,
        descriptor: Descriptor,
        range: ByteRange,
        mode: LockMode,
    ) -> Result<(), NativeError> {
        Self::lock(descriptor, range, mode, LOCKFILE_FAIL_IMMEDIATELY)
    }

    fn unlock(&self, descriptor: Descriptor, range: ByteRange) -> Result<(), NativeError> {
        let handle = Self::handle(descriptor, "UnlockFileEx")?;
        let (mut overlapped, low, high) = Self::region(range);
        // SAFETY: see `lock`.
        let ok = unsafe { UnlockFileEx(handle, 0, low, high, &mut overlapped) };
        if ok == 0 {
            return Err(Self::last_error("UnlockFileEx"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_win32_names() {
        assert_eq!(win32_code(ERROR_INVALID_HANDLE).name(), "EBADF");
        assert_eq!(win32_code(ERROR_LOCK_VIOLATION).name(), "EBUSY");
        assert_eq!(
            win32_code(ERROR_LOCK_VIOLATION).raw_os_error(),
            Some(ERROR_LOCK_VIOLATION as i32)
        );
    }

    #[test]
    fn test_to_end_region_is_maximal() {
        let (_, low, high) = WindowsRangeLock::region(ByteRange::new(5, 0));
        assert_eq!((low, high), (u32::MAX, u32::MAX));
        let (_, low, high) = WindowsRangeLock::region(ByteRange::new(0, (1 << 32) + 7));
        assert_eq!((low, high), (7, 1));
    }

    #[test]
    fn test_invalid_handle_is_ebadf() {
        let err = WindowsRangeLock::new()
            .try_lock(
                Descriptor::from_raw(INVALID_HANDLE_VALUE as isize),
                ByteRange::WHOLE_FILE,
                LockMode::Shared,
            )
            .unwrap_err();
        assert_eq!(err.code.name(), "EBADF");
    }
}
