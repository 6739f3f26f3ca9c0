//! # POSIX Record Lock Adapter
//!
//! Implements `NativeLockPrimitive` with `fcntl(2)` record locks:
//! `F_SETLKW` for blocking requests, `F_SETLK` for immediate ones and unlocks.
//!
//! Record locks are owned by the process, not the descriptor:
//!
//! - Two descriptors of the same file in one process never conflict
//! - Closing ANY descriptor of the file drops all of the process' locks on it
//! - Re-locking a held range converts its mode in place
//! - Unlocking a range that holds no lock succeeds

use std::io;

use libc::{c_int, c_short};
use tracing::trace;

use crate::domain::{ByteRange, Descriptor, ErrorCode, LockMode};
use crate::ports::outbound::{NativeError, NativeLockPrimitive};

const SYSCALL: &str = "fcntl";

/// errno values and their POSIX names.
///
/// Several platforms alias codes (`EAGAIN == EWOULDBLOCK`,
/// `ENOTSUP == EOPNOTSUPP`); the first entry wins.
const ERRNO_NAMES: &[(c_int, &str)] = &[
    (libc::EBADF, "EBADF"),
    (libc::EAGAIN, "EAGAIN"),
    (libc::EACCES, "EACCES"),
    (libc::EBUSY, "EBUSY"),
    (libc::EINVAL, "EINVAL"),
    (libc::EDEADLK, "EDEADLK"),
    (libc::ENOLCK, "ENOLCK"),
    (libc::EINTR, "EINTR"),
    (libc::EOVERFLOW, "EOVERFLOW"),
    (libc::EPERM, "EPERM"),
    (libc::ENOTSUP, "ENOTSUP"),
    (libc::EOPNOTSUPP, "EOPNOTSUPP"),
    (libc::EIO, "EIO"),
    (libc::ENOMEM, "ENOMEM"),
    (libc::EFAULT, "EFAULT"),
];

/// Map an errno to its platform-stable code.
pub fn errno_code(errno: c_int) -> ErrorCode {
    let name = ERRNO_NAMES
        .iter()
        .find(|(code, _)| *code == errno)
        .map(|(_, name)| *name)
        .unwrap_or(ErrorCode::UNKNOWN_NAME);
    ErrorCode::native(name, errno)
}

/// `fcntl` record locks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PosixRecordLock;

impl PosixRecordLock {
    /// Create the adapter.
    pub fn new() -> Self {
        Self
    }

    fn set_lock(
        descriptor: Descriptor,
        range: ByteRange,
        lock_type: c_short,
        command: c_int,
    ) -> Result<(), NativeError> {
        // SAFETY: `flock` is plain old data; all-zero is a valid value.
        let mut flock: libc::flock = unsafe { std::mem::zeroed() };
        flock.l_type = lock_type;
        flock.l_whence = libc::SEEK_SET as c_short;
        flock.l_start = range.start() as libc::off_t;
        flock.l_len = range.length() as libc::off_t;
        flock.l_pid = 0;

        loop {
            // SAFETY: `flock` outlives the call and the kernel only reads it
            // for F_SETLK/F_SETLKW. An invalid descriptor is reported as EBADF.
            let result =
                unsafe { libc::fcntl(descriptor.raw(), command, &flock as *const libc::flock) };
            if result != -1 {
                return Ok(());
            }

            let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
            // A signal delivered to a waiting worker is not a lock outcome.
            if errno == libc::EINTR && command == libc::F_SETLKW {
                trace!("[os-lock] fcntl interrupted on fd {}, waiting again", descriptor);
                continue;
            }
            return Err(NativeError {
                code: errno_code(errno),
                syscall: SYSCALL,
            });
        }
    }

    fn lock_type(mode: LockMode) -> c_short {
        match mode {
            LockMode::Exclusive => libc::F_WRLCK as c_short,
            LockMode::Shared => libc::F_RDLCK as c_short,
        }
    }
}

impl NativeLockPrimitive for PosixRecordLock {
    fn lock_blocking(
        &self,
        descriptor: Descriptor,
        range: ByteRange,
        mode: LockMode,
    ) -> Result<(), NativeError> {
        Self::set_lock(descriptor, range, Self::lock_type(mode), libc::F_SETLKW)
    }

    fn try_lock(
        &self,
        descriptor: Descriptor,
        range: ByteRange,
        mode: LockMode,
    ) -> Result<(), NativeError> {
        Self::set_lock(descriptor, range, Self::lock_type(mode), libc::F_SETLK)
    }

    fn unlock(&self, descriptor: Descriptor, range: ByteRange) -> Result<(), NativeError> {
        Self::set_lock(descriptor, range, libc::F_UNLCK as c_short, libc::F_SETLK)
    }

    fn max_offset(&self) -> u64 {
        libc::off_t::MAX as u64
    }
}
