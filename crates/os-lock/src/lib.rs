//! # os-lock
//!
//! Advisory byte-range locks on open file descriptors, with one error
//! taxonomy across platforms.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Place and release shared or exclusive locks on a byte range of a file the
//! caller already has open:
//! - POSIX record locks (`fcntl`) on Unix, `LockFileEx` on Windows
//! - Blocking requests wait on a dedicated thread, never on the caller's
//!   task or the runtime's blocking pool
//! - Immediate requests fail with [`LockErrorKind::WouldBlock`] when another
//!   holder conflicts
//!
//! Locks are advisory. They only constrain processes that also take them.
//! Descriptors are borrowed; this crate never opens or closes files and keeps
//! no record of what is held.
//!
//! ## Platform Semantics
//!
//! | | Unix (`fcntl`) | Windows (`LockFileEx`) |
//! |---|---|---|
//! | Owner | process | handle |
//! | `length == 0` | to end of file, growing with it | `u64::MAX` bytes |
//! | Unlock of unheld range | succeeds | `Os` error |
//! | Closing any descriptor of the file | drops the process's locks | drops that handle's locks |
//!
//! ## Module Structure
//!
//! ```text
//! os-lock/
//! ├── domain/          # Descriptor, ByteRange, LockOptions, LockArgs, LockError
//! ├── ports/           # FileLockApi (inbound), NativeLockPrimitive (outbound)
//! ├── adapters/        # PosixRecordLock, WindowsRangeLock, UnsupportedPlatform
//! ├── service/         # FileLockService (request normalizer)
//! └── telemetry.rs     # tracing subscriber setup
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use std::fs::OpenOptions;
//! use os_lock::{Descriptor, LockOptions};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let file = OpenOptions::new().read(true).write(true).open("data.bin")?;
//! let fd = Descriptor::of(&file);
//!
//! // Whole file, shared, waits for conflicting holders.
//! os_lock::lock(fd, ()).await?;
//! os_lock::unlock(fd, 0, 0).await?;
//!
//! // Bytes [4096, 8192), exclusive, fail fast.
//! match os_lock::lock(fd, (4096u64, 4096u64, LockOptions::exclusive().with_immediate(true))).await {
//!     Ok(()) => os_lock::unlock(fd, 4096, 4096).await?,
//!     Err(e) if e.is_would_block() => println!("busy: {}", e.code()),
//!     Err(e) => return Err(e.into()),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;
pub mod telemetry;

// Re-exports
pub use adapters::NativeLock;
pub use domain::{
    Acquisition, ByteRange, Descriptor, ErrorCode, LockArgs, LockConfig, LockError,
    LockErrorKind, LockMode, LockOptions, LockRequest, RawDescriptor, UnlockRequest,
};
pub use ports::inbound::FileLockApi;
pub use ports::outbound::{NativeCall, NativeError, NativeLockPrimitive, RecordingLockPrimitive};
pub use service::FileLockService;
pub use telemetry::{init_tracing, LogConfig, TelemetryError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lock a byte range of `descriptor` with this platform's native adapter.
///
/// `args` selects the range and options:
///
/// | `args` | range | options |
/// |---|---|---|
/// | `()` | whole file | shared, blocking |
/// | `LockOptions` | whole file | as given |
/// | `start` | `[start, EOF)` | shared, blocking |
/// | `(start, length)` | `[start, start + length)` | shared, blocking |
/// | `(start, length, LockOptions)` | `[start, start + length)` | as given |
///
/// A `length` of 0 extends the range to the end of the file.
pub async fn lock(descriptor: Descriptor, args: impl Into<LockArgs>) -> Result<(), LockError> {
    FileLockService::native().lock(descriptor, args).await
}

/// Release a byte range of `descriptor`; `unlock(fd, 0, 0)` releases the
/// whole file.
pub async fn unlock(descriptor: Descriptor, start: u64, length: u64) -> Result<(), LockError> {
    FileLockService::native()
        .unlock(descriptor, start, length)
        .await
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
