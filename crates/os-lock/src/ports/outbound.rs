//! # Outbound Ports
//!
//! The native lock primitive: the only thing the service needs from the OS.
//!
//! Implementations are synchronous. The service decides which execution
//! context runs them, so a blocking acquisition can park a worker thread
//! without stalling other tasks.

use std::collections::VecDeque;
use std::sync::{Arc, Barrier};

use parking_lot::Mutex;
use thiserror::Error;

use crate::domain::{Acquisition, ByteRange, Descriptor, ErrorCode, LockMode};

/// Failure reported by a native lock call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{syscall} failed: {code}")]
pub struct NativeError {
    /// Platform code, POSIX-named.
    pub code: ErrorCode,
    /// Name of the native call, e.g. `fcntl`.
    pub syscall: &'static str,
}

/// Native byte-range lock primitive - outbound port.
///
/// One adapter per platform family. Locks live in the kernel; adapters keep
/// no lock state of their own.
pub trait NativeLockPrimitive: Send + Sync {
    /// Lock `range`, waiting until no conflicting holder remains.
    fn lock_blocking(
        &self,
        descriptor: Descriptor,
        range: ByteRange,
        mode: LockMode,
    ) -> Result<(), NativeError>;

    /// Lock `range` or fail at once with a contention code.
    fn try_lock(
        &self,
        descriptor: Descriptor,
        range: ByteRange,
        mode: LockMode,
    ) -> Result<(), NativeError>;

    /// Release `range`.
    fn unlock(&self, descriptor: Descriptor, range: ByteRange) -> Result<(), NativeError>;

    /// Largest byte offset the platform can express.
    fn max_offset(&self) -> u64 {
        u64::MAX
    }
}

impl<P: NativeLockPrimitive + ?Sized> NativeLockPrimitive for Arc<P> {
    fn lock_blocking(
        &self,
        descriptor: Descriptor,
        range: ByteRange,
        mode: LockMode,
    ) -> Result<(), NativeError> {
        (**self).lock_blocking(descriptor, range, mode)
    }

    fn try_lock(
        &self,
        descriptor: Descriptor,
        range: ByteRange,
        mode: LockMode,
    ) -> Result<(), NativeError> {
        (**self).try_lock(descriptor, range, mode)
    }

    fn unlock(&self, descriptor: Descriptor, range: ByteRange) -> Result<(), NativeError> {
        (**self).unlock(descriptor, range)
    }

    fn max_offset(&self) -> u64 {
        (**self).max_offset()
    }
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// A call observed by [`RecordingLockPrimitive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeCall {
    /// `lock_blocking` or `try_lock`.
    Lock {
        /// Descriptor passed in.
        descriptor: Descriptor,
        /// Range passed in.
        range: ByteRange,
        /// Mode passed in.
        mode: LockMode,
        /// `Blocking` for `lock_blocking`, `Immediate` for `try_lock`.
        acquisition: Acquisition,
    },
    /// `unlock`.
    Unlock {
        /// Descriptor passed in.
        descriptor: Descriptor,
        /// Range passed in.
        range: ByteRange,
    },
}

impl NativeCall {
    /// The `(fd, start, length, exclusive, immediate)` tuple of a lock call.
    pub fn lock_tuple(&self) -> Option<(Descriptor, u64, u64, bool, bool)> {
        match self {
            NativeCall::Lock {
                descriptor,
                range,
                mode,
                acquisition,
            } => Some((
                *descriptor,
                range.start(),
                range.length(),
                mode.is_exclusive(),
                acquisition.is_immediate(),
            )),
            NativeCall::Unlock { .. } => None,
        }
    }
}

/// Mock primitive that records calls and replays scripted outcomes.
///
/// Unscripted calls succeed. An optional rendezvous barrier makes every
/// `lock_blocking` call wait for its peers, which proves that calls reach the
/// primitive concurrently.
pub struct RecordingLockPrimitive {
    calls: Mutex<Vec<NativeCall>>,
    outcomes: Mutex<VecDeque<Result<(), NativeError>>>,
    rendezvous: Option<Arc<Barrier>>,
    max_offset: u64,
}

impl RecordingLockPrimitive {
    /// Primitive that accepts everything.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcomes: Mutex::new(VecDeque::new()),
            rendezvous: None,
            max_offset: i64::MAX as u64,
        }
    }

    /// Queue the outcome of the next unscripted call.
    pub fn push_outcome(&self, outcome: Result<(), NativeError>) {
        self.outcomes.lock().push_back(outcome);
    }

    /// Builder form of [`push_outcome`](Self::push_outcome).
    pub fn with_outcome(self, outcome: Result<(), NativeError>) -> Self {
        self.push_outcome(outcome);
        self
    }

    /// Make `lock_blocking` wait until `parties` calls are inside it.
    pub fn with_rendezvous(mut self, parties: usize) -> Self {
        self.rendezvous = Some(Arc::new(Barrier::new(parties)));
        self
    }

    /// Override the reported maximum offset.
    pub fn with_max_offset(mut self, max_offset: u64) -> Self {
        self.max_offset = max_offset;
        self
    }

    /// Every call observed so far, in order.
    pub fn calls(&self) -> Vec<NativeCall> {
        self.calls.lock().clone()
    }

    fn record(&self, call: NativeCall) -> Result<(), NativeError> {
        self.calls.lock().push(call);
        self.outcomes.lock().pop_front().unwrap_or(Ok(()))
    }
}

impl Default for RecordingLockPrimitive {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeLockPrimitive for RecordingLockPrimitive {
    fn lock_blocking(
        &self,
        descriptor: Descriptor,
        range: ByteRange,
        mode: LockMode,
    ) -> Result<(), NativeError> {
        if let Some(barrier) = &self.rendezvous {
            barrier.wait();
        }
        self.record(NativeCall::Lock {
            descriptor,
            range,
            mode,
            acquisition: Acquisition::Blocking,
        })
    }

    fn try_lock(
        &self,
        descriptor: Descriptor,
        range: ByteRange,
        mode: LockMode,
    ) -> Result<(), NativeError> {
        self.record(NativeCall::Lock {
            descriptor,
            range,
            mode,
            acquisition: Acquisition::Immediate,
        })
    }

    fn unlock(&self, descriptor: Descriptor, range: ByteRange) -> Result<(), NativeError> {
        self.record(NativeCall::Unlock { descriptor, range })
    }

    fn max_offset(&self) -> u64 {
        self.max_offset
    }
}
