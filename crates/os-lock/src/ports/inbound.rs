//! # Inbound Ports
//!
//! API trait defining what the lock service can do.

use async_trait::async_trait;

use crate::domain::{LockError, LockRequest, UnlockRequest};

/// File lock API - inbound port.
///
/// Each call is one independent round trip to the native primitive. Calls may
/// be issued concurrently; implementations must not serialize them.
#[async_trait]
pub trait FileLockApi: Send + Sync {
    /// Acquire the lock described by `request`.
    ///
    /// Blocking requests resolve only once the lock is granted or a terminal
    /// error occurs; they never return `WouldBlock`.
    async fn acquire(&self, request: LockRequest) -> Result<(), LockError>;

    /// Release the range described by `request`.
    async fn release(&self, request: UnlockRequest) -> Result<(), LockError>;
}
