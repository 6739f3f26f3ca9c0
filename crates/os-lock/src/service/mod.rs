//! # File Lock Service
//!
//! The lock request normalizer. This service:
//! 1. Resolves call shapes into `LockRequest`/`UnlockRequest` once, at entry
//! 2. Rejects ranges the platform cannot express before any native call
//! 3. Makes exactly one native call per request, off the caller's task
//!    (blocking acquisitions on a thread of their own, so a waiter never
//!    occupies the blocking pool that immediate calls and unlocks use)
//! 4. Translates native failures into `LockError`
//!
//! It holds no lock table and no mutable state. Concurrent requests reach the
//! primitive concurrently.


use std::fmt::Display;
use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::adapters::NativeLock;
use crate::domain::{
    Acquisition, Descriptor, LockArgs, LockConfig, LockError, LockErrorKind, LockRequest,
    UnlockRequest,
};
use crate::ports::inbound::FileLockApi;
use crate::ports::outbound::{NativeError, NativeLockPrimitive};

/// The file lock service.
///
/// Must be used from within a tokio runtime. Native calls that may wait get a
/// dedicated thread; the others run on the runtime's blocking pool or inline.
pub struct FileLockService<P> {
    /// Native lock primitive, shared with worker threads.
    primitive: Arc<P>,
    /// Service configuration.
    config: LockConfig,
}

impl FileLockService<NativeLock> {
    /// Service bound to this platform's native adapter.
    pub fn native() -> Self {
        Self::new(NativeLock::new(), LockConfig::default())
    }

    /// Service bound to this platform's native adapter, configured from the
    /// environment.
    pub fn native_from_env() -> Self {
        Self::new(NativeLock::new(), LockConfig::from_env())
    }
}

impl<P> FileLockService<P>
where
    P: NativeLockPrimitive + 'static,
{
    /// Create a service around any primitive.
    pub fn new(primitive: P, config: LockConfig) -> Self {
        Self {
            primitive: Arc::new(primitive),
            config,
        }
    }

    /// The underlying primitive.
    pub fn primitive(&self) -> &P {
        &self.primitive
    }

    /// Service configuration.
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Lock a byte range of `descriptor`.
    ///
    /// `args` is either a [`LockOptions`](crate::LockOptions) (whole file) or
    /// a positional `start` / `(start, length)` / `(start, length, options)`.
    pub async fn lock(
        &self,
        descriptor: Descriptor,
        args: impl Into<LockArgs>,
    ) -> Result<(), LockError> {
        self.acquire(LockRequest::resolve(descriptor, args)).await
    }

    /// Release a byte range of `descriptor`; `0, 0` releases the whole file.
    pub async fn unlock(
        &self,
        descriptor: Descriptor,
        start: u64,
        length: u64,
    ) -> Result<(), LockError> {
        self.release(UnlockRequest::new(descriptor, start, length))
            .await
    }

    /// Run one native call that may wait indefinitely on its own thread.
    async fn wait<F>(&self, call: F) -> Result<Result<(), NativeError>, LockError>
    where
        F: FnOnce(&P) -> Result<(), NativeError> + Send + 'static,
    {
        let primitive = Arc::clone(&self.primitive);
        let (tx, rx) = oneshot::channel();
        thread::Builder::new()
            .name("os-lock-waiter".to_string())
            .spawn(move || {
                // The receiver is gone if the caller stopped waiting.
                let _ = tx.send(call(&primitive));
            })
            .map_err(|e| LockError::Worker(e.to_string()))?;
        rx.await.map_err(|e| LockError::Worker(e.to_string()))
    }

    /// Run one non-waiting native call, inline or on the blocking pool.
    async fn run<F>(&self, inline: bool, call: F) -> Result<Result<(), NativeError>, LockError>
    where
        F: FnOnce(&P) -> Result<(), NativeError> + Send + 'static,
    {
        if inline {
            return Ok(call(&self.primitive));
        }
        let primitive = Arc::clone(&self.primitive);
        tokio::task::spawn_blocking(move || call(&primitive))
            .await
            .map_err(|e| LockError::Worker(e.to_string()))
    }
}

#[async_trait]
impl<P> FileLockApi for FileLockService<P>
where
    P: NativeLockPrimitive + 'static,
{
    async fn acquire(&self, request: LockRequest) -> Result<(), LockError> {
        let (fd, start, length, exclusive, immediate) = request.as_tuple();
        debug!(
            fd = %fd,
            start,
            length,
            exclusive,
            immediate,
            "[os-lock] Lock requested"
        );

        if let Err(e) = request.range.validate(self.primitive.max_offset()) {
            return finish(&request, Err(e));
        }

        let LockRequest {
            descriptor,
            range,
            mode,
            acquisition,
        } = request;
        let outcome = match acquisition {
            Acquisition::Blocking => {
                self.wait(move |p| p.lock_blocking(descriptor, range, mode))
                    .await
            }
            Acquisition::Immediate => {
                self.run(self.config.inline_immediate, move |p| {
                    p.try_lock(descriptor, range, mode)
                })
                .await
            }
        };

        let result = outcome
            .and_then(|native| native.map_err(|e| LockError::from_native(e, Some(acquisition))));
        finish(&request, result)
    }

    async fn release(&self, request: UnlockRequest) -> Result<(), LockError> {
        let (fd, start, length) = request.as_tuple();
        debug!(fd = %fd, start, length, "[os-lock] Unlock requested");

        if let Err(e) = request.range.validate(self.primitive.max_offset()) {
            return finish(&request, Err(e));
        }

        let UnlockRequest { descriptor, range } = request;
        let result = self
            .run(self.config.inline_immediate, move |p| {
                p.unlock(descriptor, range)
            })
            .await
            .and_then(|native| native.map_err(|e| LockError::from_native(e, None)));
        finish(&request, result)
    }
}

/// Log the outcome of a request and hand it back.
fn finish(request: &impl Display, result: Result<(), LockError>) -> Result<(), LockError> {
    match &result {
        Ok(()) => debug!("[os-lock] {} succeeded", request),
        Err(e) => match e.kind() {
            LockErrorKind::WouldBlock
            | LockErrorKind::BadDescriptor
            | LockErrorKind::InvalidArgument => {
                debug!(code = e.code(), "[os-lock] {} failed: {}", request, e)
            }
            LockErrorKind::Unsupported | LockErrorKind::Os | LockErrorKind::Worker => {
                warn!(code = e.code(), "[os-lock] {} failed: {}", request, e)
            }
        },
    }
    result
}
