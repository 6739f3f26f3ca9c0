//! Lock/unlock against real files from a single process.

use std::fs::{File, OpenOptions};
use std::path::Path;

use os_lock::{Descriptor, FileLockService, LockConfig, LockErrorKind, LockOptions};
use tempfile::TempDir;

fn open_rw(path: &Path) -> File {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .unwrap()
}

fn scratch() -> (TempDir, File) {
    let dir = tempfile::tempdir().unwrap();
    let file = open_rw(&dir.path().join("file"));
    (dir, file)
}

#[tokio::test]
async fn test_whole_file_round_trips() {
    let (_dir, file) = scratch();
    let fd = Descriptor::of(&file);

    os_lock::lock(fd, ()).await.unwrap();
    os_lock::unlock(fd, 0, 0).await.unwrap();

    os_lock::lock(fd, LockOptions::exclusive()).await.unwrap();
    os_lock::unlock(fd, 0, 0).await.unwrap();

    os_lock::lock(fd, LockOptions::exclusive().with_immediate(true))
        .await
        .unwrap();
    os_lock::unlock(fd, 0, 0).await.unwrap();
}

#[tokio::test]
async fn test_positional_ranges_round_trip() {
    let (_dir, file) = scratch();
    let fd = Descriptor::of(&file);

    os_lock::lock(fd, (0u64, 10u64)).await.unwrap();
    os_lock::unlock(fd, 0, 10).await.unwrap();

    os_lock::lock(fd, (1u64 << 33, 4096u64, LockOptions::exclusive()))
        .await
        .unwrap();
    os_lock::unlock(fd, 1 << 33, 4096).await.unwrap();

    // Ranges past the current end of file are fine.
    os_lock::lock(fd, (1_000_000u64, 1u64, LockOptions::immediate()))
        .await
        .unwrap();
    os_lock::unlock(fd, 1_000_000, 1).await.unwrap();
}

#[tokio::test]
async fn test_disjoint_ranges_lock_concurrently() {
    let (_dir, file) = scratch();
    let fd = Descriptor::of(&file);
    let exclusive = LockOptions::exclusive();

    let (a, b, c) = tokio::join!(
        os_lock::lock(fd, (0u64, 10u64, exclusive)),
        os_lock::lock(fd, (10u64, 10u64, exclusive)),
        os_lock::lock(fd, (20u64, 10u64, exclusive)),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    os_lock::unlock(fd, 0, 30).await.unwrap();
}

#[tokio::test]
async fn test_configured_service_matches_free_functions() {
    let (_dir, file) = scratch();
    let fd = Descriptor::of(&file);
    let config = LockConfig::new().with_inline_immediate(true);
    let service = FileLockService::new(os_lock::NativeLock::new(), config);

    service
        .lock(fd, (0u64, 64u64, LockOptions::exclusive().with_immediate(true)))
        .await
        .unwrap();
    service.unlock(fd, 0, 64).await.unwrap();
}

#[tokio::test]
async fn test_range_beyond_platform_offsets_is_invalid() {
    let (_dir, file) = scratch();
    let fd = Descriptor::of(&file);

    let err = os_lock::lock(fd, (u64::MAX, 1u64)).await.unwrap_err();
    assert_eq!(err.kind(), LockErrorKind::InvalidArgument);
    assert_eq!(err.code(), "EINVAL");

    let err = os_lock::unlock(fd, u64::MAX - 1, 10).await.unwrap_err();
    assert_eq!(err.kind(), LockErrorKind::InvalidArgument);
}

#[cfg(unix)]
mod unix {
    use super::*;

    #[tokio::test]
    async fn test_unlock_of_unheld_range_succeeds() {
        let (_dir, file) = scratch();
        let fd = Descriptor::of(&file);
        os_lock::unlock(fd, 0, 0).await.unwrap();
        os_lock::unlock(fd, 100, 5).await.unwrap();
    }

    #[tokio::test]
    async fn test_same_process_descriptors_do_not_conflict() {
        let (dir, first) = scratch();
        let second = open_rw(&dir.path().join("file"));

        os_lock::lock(Descriptor::of(&first), LockOptions::exclusive())
            .await
            .unwrap();
        os_lock::lock(
            Descriptor::of(&second),
            LockOptions::exclusive().with_immediate(true),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_relock_converts_mode() {
        let (_dir, file) = scratch();
        let fd = Descriptor::of(&file);

        os_lock::lock(fd, (0u64, 10u64)).await.unwrap();
        os_lock::lock(fd, (0u64, 10u64, LockOptions::exclusive()))
            .await
            .unwrap();
        os_lock::lock(fd, (0u64, 10u64)).await.unwrap();
        os_lock::unlock(fd, 0, 10).await.unwrap();
    }

    #[tokio::test]
    async fn test_exclusive_on_read_only_descriptor_is_refused() {
        let (dir, _file) = scratch();
        let read_only = File::open(dir.path().join("file")).unwrap();

        let err = os_lock::lock(
            Descriptor::of(&read_only),
            LockOptions::exclusive().with_immediate(true),
        )
        .await
        .unwrap_err();
        // fcntl reports a write lock on a read-only descriptor as EBADF.
        assert_eq!(err.kind(), LockErrorKind::BadDescriptor);
        assert_eq!(err.code(), "EBADF");
    }
}

#[cfg(windows)]
mod windows {
    use super::*;

    #[tokio::test]
    async fn test_unlock_of_unheld_range_is_passed_through() {
        let (_dir, file) = scratch();
        let fd = Descriptor::of(&file);
        let err = os_lock::unlock(fd, 0, 10).await.unwrap_err();
        assert_eq!(err.kind(), LockErrorKind::Os);
    }

    #[tokio::test]
    async fn test_handles_conflict_within_one_process() {
        let (dir, first) = scratch();
        let second = open_rw(&dir.path().join("file"));

        os_lock::lock(Descriptor::of(&first), LockOptions::exclusive())
            .await
            .unwrap();
        let err = os_lock::lock(
            Descriptor::of(&second),
            LockOptions::exclusive().with_immediate(true),
        )
        .await
        .unwrap_err();
        assert!(err.is_would_block());
    }
}
