/// Bounded mutex acquisition and the cross-process failure marker
///
/// Two synchronization domains exist. In-process, every piece of shared
/// resolver state (enumeration cursors, range bounds) sits behind a mutex
/// acquired through `retry_lock`, which gives up after a fixed number of
/// attempts instead of blocking indefinitely. Across processes, a marker
/// file under the system temp directory records a recent transport failure
/// so that a storm of short-lived resolver invocations does not hammer an
/// unreachable identity service.
use crate::error::{ResolveError, ResolveResult};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Attempts before a shared-state lock is reported as contended.
pub const LOCK_RETRY: u32 = 3;
/// Pause after each failed lock attempt.
pub const LOCK_INTERVAL: Duration = Duration::from_millis(10);

const MARKER_FILE: &str = ".remid.lock";

/// Fixed location of the cross-process failure marker.
pub fn default_marker_path() -> PathBuf {
    std::env::temp_dir().join(MARKER_FILE)
}

/// Acquire `mutex` with the bounded retry policy: up to [`LOCK_RETRY`]
/// attempts, [`LOCK_INTERVAL`] apart. Exhaustion is a contention error the
/// caller surfaces as unavailable; it never blocks indefinitely.
pub fn retry_lock<T>(mutex: &Mutex<T>) -> ResolveResult<MutexGuard<'_, T>> {
    for _ in 0..LOCK_RETRY {
        match mutex.try_lock() {
            Ok(guard) => return Ok(guard),
            // Guarded state is plain data; recover it rather than wedge
            // every subsequent caller behind a panicked holder.
            Err(TryLockError::Poisoned(poisoned)) => return Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => thread::sleep(LOCK_INTERVAL),
        }
    }
    Err(ResolveError::LockContended {
        attempts: LOCK_RETRY,
    })
}

/// Record a transport failure by creating the marker file if absent.
/// Best-effort: marker IO problems never fail the operation.
pub fn mark_failure(path: &Path) {
    if path.exists() {
        return;
    }
    if let Err(e) = std::fs::File::create(path) {
        debug!("cannot create failure marker {}: {}", path.display(), e);
    }
}

/// Whether outbound requests are currently permitted. A marker younger than
/// `window` suppresses requests; a stale marker is removed and requests
/// resume. Absence of the marker always permits.
pub fn request_available(path: &Path, window: Duration) -> bool {
    let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return true,
    };
    match SystemTime::now().duration_since(modified) {
        Ok(age) if age < window => false,
        _ => {
            if let Err(e) = std::fs::remove_file(path) {
                debug!("cannot remove stale failure marker {}: {}", path.display(), e);
            }
            true
        }
    }
}
