use std::sync::atomic::{AtomicBool, Ordering};

/// The single process-wide gate guarding all writes to the leave store and
/// active index (§4.6). Non-blocking by design: callers that fail to
/// acquire either retry on their own schedule or enqueue, so there is never
/// a lock-wait and no deadlock is possible by construction.
#[derive(Default)]
pub struct SyncLock {
    held: AtomicBool,
}

impl SyncLock {
    pub fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
        }
    }

    /// Attempts to acquire the lock. Returns `true` on success.
    pub fn acquire(&self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn release(&self) {
        self.held.store(false, Ordering::Release);
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }

    /// Runs `f` while holding the lock, releasing it afterward regardless of
    /// outcome. Returns `None` if the lock could not be acquired.
    pub async fn with_lock<F, Fut, T>(&self, f: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        if !self.acquire() {
            return None;
        }
        let result = f().await;
        self.release();
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let lock = SyncLock::new();
        assert!(lock.acquire());
        assert!(!lock.acquire());
        lock.release();
        assert!(lock.acquire());
    }

    #[tokio::test]
    async fn with_lock_releases_after_completion() {
        let lock = SyncLock::new();
        let ran = lock.with_lock(|| async { 42 }).await;
        assert_eq!(ran, Some(42));
        assert!(!lock.is_held());
    }

    #[tokio::test]
    async fn with_lock_returns_none_when_busy() {
        let lock = SyncLock::new();
        assert!(lock.acquire());
        let ran = lock.with_lock(|| async { 1 }).await;
        assert_eq!(ran, None);
    }
}
