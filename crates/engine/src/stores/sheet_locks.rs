//! Per-user serialization of read-modify-write cycles.

use std::sync::Arc;

use dashmap::DashMap;
use tavern_domain::UserKey;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per user key, created on first access.
///
/// Holding the guard across load, mutate and save means two commands for
/// the same user run strictly one after the other. Different users never
/// contend.
#[derive(Default)]
pub struct SheetLocks {
    locks: DashMap<UserKey, Arc<Mutex<()>>>,
}

impl SheetLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`'s document.
    pub async fn acquire(&self, key: &UserKey) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the DashMap shard lock is released before awaiting.
        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop entries nobody holds or waits on.
    ///
    /// Holders and waiters each keep a clone of the `Arc`, and `acquire`
    /// clones under the shard lock, so a count of one means the entry is idle.
    pub fn prune(&self) {
        self.locks.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_key_is_exclusive() {
        let locks = Arc::new(SheetLocks::new());
        let key = UserKey::from(1_u64);

        let guard = locks.acquire(&key).await;

        let waiter = {
            let locks = locks.clone();
            let key = key.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(&key).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_keys_do_not_contend() {
        let locks = SheetLocks::new();
        let _a = locks.acquire(&UserKey::from(1_u64)).await;
        let _b = tokio::time::timeout(
            Duration::from_secs(1),
            locks.acquire(&UserKey::from(2_u64)),
        )
        .await
        .unwrap();
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn prune_keeps_only_held_locks() {
        let locks = SheetLocks::new();
        let held = locks.acquire(&UserKey::from(1_u64)).await;
        drop(locks.acquire(&UserKey::from(2_u64)).await);
        assert_eq!(locks.len(), 2);

        locks.prune();
        assert_eq!(locks.len(), 1);

        drop(held);
        locks.prune();
        assert!(locks.is_empty());
    }
}
