use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::domain::UserId;

/// Exclusive handle for one user. Lock with `lock_owned().await`; the guard
/// releases on drop.
pub type LockHandle = Arc<Mutex<()>>;

/// Hands out one lock per user id, created on first use and kept for the
/// lifetime of the registry.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<UserId, LockHandle>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    pub fn acquire(&self, user_id: UserId) -> LockHandle {
        // The entry holds the shard write lock, so two first-time callers
        // cannot both insert. The ref is dropped before returning.
        self.locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
