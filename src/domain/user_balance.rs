use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::{Points, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBalance {
    pub user_id: UserId,
    pub point: Points,       // never negative once committed
    pub updated_millis: u64, // wall clock of the last write, 0 if never written
}

impl UserBalance {
    pub fn new(user_id: UserId, point: Points, updated_millis: u64) -> Self {
        Self {
            user_id,
            point,
            updated_millis,
        }
    }

    /// Default record for a user the store has never seen.
    pub fn empty(user_id: UserId) -> Self {
        Self::new(user_id, Points::ZERO, 0)
    }
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
