use crate::domain::{Points, TransactionKind, UserId};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("Ingestion failed with: {0}")]
    Ingestion(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Store failed with: {0}")]
    Store(String),

    #[error("{kind} amount must be greater than zero, got {amount}")]
    InvalidAmount { kind: TransactionKind, amount: Points },

    #[error("Balance after charge cannot exceed {max_balance} points")]
    BalanceCeilingExceeded { max_balance: Points },

    #[error("Insufficient balance (current: {current} points)")]
    InsufficientBalance { current: Points },

    #[error("Timed out waiting for the lock of user {user_id}")]
    LockTimeout { user_id: UserId },
}

impl Error {
    /// Business-rule rejections, as opposed to infrastructure failures.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidAmount { .. }
                | Error::BalanceCeilingExceeded { .. }
                | Error::InsufficientBalance { .. }
        )
    }
}
