use async_trait::async_trait;
use futures::Stream;

use crate::domain::{
    Command, Error, Points, TransactionKind, TransactionRecord, UserBalance, UserId,
};

pub trait CommandStream {
    type CmdStream: Stream<Item = Result<Command, Error>> + Send + Unpin + 'static;
    fn stream(&mut self) -> Self::CmdStream;
}

pub trait DeadLetterQueue {
    fn report(&self, error: &Error);
}

/// Current balance per user. Each call is atomic on its own; a read followed
/// by a write is not.
#[async_trait]
pub trait BalanceStore: Send + Sync {
    /// Returns a zero balance for unknown users.
    async fn read(&self, user_id: UserId) -> Result<UserBalance, Error>;

    /// Replaces the balance and returns it with a fresh timestamp.
    async fn write(&self, user_id: UserId, point: Points) -> Result<UserBalance, Error>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn append(
        &self,
        user_id: UserId,
        amount: Points,
        kind: TransactionKind,
        updated_millis: u64,
    ) -> Result<TransactionRecord, Error>;

    /// Records for `user_id`, oldest first.
    async fn read_all(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, Error>;
}
