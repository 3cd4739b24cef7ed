pub mod error;
pub mod points;
pub mod traits;
pub mod transaction;
pub mod user_balance;

pub type UserId = u64;

pub use error::Error;
pub use points::Points;
pub use traits::{BalanceStore, CommandStream, DeadLetterQueue, HistoryStore};
pub use transaction::{Command, CommandKind, TransactionKind, TransactionRecord};
pub use user_balance::{UserBalance, now_millis};
