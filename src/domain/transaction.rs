use crate::domain::{Points, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Charge,
    Use,
}

impl core::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransactionKind::Charge => write!(f, "charge"),
            TransactionKind::Use => write!(f, "use"),
        }
    }
}

/// One committed balance change. Append-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    pub id: u64,
    pub user_id: UserId,
    pub amount: Points,
    pub kind: TransactionKind,
    pub updated_millis: u64,
}

impl core::fmt::Display for TransactionRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "#{},{:?},user={},amount={},at={}",
            self.id, self.kind, self.user_id, self.amount, self.updated_millis
        )
    }
}

/// Input command fed to the engine by an ingestion source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Charge { amount: Points },
    Use { amount: Points },
    Balance,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub kind: CommandKind,
    pub user_id: UserId,
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            CommandKind::Charge { amount } | CommandKind::Use { amount } => {
                write!(f, "{:?},user={},amount={}", self.kind, self.user_id, amount)
            }
            _ => write!(f, "{:?},user={}", self.kind, self.user_id),
        }
    }
}
