use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{
    BalanceStore, Error, HistoryStore, Points, TransactionKind, TransactionRecord, UserBalance,
    UserId, now_millis,
};

async fn simulate_latency(latency: Option<Duration>) {
    if let Some(latency) = latency {
        tokio::time::sleep(latency).await;
    }
}

#[derive(Default, Debug)]
pub struct MemoryBalanceStore {
    balances: DashMap<UserId, UserBalance>,
    latency: Option<Duration>,
}

impl MemoryBalanceStore {
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
            latency: None,
        }
    }

    /// Sleep before every call, standing in for a slow backing table.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Seeds a starting balance.
    ///
    /// # Panics
    ///
    /// Panics if `point` is negative.
    pub fn with_balance(self, user_id: UserId, point: impl Into<Points>) -> Self {
        let point = point.into();
        assert!(point >= Points::ZERO, "negative seed balance {}", point);
        self.balances
            .insert(user_id, UserBalance::new(user_id, point, now_millis()));
        self
    }
}

#[async_trait]
impl BalanceStore for MemoryBalanceStore {
    async fn read(&self, user_id: UserId) -> Result<UserBalance, Error> {
        simulate_latency(self.latency).await;
        Ok(self
            .balances
            .get(&user_id)
            .map(|b| b.value().clone())
            .unwrap_or_else(|| UserBalance::empty(user_id)))
    }

    async fn write(&self, user_id: UserId, point: Points) -> Result<UserBalance, Error> {
        simulate_latency(self.latency).await;
        let balance = UserBalance::new(user_id, point, now_millis());
        self.balances.insert(user_id, balance.clone());
        Ok(balance)
    }
}

#[derive(Default, Debug)]
pub struct MemoryHistoryStore {
    records: Mutex<Vec<TransactionRecord>>,
    latency: Option<Duration>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(
        &self,
        user_id: UserId,
        amount: Points,
        kind: TransactionKind,
        updated_millis: u64,
    ) -> Result<TransactionRecord, Error> {
        simulate_latency(self.latency).await;
        let mut records = self
            .records
            .lock()
            .map_err(|_| Error::Store("history mutex poisoned".to_string()))?;

        let record = TransactionRecord {
            id: records.len() as u64 + 1,
            user_id,
            amount,
            kind,
            updated_millis,
        };
        records.push(record.clone());
        Ok(record)
    }

    async fn read_all(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, Error> {
        simulate_latency(self.latency).await;
        let records = self
            .records
            .lock()
            .map_err(|_| Error::Store("history mutex poisoned".to_string()))?;

        Ok(records
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}
