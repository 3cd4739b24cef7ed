use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::config::PointConfig;
use crate::domain::{
    BalanceStore, Error, HistoryStore, Points, TransactionKind, TransactionRecord, UserBalance,
    UserId,
};
use crate::lock_registry::LockRegistry;

/// Per-user point balances. Charge and use for the same user are
/// serialized through that user's lock; different users never contend.
///
/// Once a charge or use holds the lock, its read-check-write-append section
/// runs on its own task and always completes, even if the caller's future
/// is dropped. A cancelled caller can therefore miss the result but never
/// leave a balance change without its history record.
#[derive(Debug)]
pub struct PointService<B, H>
where
    B: BalanceStore + 'static,
    H: HistoryStore + 'static,
{
    balances: Arc<B>,
    history: Arc<H>,
    locks: LockRegistry,
    config: PointConfig,
}

impl<B, H> PointService<B, H>
where
    B: BalanceStore + 'static,
    H: HistoryStore + 'static,
{
    pub fn new(balances: B, history: H, config: PointConfig) -> Self {
        Self {
            balances: Arc::new(balances),
            history: Arc::new(history),
            locks: LockRegistry::new(),
            config,
        }
    }

    pub fn balances(&self) -> &B {
        &self.balances
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    /// Unlocked read; may observe a balance from before or after an
    /// in-flight change.
    pub async fn balance(&self, user_id: UserId) -> Result<UserBalance, Error> {
        self.balances.read(user_id).await
    }

    pub async fn history(&self, user_id: UserId) -> Result<Vec<TransactionRecord>, Error> {
        self.history.read_all(user_id).await
    }

    pub async fn charge(&self, user_id: UserId, amount: Points) -> Result<UserBalance, Error> {
        ensure_positive(TransactionKind::Charge, amount)?;

        let max_balance = self.config.max_balance;
        self.run_locked(user_id, amount, TransactionKind::Charge, move |point| {
            point
                .checked_add(amount)
                .filter(|next| *next <= max_balance)
                .ok_or_else(|| {
                    warn!(user_id, %amount, %point, %max_balance, "charge rejected");
                    Error::BalanceCeilingExceeded { max_balance }
                })
        })
        .await
    }

    pub async fn use_points(&self, user_id: UserId, amount: Points) -> Result<UserBalance, Error> {
        ensure_positive(TransactionKind::Use, amount)?;

        self.run_locked(user_id, amount, TransactionKind::Use, move |point| {
            point
                .checked_sub(amount)
                .filter(|next| *next >= Points::ZERO)
                .ok_or_else(|| {
                    warn!(user_id, %amount, %point, "use rejected");
                    Error::InsufficientBalance { current: point }
                })
        })
        .await
    }

    /// Takes the user's lock, then reads the balance, lets `next_point`
    /// validate the change, writes it and appends the record.
    async fn run_locked<F>(
        &self,
        user_id: UserId,
        amount: Points,
        kind: TransactionKind,
        next_point: F,
    ) -> Result<UserBalance, Error>
    where
        F: FnOnce(Points) -> Result<Points, Error> + Send + 'static,
    {
        let guard = self.lock(user_id).await?;
        let balances = self.balances.clone();
        let history = self.history.clone();

        let section = tokio::spawn(async move {
            let _guard = guard;
            let current = balances.read(user_id).await?;
            let next = next_point(current.point)?;

            let updated = balances.write(user_id, next).await?;
            let record = history
                .append(user_id, amount, kind, updated.updated_millis)
                .await?;

            let point = updated.point;
            info!(user_id, %kind, %amount, %point, record = record.id, "committed");
            Ok::<_, Error>(updated)
        });

        match section.await {
            Ok(res) => res,
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(Error::Store(format!("update of user {} aborted: {}", user_id, e))),
        }
    }

    async fn lock(&self, user_id: UserId) -> Result<OwnedMutexGuard<()>, Error> {
        let handle = self.locks.acquire(user_id);
        let guard = match self.config.lock_timeout {
            Some(timeout) => tokio::time::timeout(timeout, handle.lock_owned())
                .await
                .map_err(|_| {
                    warn!(user_id, ?timeout, "lock wait timed out");
                    Error::LockTimeout { user_id }
                })?,
            None => handle.lock_owned().await,
        };
        debug!(user_id, "lock acquired");
        Ok(guard)
    }
}

fn ensure_positive(kind: TransactionKind, amount: Points) -> Result<(), Error> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(Error::InvalidAmount { kind, amount })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::memory_store::{MemoryBalanceStore, MemoryHistoryStore};

    fn service_with(
        user_id: UserId,
        point: i64,
        max_balance: i64,
    ) -> PointService<MemoryBalanceStore, MemoryHistoryStore> {
        PointService::new(
            MemoryBalanceStore::new().with_balance(user_id, point),
            MemoryHistoryStore::new(),
            PointConfig::new(Points(max_balance)),
        )
    }

    #[tokio::test]
    async fn balance_of_unknown_user_is_zero() {
        let service = service_with(1, 1000, 100_000);
        let balance = service.balance(9).await.unwrap();
        assert_eq!(balance.point, Points::ZERO);
        assert!(service.history(9).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn charge_adds_and_records() {
        let service = service_with(1, 1000, 100_000);

        let updated = service.charge(1, Points(50)).await.unwrap();
        assert_eq!(updated.point, Points(1050));

        let history = service.history(1).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, TransactionKind::Charge);
        assert_eq!(history[0].amount, Points(50));
        assert_eq!(history[0].updated_millis, updated.updated_millis);
    }

    #[tokio::test]
    async fn charge_past_ceiling_changes_nothing() {
        let service = service_with(1, 1000, 100_000);

        let err = service.charge(1, Points(999_999)).await.unwrap_err();
        assert!(matches!(
            err,
            Error::BalanceCeilingExceeded { max_balance } if max_balance == Points(100_000)
        ));
        assert_eq!(
            err.to_string(),
            "Balance after charge cannot exceed 100000 points"
        );
        assert_eq!(service.balance(1).await.unwrap().point, Points(1000));
        assert!(service.history(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn charge_up_to_ceiling_is_allowed() {
        let service = service_with(1, 1000, 1500);
        let updated = service.charge(1, Points(500)).await.unwrap();
        assert_eq!(updated.point, Points(1500));
    }

    #[tokio::test]
    async fn charge_overflow_is_a_ceiling_error() {
        let service = service_with(1, 1000, i64::MAX);
        let err = service.charge(1, Points(i64::MAX)).await.unwrap_err();
        assert!(matches!(err, Error::BalanceCeilingExceeded { .. }));
    }

    #[tokio::test]
    async fn non_positive_amounts_are_invalid() {
        let service = service_with(1, 1000, 100_000);

        for amount in [Points(0), Points(-50)] {
            let err = service.charge(1, amount).await.unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidAmount { kind: TransactionKind::Charge, .. }
            ));
            let err = service.use_points(1, amount).await.unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidAmount { kind: TransactionKind::Use, .. }
            ));
            assert!(err.is_rejection());
        }

        assert_eq!(service.balance(1).await.unwrap().point, Points(1000));
        // rejected before any lock was created
        assert!(service.locks().is_empty());
    }

    #[tokio::test]
    async fn use_subtracts_and_records() {
        let service = service_with(1, 1000, 100_000);

        let updated = service.use_points(1, Points(50)).await.unwrap();
        assert_eq!(updated.point, Points(950));

        let history = service.history(1).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].kind, TransactionKind::Use);
        assert_eq!(history[0].amount, Points(50));
    }

    #[tokio::test]
    async fn use_more_than_balance_reports_current() {
        let service = service_with(1, 30, 100_000);

        let err = service.use_points(1, Points(50)).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientBalance { current } if current == Points(30)));
        assert_eq!(service.balance(1).await.unwrap().point, Points(30));
        assert!(service.history(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn use_entire_balance_leaves_zero() {
        let service = service_with(1, 30, 100_000);
        let updated = service.use_points(1, Points(30)).await.unwrap();
        assert_eq!(updated.point, Points::ZERO);
    }

    #[tokio::test]
    async fn lock_is_released_after_rejection() {
        let service = service_with(1, 30, 100);

        assert!(service.use_points(1, Points(50)).await.is_err());
        assert!(service.charge(1, Points(500)).await.is_err());

        // a leaked guard would hang here
        let updated = service.charge(1, Points(20)).await.unwrap();
        assert_eq!(updated.point, Points(50));
    }

    #[tokio::test]
    async fn history_keeps_commit_order() {
        let service = service_with(1, 0, 100_000);

        service.charge(1, Points(100)).await.unwrap();
        service.use_points(1, Points(30)).await.unwrap();
        let _ = service.use_points(1, Points(500)).await;
        service.charge(1, Points(5)).await.unwrap();

        let history = service.history(1).await.unwrap();
        let summary: Vec<_> = history
            .iter()
            .map(|record| (record.kind, record.amount.value()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (TransactionKind::Charge, 100),
                (TransactionKind::Use, 30),
                (TransactionKind::Charge, 5),
            ]
        );
        assert_eq!(service.balance(1).await.unwrap().point, Points(75));
    }

    #[tokio::test]
    async fn abandoned_charge_still_commits_with_its_record() {
        let service = PointService::new(
            MemoryBalanceStore::new().with_balance(1, 1000),
            MemoryHistoryStore::new().with_latency(Duration::from_millis(200)),
            PointConfig::default(),
        );

        // Caller gives up while the history append is still in flight.
        let charge = service.charge(1, Points(50));
        let res = tokio::time::timeout(Duration::from_millis(50), charge).await;
        assert!(res.is_err());

        // Waits on the lock until the abandoned charge has finished.
        let updated = service.use_points(1, Points(10)).await.unwrap();
        assert_eq!(updated.point, Points(1040));

        let history = service.history(1).await.unwrap();
        let summary: Vec<_> = history
            .iter()
            .map(|record| (record.kind, record.amount.value()))
            .collect();
        assert_eq!(
            summary,
            vec![(TransactionKind::Charge, 50), (TransactionKind::Use, 10)]
        );
    }
}
