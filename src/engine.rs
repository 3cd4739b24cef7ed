use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;

use futures::StreamExt;
use tracing::info;

use crate::domain::{
    BalanceStore, Command, CommandKind, Error, HistoryStore, UserId,
    traits::{CommandStream, DeadLetterQueue},
};
use crate::service::PointService;

/// Drives a command stream into a [`PointService`]. Up to `concurrency`
/// commands are in flight at once; per-user ordering among them is left to
/// the service's locks.
#[derive(Debug)]
pub struct Engine<I, B, H, D>
where
    I: CommandStream,
    B: BalanceStore + 'static,
    H: HistoryStore + 'static,
    D: DeadLetterQueue,
{
    ingestion: I,
    service: Arc<PointService<B, H>>,
    dlq: D,
    concurrency: usize,
    users: BTreeSet<UserId>,
}

impl<I, B, H, D> Engine<I, B, H, D>
where
    I: CommandStream,
    B: BalanceStore + 'static,
    H: HistoryStore + 'static,
    D: DeadLetterQueue,
{
    pub fn new(
        ingestion: I,
        service: Arc<PointService<B, H>>,
        dlq: D,
        concurrency: usize,
    ) -> Self {
        Self {
            ingestion,
            service,
            dlq,
            concurrency: concurrency.max(1),
            users: BTreeSet::new(),
        }
    }

    pub async fn process(&mut self) -> Result<(), Error> {
        let Self {
            ingestion,
            service,
            dlq,
            concurrency,
            users,
        } = self;
        let service = &**service;
        let dlq = &*dlq;

        ingestion
            .stream()
            .inspect(|cmd| {
                if let Ok(cmd) = cmd {
                    users.insert(cmd.user_id);
                }
            })
            .for_each_concurrent(*concurrency, |cmd| async move {
                let res = match cmd {
                    Ok(cmd) => apply_command(service, cmd).await,
                    Err(e) => Err(e),
                };
                if let Err(e) = res {
                    dlq.report(&e);
                }
            })
            .await;

        Ok(())
    }

    /// Writes `user,point,history` for every user seen so far, by id.
    pub async fn flush<W: Write>(&self, out: W) -> Result<(), Error> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(["user", "point", "history"])?;

        for user_id in &self.users {
            let balance = self.service.balance(*user_id).await?;
            let history = self.service.history(*user_id).await?;
            writer.write_record([
                user_id.to_string(),
                balance.point.to_string(),
                history.len().to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

async fn apply_command<B, H>(service: &PointService<B, H>, cmd: Command) -> Result<(), Error>
where
    B: BalanceStore + 'static,
    H: HistoryStore + 'static,
{
    match cmd.kind {
        CommandKind::Charge { amount } => {
            service.charge(cmd.user_id, amount).await?;
        }
        CommandKind::Use { amount } => {
            service.use_points(cmd.user_id, amount).await?;
        }
        CommandKind::Balance => {
            let balance = service.balance(cmd.user_id).await?;
            info!(user_id = cmd.user_id, point = %balance.point, "balance");
        }
        CommandKind::History => {
            for record in service.history(cmd.user_id).await? {
                info!(user_id = cmd.user_id, "{}", record);
            }
        }
    }
    Ok(())
}
