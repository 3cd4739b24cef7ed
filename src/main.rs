use std::{env, fs::File, io, path::Path, sync::Arc};

use point_service::{
    Engine, Error, PointConfig, PointService,
    dlq::StdErrDLQ,
    ingestion::CsvReader,
    memory_store::{MemoryBalanceStore, MemoryHistoryStore},
};

const USAGE: &str = "usage: point_service <commands.csv> [--concurrency N]";

#[tokio::main] // using Tokio runtime for async
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = PointConfig::from_env()?;

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(config.log_level)
        .init();

    let mut args = env::args().skip(1);
    let file_path = args.next().ok_or(USAGE)?;
    let mut concurrency = 1;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--concurrency" => {
                concurrency = args
                    .next()
                    .and_then(|n| n.parse::<usize>().ok())
                    .ok_or_else(|| Error::Config("--concurrency needs a number".to_string()))?;
            }
            _ => return Err(USAGE.into()),
        }
    }

    let file = File::open(Path::new(&file_path))?;
    let ingestion = CsvReader::new(file);

    // Set up the components
    let mut balances = MemoryBalanceStore::new();
    let mut history = MemoryHistoryStore::new();
    if let Some(latency) = config.store_latency {
        balances = balances.with_latency(latency);
        history = history.with_latency(latency);
    }
    let service = Arc::new(PointService::new(balances, history, config));

    let mut engine = Engine::new(ingestion, service, StdErrDLQ::default(), concurrency);
    engine.process().await?;
    engine.flush(io::stdout().lock()).await?;

    Ok(())
}
