//! Per-user point balances with serialized charge/use.
//!
//! [`PointService`] runs every charge and use for a user under that user's
//! lock from the [`LockRegistry`], so the ceiling and overdraft checks see
//! the same balance that gets written. Users never wait on each other.
//!
//! Storage sits behind [`BalanceStore`] and [`HistoryStore`]; in-memory
//! versions live in [`memory_store`]. The [`Engine`] feeds a CSV command
//! file through the service for the `point_service` binary.

pub mod config;
pub mod dlq;
pub mod domain;
pub mod engine;
pub mod ingestion;
pub mod lock_registry;
pub mod memory_store;
pub mod service;

pub use config::PointConfig;
pub use domain::{
    BalanceStore, Command, CommandKind, Error, HistoryStore, Points, TransactionKind,
    TransactionRecord, UserBalance, UserId,
};
pub use engine::Engine;
pub use lock_registry::{LockHandle, LockRegistry};
pub use service::PointService;
