//! Database layer for preptrack

mod connection;
mod migrations;
mod queue_repository;
mod repository;

pub use connection::Database;
pub use queue_repository::LibSqlQueueRepository;
pub use repository::{LibSqlTable, Record};
