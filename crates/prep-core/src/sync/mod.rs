//! Offline-first synchronization with the remote mirror.
//!
//! Local writes are the only trigger for remote calls. A write that can't reach
//! the remote is queued in the local database and replayed by a background
//! retry loop; on startup the engine reconciles the full remote dataset against
//! the local store once.

mod bridge;
mod dispatcher;
mod engine;
mod mutation;
mod queue;
#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

pub use bridge::SyncBridge;
pub use dispatcher::{Dispatch, MutationDispatcher};
pub use engine::{
    FlushReport, HydrationCallback, InitOutcome, MutationOutcome, SyncEngine, SyncReport,
    DEFAULT_RETRY_INTERVAL,
};
pub use mutation::{Change, Mutation};
pub use queue::SyncQueue;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The remote call failed; the mutation should be retried later
    #[error("sync failed")]
    RemoteUnavailable,
    #[error(transparent)]
    Store(#[from] crate::Error),
}
