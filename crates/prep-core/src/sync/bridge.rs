//! Wires local store writes and app startup to the sync engine

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{HydrationCallback, Mutation, SyncEngine};
use crate::config::SyncSettings;
use crate::error::Result;
use crate::remote::{HttpRemoteClient, RemoteClient};
use crate::services::LocalStore;

pub struct SyncBridge {
    store: Arc<dyn LocalStore>,
    engine: SyncEngine,
    test_mode: bool,
    setup_done: AtomicBool,
}

impl SyncBridge {
    pub fn new(store: Arc<dyn LocalStore>, engine: SyncEngine, test_mode: bool) -> Self {
        Self {
            store,
            engine,
            test_mode,
            setup_done: AtomicBool::new(false),
        }
    }

    /// Build a bridge talking HTTP to the configured remote
    ///
    /// Returns `Ok(None)` when no remote base URL is configured.
    pub fn from_settings(store: Arc<dyn LocalStore>, settings: &SyncSettings) -> Result<Option<Self>> {
        let Some(base_url) = settings.api_base_url.as_deref() else {
            tracing::info!("No remote configured; running local-only");
            return Ok(None);
        };

        let remote = HttpRemoteClient::new(base_url, settings.request_timeout)?;
        tracing::info!("Sync enabled against {}", remote.base_url());
        let engine = SyncEngine::new(
            Arc::clone(&store),
            Arc::new(remote) as Arc<dyn RemoteClient>,
            settings.retry_interval,
        );
        Ok(Some(Self::new(store, engine, settings.test_mode)))
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    /// Forward local writes to the remote and start reconciliation
    ///
    /// Writes reach the engine through one channel drained by a single task,
    /// so they are dispatched (or queued) in the order they were made.
    /// Runs once per bridge and never in test mode; returns the startup task,
    /// or `None` when setup was skipped. Must be called inside a tokio runtime.
    pub fn setup_sync(&self, on_hydrated: Option<HydrationCallback>) -> Option<JoinHandle<()>> {
        if self.test_mode {
            tracing::debug!("Test mode; skipping sync setup");
            return None;
        }
        if self.setup_done.swap(true, Ordering::SeqCst) {
            return None;
        }

        let (sender, receiver) = mpsc::unbounded_channel();
        self.store
            .set_mutation_observer(Some(Arc::new(move |mutation| {
                if sender.send(mutation).is_err() {
                    tracing::debug!("Sync forwarder stopped; dropping mutation");
                }
            })));
        tokio::spawn(forward_mutations(self.engine.clone(), receiver));

        let engine = self.engine.clone();
        Some(tokio::spawn(async move {
            if let Err(error) = engine.init_sync_with(on_hydrated).await {
                tracing::warn!("Startup reconciliation failed: {error}");
            }
        }))
    }

    /// Detach from the store and stop retrying
    ///
    /// Dropping the observer closes the channel; the forwarder finishes the
    /// writes already sent and exits.
    pub fn shutdown(&self) {
        self.store.set_mutation_observer(None);
        self.engine.stop_retry_loop();
    }
}

async fn forward_mutations(engine: SyncEngine, mut receiver: mpsc::UnboundedReceiver<Mutation>) {
    while let Some(mutation) = receiver.recv().await {
        if let Err(error) = engine.record_mutation(mutation).await {
            tracing::warn!("Failed to record mutation for sync: {error}");
        }
    }
    tracing::debug!("Sync forwarder finished");
}
