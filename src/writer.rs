//! Background Ledger Writer
//!
//! Saves run on a Tokio task so the caller never waits on disk. Each job owns
//! an immutable snapshot taken when it was submitted, never a live reference.
//! Failures are logged and dropped.

use crate::ledger::LedgerSnapshot;
use crate::store::BalanceStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct SaveJob {
    identity: String,
    snapshot: LedgerSnapshot,
}

/// Handle to the writer task.
pub struct PersistWriter {
    tx: mpsc::UnboundedSender<SaveJob>,
    handle: JoinHandle<()>,
}

impl PersistWriter {
    /// Spawn the writer on the current Tokio runtime.
    pub fn spawn(store: Arc<dyn BalanceStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<SaveJob>();

        let handle = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                if let Err(e) = store.save(&job.snapshot, &job.identity).await {
                    tracing::warn!(identity = %job.identity, error = %e, "Failed to save ledger");
                }
            }
            tracing::debug!("Ledger writer stopped");
        });

        Self { tx, handle }
    }

    /// Queue a save. Jobs are written in submission order.
    pub fn submit(&self, identity: &str, snapshot: LedgerSnapshot) {
        let job = SaveJob {
            identity: identity.to_string(),
            snapshot,
        };
        if self.tx.send(job).is_err() {
            tracing::warn!(identity, "Ledger writer is gone, dropping save");
        }
    }

    /// Stop accepting jobs and wait for queued saves to finish.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "Ledger writer task failed");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Ledger;
    use crate::reconcile::{reconcile, ObservedTotals};
    use crate::site::Site;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_writer_keeps_submission_order() {
        let store = Arc::new(MemoryStore::new());
        let writer = PersistWriter::spawn(store.clone());

        let mut ledger = Ledger::new();
        for total in [5u32, 9, 3] {
            let observed: ObservedTotals = [(7, total)].into_iter().collect();
            reconcile(&mut ledger, Some(Site::Yanille), &observed);
            writer.submit("zezima", ledger.snapshot());
        }
        writer.close().await;

        let saved = store.load("zezima").unwrap();
        assert_eq!(saved.global_quantity(7), 3);
    }

    #[tokio::test]
    async fn test_snapshot_is_detached_from_ledger() {
        let store = Arc::new(MemoryStore::new());
        let writer = PersistWriter::spawn(store.clone());

        let mut ledger = Ledger::new();
        let observed: ObservedTotals = [(7, 5)].into_iter().collect();
        reconcile(&mut ledger, Some(Site::Yanille), &observed);
        writer.submit("zezima", ledger.snapshot());

        // Mutating after submit must not leak into the queued save
        ledger.reset();
        writer.close().await;

        assert_eq!(store.load("zezima").unwrap().global_quantity(7), 5);
    }
}
