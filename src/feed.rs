//! Async bridge from a data source to a [`MenuSession`]
//!
//! The host publishes [`DataStatus`] values on a `tokio::sync::watch` channel.
//! [`follow`] reconciles the current value, then one value per change
//! notification, until the sender is dropped. A watch channel only keeps the
//! latest value, so bursts of deliveries collapse into one reconciliation.

use crate::session::{MenuSession, ReconcileOutcome};
use crate::types::DataStatus;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

/// Counters for one [`follow`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedSummary {
    /// Statuses handed to the session
    pub deliveries: usize,
    /// `Pending` outcomes
    pub pending: usize,
    /// `Unchanged` outcomes
    pub unchanged: usize,
    /// `Rebuilt` outcomes
    pub rebuilt: usize,
    /// `Rejected` outcomes
    pub rejected: usize,
}

impl FeedSummary {
    fn record(&mut self, outcome: &ReconcileOutcome) {
        self.deliveries += 1;
        match outcome {
            ReconcileOutcome::Pending => self.pending += 1,
            ReconcileOutcome::Unchanged => self.unchanged += 1,
            ReconcileOutcome::Rebuilt { .. } => self.rebuilt += 1,
            ReconcileOutcome::Rejected(_) => self.rejected += 1,
        }
    }
}

/// Reconcile every delivery on `rx` into `session` until the sender closes
pub async fn follow(session: &mut MenuSession, mut rx: watch::Receiver<DataStatus>) -> FeedSummary {
    let mut summary = FeedSummary::default();
    loop {
        let status = rx.borrow_and_update().clone();
        let outcome = session.on_data(status);
        debug!("Feed delivery {}: {:?}", summary.deliveries + 1, outcome);
        summary.record(&outcome);

        if rx.changed().await.is_err() {
            break;
        }
    }
    info!("Data feed closed after {} deliveries", summary.deliveries);
    summary
}

/// Like [`follow`], for a session shared with other tasks
///
/// The lock is held only while one delivery is reconciled, never across an
/// await point, so the future can be spawned on a multi-threaded runtime.
pub async fn follow_shared(
    session: Arc<Mutex<MenuSession>>,
    mut rx: watch::Receiver<DataStatus>,
) -> FeedSummary {
    let mut summary = FeedSummary::default();
    loop {
        let status = rx.borrow_and_update().clone();
        let outcome = {
            let mut guard = session.lock();
            guard.on_data(status)
        };
        summary.record(&outcome);

        if rx.changed().await.is_err() {
            break;
        }
    }
    info!("Data feed closed after {} deliveries", summary.deliveries);
    summary
}
