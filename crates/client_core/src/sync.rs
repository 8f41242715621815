//! Fetch-and-populate protocol for the area list.
//!
//! The controller owns a single background fetch task. Transport failures are
//! retried immediately and without limit until the service answers or the screen
//! lifetime token is cancelled. Answers are handed back to the owner over a channel;
//! the controller itself never touches the store.

use std::sync::Arc;

use shared::domain::{AreaRecord, LotId};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::AreaQuery;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Loaded {
        lot_id: LotId,
        records: Vec<AreaRecord>,
    },
    /// The service answered with `success = false`. Not retried.
    Rejected { lot_id: LotId },
}

pub struct AreaSyncController {
    query: Arc<dyn AreaQuery>,
    outcomes: mpsc::UnboundedSender<SyncOutcome>,
    lifetime: CancellationToken,
    inflight: Option<JoinHandle<()>>,
    populated: bool,
}

impl AreaSyncController {
    pub fn new(
        query: Arc<dyn AreaQuery>,
        outcomes: mpsc::UnboundedSender<SyncOutcome>,
        lifetime: CancellationToken,
    ) -> Self {
        Self {
            query,
            outcomes,
            lifetime,
            inflight: None,
            populated: false,
        }
    }

    /// Starts a fetch for `lot_id`. Returns whether a fetch was actually started.
    pub fn sync(&mut self, lot_id: LotId) -> bool {
        if !lot_id.is_valid() {
            debug!(lot_id = lot_id.0, "no resolved lot; skipping area sync");
            return false;
        }
        if self.lifetime.is_cancelled() {
            debug!(lot_id = lot_id.0, "screen torn down; skipping area sync");
            return false;
        }
        if self.populated {
            debug!(lot_id = lot_id.0, "area list already populated");
            return false;
        }
        if self.inflight.is_some() {
            debug!(lot_id = lot_id.0, "area sync already in flight");
            return false;
        }

        let task = fetch_until_answered(
            Arc::clone(&self.query),
            lot_id,
            self.lifetime.clone(),
            self.outcomes.clone(),
        );
        self.inflight = Some(tokio::spawn(task));
        true
    }

    /// A fetch counts as outstanding until its outcome has been acknowledged.
    pub fn is_in_flight(&self) -> bool {
        self.inflight.is_some()
    }

    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Called by the owner once it has applied `outcome`.
    pub fn acknowledge(&mut self, outcome: &SyncOutcome, populated: bool) {
        self.inflight = None;
        if matches!(outcome, SyncOutcome::Loaded { .. }) && populated {
            self.populated = true;
        }
    }

    pub fn cancel(&mut self) {
        self.lifetime.cancel();
        if let Some(handle) = self.inflight.take() {
            handle.abort();
        }
    }
}

impl Drop for AreaSyncController {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn fetch_until_answered(
    query: Arc<dyn AreaQuery>,
    lot_id: LotId,
    lifetime: CancellationToken,
    outcomes: mpsc::UnboundedSender<SyncOutcome>,
) {
    let mut attempt: u64 = 0;
    loop {
        attempt += 1;
        debug!(lot_id = lot_id.0, attempt, "fetching areas");

        let response = tokio::select! {
            biased;
            _ = lifetime.cancelled() => {
                debug!(lot_id = lot_id.0, attempt, "area sync cancelled");
                return;
            }
            response = query.get_areas_by_lot(lot_id) => response,
        };

        let outcome = match response {
            Ok(body) if body.success => {
                info!(
                    lot_id = lot_id.0,
                    attempt,
                    areas = body.result.len(),
                    "area list fetched"
                );
                SyncOutcome::Loaded {
                    lot_id,
                    records: body.result,
                }
            }
            Ok(_) => {
                warn!(lot_id = lot_id.0, attempt, "area listing rejected by service");
                SyncOutcome::Rejected { lot_id }
            }
            Err(err) => {
                warn!(
                    lot_id = lot_id.0,
                    attempt,
                    error = %format!("{err:#}"),
                    "area fetch failed; retrying"
                );
                // No backoff, but give the owner and the cancel signal a chance to run.
                tokio::task::yield_now().await;
                continue;
            }
        };

        if outcomes.send(outcome).is_err() {
            debug!(lot_id = lot_id.0, "area sync owner is gone");
        }
        return;
    }
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
