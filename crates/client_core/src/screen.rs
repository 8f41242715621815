//! Screen-scoped owner for one lot's area list.
//!
//! Everything that mutates the store runs on the context that owns the screen.
//! Background work (the area fetch, remote renames) reports back through channels.

use std::sync::Arc;

use shared::{
    domain::{AreaId, AreaRecord, LotId},
    protocol::{CommandEnvelope, CommandVerb},
};
use tokio::{
    sync::{broadcast, mpsc},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
    dispatch::CommandDispatcher,
    edit::{AreaEditSession, EditOutcome},
    error::{ClientError, ClientResult},
    store::{AreaListStore, StoreChange},
    sync::{AreaSyncController, SyncOutcome},
    AreaQuery, AreaUpdater, CommandTransport,
};

const NOTICE_CHANNEL_CAPACITY: usize = 32;

/// Parameters the screen is opened with.
#[derive(Debug, Clone)]
pub struct ScreenArgs {
    pub lot_id: LotId,
    pub lot_name: String,
}

#[derive(Clone)]
pub struct ScreenBackend {
    pub areas: Arc<dyn AreaQuery>,
    pub updates: Arc<dyn AreaUpdater>,
    pub commands: Arc<dyn CommandTransport>,
}

impl ScreenBackend {
    /// Uses one backend for all three collaborators.
    pub fn from_shared<B>(backend: Arc<B>) -> Self
    where
        B: AreaQuery + AreaUpdater + CommandTransport + 'static,
    {
        Self {
            areas: backend.clone(),
            updates: backend.clone(),
            commands: backend,
        }
    }
}

/// Generic failures surfaced to the user. Neither is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenNotice {
    SyncRejected { lot_id: LotId },
    RemoteUpdateFailed { area_id: AreaId, message: String },
}

pub struct AreaListScreen {
    args: ScreenArgs,
    actor: String,
    store: AreaListStore,
    sync: AreaSyncController,
    outcomes: mpsc::UnboundedReceiver<SyncOutcome>,
    edit: AreaEditSession,
    dispatcher: CommandDispatcher,
    updates: Arc<dyn AreaUpdater>,
    pending_updates: Vec<JoinHandle<()>>,
    notices: broadcast::Sender<ScreenNotice>,
    lifetime: CancellationToken,
}

impl AreaListScreen {
    pub fn new(args: ScreenArgs, actor: impl Into<String>, backend: ScreenBackend) -> Self {
        let lifetime = CancellationToken::new();
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        let (notices, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);
        Self {
            store: AreaListStore::new(args.lot_id),
            sync: AreaSyncController::new(backend.areas, outcome_tx, lifetime.clone()),
            outcomes,
            edit: AreaEditSession::new(),
            dispatcher: CommandDispatcher::new(backend.commands),
            updates: backend.updates,
            pending_updates: Vec::new(),
            notices,
            lifetime,
            args,
            actor: actor.into(),
        }
    }

    pub fn lot_id(&self) -> LotId {
        self.args.lot_id
    }

    pub fn lot_name(&self) -> &str {
        &self.args.lot_name
    }

    pub fn title(&self) -> String {
        format!("Areas {}", self.args.lot_name)
    }

    pub fn store(&self) -> &AreaListStore {
        &self.store
    }

    pub fn areas(&self) -> &[AreaRecord] {
        self.store.all()
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<StoreChange> {
        self.store.subscribe()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<ScreenNotice> {
        self.notices.subscribe()
    }

    /// Kicks off the initial area sync. Returns whether a fetch was started.
    pub fn enter(&mut self) -> bool {
        self.sync.sync(self.args.lot_id)
    }

    pub fn is_syncing(&self) -> bool {
        self.sync.is_in_flight()
    }

    /// Waits for the outstanding fetch to answer and applies the answer to the store.
    /// Returns `None` when nothing is in flight or the screen is torn down first.
    pub async fn next_sync_outcome(&mut self) -> ClientResult<Option<SyncOutcome>> {
        if !self.sync.is_in_flight() {
            return Ok(None);
        }

        let outcome = tokio::select! {
            _ = self.lifetime.cancelled() => return Ok(None),
            outcome = self.outcomes.recv() => outcome,
        };
        match outcome {
            Some(outcome) => {
                self.apply_sync_outcome(&outcome)?;
                Ok(Some(outcome))
            }
            None => Ok(None),
        }
    }

    /// Applies any answers that have already arrived without waiting.
    pub fn drain_sync_outcomes(&mut self) -> ClientResult<usize> {
        let mut applied = 0;
        while let Ok(outcome) = self.outcomes.try_recv() {
            self.apply_sync_outcome(&outcome)?;
            applied += 1;
        }
        Ok(applied)
    }

    fn apply_sync_outcome(&mut self, outcome: &SyncOutcome) -> ClientResult<()> {
        match outcome {
            SyncOutcome::Loaded { lot_id, records } => {
                let result = self.store.bulk_insert(records.clone());
                self.sync.acknowledge(outcome, result.is_ok());
                result?;
                info!(lot_id = lot_id.0, areas = records.len(), "area list populated");
            }
            SyncOutcome::Rejected { lot_id } => {
                self.sync.acknowledge(outcome, false);
                let _ = self
                    .notices
                    .send(ScreenNotice::SyncRejected { lot_id: *lot_id });
            }
        }
        Ok(())
    }

    pub fn begin_edit(&mut self, area_id: AreaId) -> ClientResult<()> {
        let record = self
            .store
            .get(area_id)
            .ok_or(ClientError::NotFound { area_id })?;
        self.edit.begin(record)
    }

    pub fn edit_session(&self) -> &AreaEditSession {
        &self.edit
    }

    /// Updates the dialog text; returns whether confirm is enabled afterwards.
    pub fn edit_text(&mut self, text: impl Into<String>) -> ClientResult<bool> {
        self.edit.set_candidate(text)
    }

    pub fn can_confirm(&self) -> bool {
        self.edit.is_valid()
    }

    /// Renames locally, then pushes the rename to the backend without waiting on it.
    pub fn confirm_edit(&mut self) -> ClientResult<AreaRecord> {
        let record = match self.edit.confirm(&mut self.store)? {
            EditOutcome::Committed(record) => record,
            EditOutcome::Discarded => {
                return Err(ClientError::validation("edit was discarded"));
            }
        };
        info!(area_id = record.id.0, name = %record.name, "area renamed locally");
        self.spawn_remote_update(record.clone());
        Ok(record)
    }

    pub fn dismiss_edit(&mut self) -> ClientResult<()> {
        self.edit.dismiss().map(|_| ())
    }

    fn spawn_remote_update(&mut self, record: AreaRecord) {
        let updates = Arc::clone(&self.updates);
        let notices = self.notices.clone();
        self.pending_updates.retain(|handle| !handle.is_finished());
        self.pending_updates.push(tokio::spawn(async move {
            let area_id = record.id;
            if let Err(err) = updates.update_area(record).await {
                let message = format!("{err:#}");
                warn!(area_id = area_id.0, error = %message, "remote area update failed");
                let _ = notices.send(ScreenNotice::RemoteUpdateFailed { area_id, message });
            }
        }));
    }

    /// Waits for remote renames that are still being delivered.
    pub async fn settle(&mut self) {
        for handle in self.pending_updates.drain(..) {
            let _ = handle.await;
        }
    }

    pub async fn dispatch(&self, verb: &str) -> ClientResult<CommandEnvelope> {
        self.dispatcher
            .dispatch(&self.actor, self.args.lot_id, verb)
            .await
    }

    pub async fn dispatch_verb(&self, verb: CommandVerb) -> ClientResult<CommandEnvelope> {
        self.dispatcher
            .dispatch_verb(&self.actor, self.args.lot_id, verb)
            .await
    }

    /// Stops the area sync. Remote renames already issued keep running.
    pub fn teardown(&mut self) {
        self.lifetime.cancel();
        self.sync.cancel();
        let _ = self.edit.dismiss();
    }
}

impl Drop for AreaListScreen {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
#[path = "tests/screen_tests.rs"]
mod tests;
