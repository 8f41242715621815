//! Ordered, lot-scoped area list observed by the view layer.

use std::collections::HashSet;

use shared::domain::{AreaId, AreaRecord, LotId};
use tokio::sync::broadcast;

use crate::error::{ClientError, ClientResult};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Minimal diff emitted after each successful mutation so a list view can avoid
/// full redraws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreChange {
    Reset,
    RecordsInserted { start: usize, count: usize },
    RecordMutated { index: usize },
}

pub struct AreaListStore {
    lot_id: LotId,
    records: Vec<AreaRecord>,
    changes: broadcast::Sender<StoreChange>,
}

impl AreaListStore {
    pub fn new(lot_id: LotId) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            lot_id,
            records: Vec::new(),
            changes,
        }
    }

    pub fn initialize(&mut self, lot_id: LotId) {
        self.lot_id = lot_id;
        self.records.clear();
        self.notify(StoreChange::Reset);
    }

    pub fn lot_id(&self) -> LotId {
        self.lot_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }

    /// Appends `records` in order. The batch is applied all-or-nothing.
    pub fn bulk_insert(&mut self, records: Vec<AreaRecord>) -> ClientResult<()> {
        let mut seen: HashSet<AreaId> = self.records.iter().map(|r| r.id).collect();
        for record in &records {
            if record.lot_id != self.lot_id {
                return Err(ClientError::validation(format!(
                    "area {} belongs to lot {}, store holds lot {}",
                    record.id.0, record.lot_id.0, self.lot_id.0
                )));
            }
            if !seen.insert(record.id) {
                return Err(ClientError::validation(format!(
                    "duplicate area id {}",
                    record.id.0
                )));
            }
        }

        if records.is_empty() {
            return Ok(());
        }

        let start = self.records.len();
        let count = records.len();
        self.records.extend(records);
        self.notify(StoreChange::RecordsInserted { start, count });
        Ok(())
    }

    pub fn rename(&mut self, id: AreaId, new_name: &str) -> ClientResult<AreaRecord> {
        let index = self
            .position(id)
            .ok_or(ClientError::NotFound { area_id: id })?;
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return Err(ClientError::validation("area name must not be empty"));
        }

        let record = &mut self.records[index];
        record.name = trimmed.to_string();
        let updated = record.clone();
        self.notify(StoreChange::RecordMutated { index });
        Ok(updated)
    }

    pub fn all(&self) -> &[AreaRecord] {
        &self.records
    }

    pub fn get(&self, id: AreaId) -> Option<&AreaRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn position(&self, id: AreaId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn notify(&self, change: StoreChange) {
        // No subscribers is fine; the view may not be attached yet.
        let _ = self.changes.send(change);
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
