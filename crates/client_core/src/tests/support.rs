use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{AreaId, AreaRecord, LotId},
    protocol::{AreaListResponse, CommandEnvelope},
};
use tokio::sync::Mutex;

use crate::{AreaQuery, AreaUpdater, CommandTransport};

pub(crate) fn area(id: i64, name: &str, lot_id: i64) -> AreaRecord {
    AreaRecord::new(AreaId(id), name, LotId(lot_id))
}

pub(crate) fn loaded(records: Vec<AreaRecord>) -> AreaListResponse {
    AreaListResponse {
        success: true,
        result: records,
    }
}

/// Fails with a transport error for the first `failures` calls, then keeps answering
/// with `response`.
pub(crate) struct ScriptedAreaQuery {
    failures: usize,
    response: AreaListResponse,
    calls: AtomicUsize,
    requested: Mutex<Vec<LotId>>,
}

impl ScriptedAreaQuery {
    pub(crate) fn failing_then(failures: usize, response: AreaListResponse) -> Arc<Self> {
        Arc::new(Self {
            failures,
            response,
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn answering(response: AreaListResponse) -> Arc<Self> {
        Self::failing_then(0, response)
    }

    pub(crate) fn always_failing() -> Arc<Self> {
        Self::failing_then(usize::MAX, loaded(Vec::new()))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) async fn requested(&self) -> Vec<LotId> {
        self.requested.lock().await.clone()
    }
}

#[async_trait]
impl AreaQuery for ScriptedAreaQuery {
    async fn get_areas_by_lot(&self, lot_id: LotId) -> Result<AreaListResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requested.lock().await.push(lot_id);
        if call <= self.failures {
            return Err(anyhow!("connection reset on attempt {call}"));
        }
        Ok(self.response.clone())
    }
}

#[derive(Default)]
pub(crate) struct RecordingUpdater {
    fail_with: Option<String>,
    pub(crate) updated: Mutex<Vec<AreaRecord>>,
}

impl RecordingUpdater {
    pub(crate) fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn failing(err: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(err.into()),
            updated: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl AreaUpdater for RecordingUpdater {
    async fn update_area(&self, record: AreaRecord) -> Result<()> {
        self.updated.lock().await.push(record);
        if let Some(err) = &self.fail_with {
            return Err(anyhow!(err.clone()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingTransport {
    fail_with: Option<String>,
    pub(crate) delivered: Mutex<Vec<CommandEnvelope>>,
}

impl RecordingTransport {
    pub(crate) fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn failing(err: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            fail_with: Some(err.into()),
            delivered: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CommandTransport for RecordingTransport {
    async fn deliver(&self, envelope: CommandEnvelope) -> Result<()> {
        if let Some(err) = &self.fail_with {
            return Err(anyhow!(err.clone()));
        }
        self.delivered.lock().await.push(envelope);
        Ok(())
    }
}
