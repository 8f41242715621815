//! Client core for the lot area screen: keeps the in-memory area list in step with
//! the backend, runs the rename flow, and forwards lot-level commands.

use anyhow::Result;
use async_trait::async_trait;
use shared::{
    domain::{AreaRecord, LotId},
    protocol::{AreaListResponse, CommandEnvelope},
};

pub mod dispatch;
pub mod edit;
pub mod error;
pub mod http;
pub mod screen;
pub mod store;
pub mod sync;

pub use dispatch::CommandDispatcher;
pub use edit::{AreaEditSession, EditOutcome, EditState};
pub use error::{ClientError, ClientResult};
pub use http::HttpBackend;
pub use screen::{AreaListScreen, ScreenArgs, ScreenBackend, ScreenNotice};
pub use store::{AreaListStore, StoreChange};
pub use sync::{AreaSyncController, SyncOutcome};

/// Source of the area listing for a lot.
#[async_trait]
pub trait AreaQuery: Send + Sync {
    async fn get_areas_by_lot(&self, lot_id: LotId) -> Result<AreaListResponse>;
}

/// Receives renamed areas. Callers do not wait on the reply beyond success/failure.
#[async_trait]
pub trait AreaUpdater: Send + Sync {
    async fn update_area(&self, record: AreaRecord) -> Result<()>;
}

#[async_trait]
pub trait CommandTransport: Send + Sync {
    async fn deliver(&self, envelope: CommandEnvelope) -> Result<()>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
