use std::sync::Arc;

use shared::{
    domain::LotId,
    protocol::{CommandEnvelope, CommandVerb},
};
use tracing::debug;

use crate::{
    error::{ClientError, ClientResult},
    CommandTransport,
};

/// Stateless builder/forwarder for lot commands. Retry policy belongs to the transport.
#[derive(Clone)]
pub struct CommandDispatcher {
    transport: Arc<dyn CommandTransport>,
}

impl CommandDispatcher {
    pub fn new(transport: Arc<dyn CommandTransport>) -> Self {
        Self { transport }
    }

    pub async fn dispatch(
        &self,
        actor: &str,
        lot_id: LotId,
        verb: &str,
    ) -> ClientResult<CommandEnvelope> {
        let verb: CommandVerb = verb.parse()?;
        self.dispatch_verb(actor, lot_id, verb).await
    }

    pub async fn dispatch_verb(
        &self,
        actor: &str,
        lot_id: LotId,
        verb: CommandVerb,
    ) -> ClientResult<CommandEnvelope> {
        if !lot_id.is_valid() {
            return Err(ClientError::validation(format!(
                "cannot {verb} without a resolved lot"
            )));
        }

        let envelope = CommandEnvelope::new(actor, lot_id, verb);
        debug!(command = verb.as_token(), lot_id = lot_id.0, actor, "dispatching lot command");
        self.transport
            .deliver(envelope.clone())
            .await
            .map_err(ClientError::Transport)?;
        Ok(envelope)
    }
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
