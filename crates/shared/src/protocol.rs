use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::domain::{AreaRecord, LotId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandVerb {
    #[serde(rename = "reserve")]
    Reserve,
    #[serde(rename = "cancel")]
    Cancel,
    #[serde(rename = "checkin")]
    CheckIn,
}

impl CommandVerb {
    pub const ALL: [CommandVerb; 3] = [
        CommandVerb::Reserve,
        CommandVerb::Cancel,
        CommandVerb::CheckIn,
    ];

    /// Wire token sent in the `command` field.
    pub fn as_token(self) -> &'static str {
        match self {
            CommandVerb::Reserve => "reserve",
            CommandVerb::Cancel => "cancel",
            CommandVerb::CheckIn => "checkin",
        }
    }
}

impl fmt::Display for CommandVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown command verb '{0}'")]
pub struct UnknownVerb(pub String);

impl FromStr for CommandVerb {
    type Err = UnknownVerb;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CommandVerb::ALL
            .into_iter()
            .find(|verb| verb.as_token() == s)
            .ok_or_else(|| UnknownVerb(s.to_string()))
    }
}

/// Lot-level instruction delivered to the command backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    #[serde(rename = "username")]
    pub actor: String,
    #[serde(rename = "car_park_id")]
    pub lot_id: LotId,
    #[serde(rename = "command")]
    pub verb: CommandVerb,
}

impl CommandEnvelope {
    pub fn new(actor: impl Into<String>, lot_id: LotId, verb: CommandVerb) -> Self {
        Self {
            actor: actor.into(),
            lot_id,
            verb,
        }
    }
}

/// Body of the area listing endpoint. `success` is the service's own verdict and is
/// independent of the HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaListResponse {
    pub success: bool,
    #[serde(default)]
    pub result: Vec<AreaRecord>,
}
