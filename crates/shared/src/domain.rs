use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);
    };
}

id_newtype!(LotId);
id_newtype!(AreaId);

impl LotId {
    /// Screens can be opened before a lot is resolved; those carry a negative id.
    pub const UNRESOLVED: LotId = LotId(-1);

    pub fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

/// One named subdivision (level, zone) of a parking lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaRecord {
    pub id: AreaId,
    pub name: String,
    #[serde(rename = "car_park_id")]
    pub lot_id: LotId,
}

impl AreaRecord {
    pub fn new(id: AreaId, name: impl Into<String>, lot_id: LotId) -> Self {
        Self {
            id,
            name: name.into(),
            lot_id,
        }
    }
}
