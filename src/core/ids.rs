//! Object identifiers of the form `space.type.instance`

use crate::error::{FixtureError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PROTOCOL_SPACE: u8 = 1;
pub const ACCOUNT_TYPE: u8 = 2;
pub const ASSET_TYPE: u8 = 3;
pub const BALANCE_TYPE: u8 = 15;

/// Id of a chain object, rendered as `"1.2.7"`
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId {
    space: u8,
    kind: u8,
    instance: u64,
}

impl ObjectId {
    pub const fn new(space: u8, kind: u8, instance: u64) -> ObjectId {
        ObjectId {
            space,
            kind,
            instance,
        }
    }

    pub const fn account(instance: u64) -> ObjectId {
        ObjectId::new(PROTOCOL_SPACE, ACCOUNT_TYPE, instance)
    }

    pub const fn asset(instance: u64) -> ObjectId {
        ObjectId::new(PROTOCOL_SPACE, ASSET_TYPE, instance)
    }

    pub const fn balance(instance: u64) -> ObjectId {
        ObjectId::new(PROTOCOL_SPACE, BALANCE_TYPE, instance)
    }

    pub fn space(&self) -> u8 {
        self.space
    }

    pub fn kind(&self) -> u8 {
        self.kind
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }

    pub fn is_account(&self) -> bool {
        self.space == PROTOCOL_SPACE && self.kind == ACCOUNT_TYPE
    }

    pub fn is_asset(&self) -> bool {
        self.space == PROTOCOL_SPACE && self.kind == ASSET_TYPE
    }

    pub fn is_balance(&self) -> bool {
        self.space == PROTOCOL_SPACE && self.kind == BALANCE_TYPE
    }

    /// Big-endian instance bytes, used as sled keys so iteration follows id order
    pub fn instance_key(&self) -> [u8; 8] {
        self.instance.to_be_bytes()
    }
}

/// The core asset always occupies the first asset slot
pub const CORE_ASSET_ID: ObjectId = ObjectId::asset(0);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.space, self.kind, self.instance)
    }
}

impl FromStr for ObjectId {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(FixtureError::ObjectNotFound(format!(
                "{s} (expected space.type.instance)"
            )));
        }
        let invalid = |_| FixtureError::ObjectNotFound(format!("{s} (not a valid object id)"));
        Ok(ObjectId {
            space: parts[0].parse().map_err(invalid)?,
            kind: parts[1].parse().map_err(invalid)?,
            instance: parts[2].parse().map_err(invalid)?,
        })
    }
}

impl TryFrom<String> for ObjectId {
    type Error = FixtureError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.to_string()
    }
}
