use std::fmt;
use std::str::FromStr;

use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use super::error::DomainError;

/// Opaque 12-byte record identifier, rendered as 24 lowercase hex chars.
///
/// The first four bytes hold the creation second (big-endian), the rest are
/// random, so ids generated later sort after earlier ones at second resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct ObjectId([u8; 12]);

impl ObjectId {
    pub(crate) const HEX_LEN: usize = 24;

    pub(crate) fn generate() -> Self {
        let mut bytes = [0u8; 12];
        let secs = Utc::now().timestamp() as u32;
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        OsRng.fill_bytes(&mut bytes[4..]);
        Self(bytes)
    }

    pub(crate) fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for ObjectId {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let malformed = DomainError::Validation {
            field: "id",
            message: "must be a 24-char hex identifier",
        };
        if raw.len() != Self::HEX_LEN {
            return Err(malformed);
        }

        let mut bytes = [0u8; 12];
        hex::decode_to_slice(raw.to_ascii_lowercase(), &mut bytes).map_err(|_| malformed)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}
