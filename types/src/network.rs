//! Network identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one configured chain endpoint.
///
/// Networks are loaded from configuration and never change at runtime. The id
/// is the small integer the operator assigns (typically the EVM chain id).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(u32);

impl NetworkId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Big-endian bytes, used as the leading component of store keys so that
    /// all rows of one network sort together.
    pub fn to_be_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NetworkId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}
