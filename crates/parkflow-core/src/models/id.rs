use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// A backend identifier. Services disagree on numeric vs string ids, so
/// both are accepted and kept as text for use in paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        EntityId(value.to_string())
    }
}

impl From<i64> for EntityId {
    fn from(value: i64) -> Self {
        EntityId(value.to_string())
    }
}

/// Response to a create call: just the new id
#[derive(Debug, Clone, Deserialize)]
pub struct Created {
    pub id: EntityId,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Str(String),
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(value) => EntityId(value.to_string()),
            RawId::Str(value) => EntityId(value),
        })
    }
}
