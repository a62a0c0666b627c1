//! Type-prefixed opaque node identifiers.
//!
//! Every entity leaves the API as a node id of the form `<Type>:<rawId>`
//! (for example `Todo:01HZX3N4V8M6Q2K9T7R5W1Y0PB`) and every `id` argument a
//! client sends back is decoded here. Keeping the split in one place means
//! the rules below hold for every call site:
//!
//! - the type tag must be one of [`EntityType::ALL`] (case-sensitive)
//! - the raw id must be non-empty
//! - the raw id must not contain the separator, so `User:a:b` and
//!   `Todo:User:1` are rejected rather than silently truncated

use crate::error::NodeIdError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Separator between the type tag and the raw id.
pub const NODE_ID_SEPARATOR: char = ':';

/// The entity types that can be addressed by a node id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityType {
    Todo,
    User,
}

impl EntityType {
    pub const ALL: [EntityType; 2] = [EntityType::Todo, EntityType::User];

    /// The type tag used in encoded node ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Todo => "Todo",
            EntityType::User => "User",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityType::ALL
            .into_iter()
            .find(|entity_type| entity_type.as_str() == s)
            .ok_or(())
    }
}

/// A decoded node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub entity_type: EntityType,
    pub raw_id: String,
}

impl NodeId {
    pub fn new(entity_type: EntityType, raw_id: impl Into<String>) -> Self {
        Self {
            entity_type,
            raw_id: raw_id.into(),
        }
    }

    pub fn encode(&self) -> String {
        encode(self.entity_type, &self.raw_id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.entity_type, NODE_ID_SEPARATOR, self.raw_id)
    }
}

impl FromStr for NodeId {
    type Err = NodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        decode(&value).map_err(de::Error::custom)
    }
}

/// Encodes a raw id as a node id.
///
/// The caller guarantees that `raw_id` is non-empty and free of the
/// separator; ids produced by the storage layer (ULIDs) always are.
pub fn encode(entity_type: EntityType, raw_id: &str) -> String {
    debug_assert!(!raw_id.is_empty() && !raw_id.contains(NODE_ID_SEPARATOR));
    format!("{}{}{}", entity_type, NODE_ID_SEPARATOR, raw_id)
}

/// Decodes a node id of any known entity type.
pub fn decode(value: &str) -> Result<NodeId, NodeIdError> {
    let malformed = || NodeIdError::Malformed {
        value: value.to_string(),
    };

    let (tag, raw_id) = value.split_once(NODE_ID_SEPARATOR).ok_or_else(malformed)?;
    let entity_type = tag.parse::<EntityType>().map_err(|_| malformed())?;

    if raw_id.is_empty() || raw_id.contains(NODE_ID_SEPARATOR) {
        return Err(malformed());
    }

    Ok(NodeId::new(entity_type, raw_id))
}

/// Decodes a node id that must tag `expected` and returns its raw id.
///
/// A well-formed id of another type is a [`NodeIdError::WrongType`] so that
/// passing a `User` id where a `Todo` id is expected is reported as bad input
/// rather than as a missing todo.
pub fn decode_as(expected: EntityType, value: &str) -> Result<String, NodeIdError> {
    let node_id = decode(value)?;
    if node_id.entity_type != expected {
        return Err(NodeIdError::WrongType {
            expected,
            found: node_id.entity_type,
        });
    }
    Ok(node_id.raw_id)
}
