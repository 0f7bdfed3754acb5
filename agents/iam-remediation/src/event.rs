//! Inbound identity events
//!
//! Events arrive as EventBridge-wrapped CloudTrail records. The payload is
//! untrusted and its shape depends on the API call that produced it, so the
//! actor is looked up along an ordered list of candidate paths instead of
//! being deserialized into a fixed struct.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Candidate paths (below `detail`) holding the actor name, in priority order
pub const ACTOR_PATHS: &[&[&str]] = &[
    &["userIdentity", "userName"],
    &["requestParameters", "userName"],
];

/// Errors raised while loading an event
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Failed to read event: {0}")]
    Io(#[from] std::io::Error),

    #[error("Event is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One inbound identity event
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityEvent(Value);

impl IdentityEvent {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, EventError> {
        Ok(Self(serde_json::from_reader(reader)?))
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EventError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Load from a CLI source: `-` reads `stdin`, anything else is a path
    pub fn load(source: &str, stdin: impl Read) -> Result<Self, EventError> {
        if source == "-" {
            Self::from_reader(stdin)
        } else {
            Self::from_path(source)
        }
    }

    /// The `detail` mapping, if present
    pub fn detail(&self) -> Option<&Value> {
        self.0.get("detail")
    }

    /// Extract the actor to remediate
    ///
    /// Returns the first non-empty string found along [`ACTOR_PATHS`].
    /// Missing keys and non-object intermediates are treated as absent.
    pub fn actor(&self) -> Option<String> {
        let detail = self.detail()?;
        ACTOR_PATHS
            .iter()
            .find_map(|path| lookup_str(detail, path))
            .map(str::to_string)
    }

    /// CloudTrail API call name, for log context only
    pub fn event_name(&self) -> Option<&str> {
        self.detail()
            .and_then(|d| d.get("eventName"))
            .and_then(Value::as_str)
    }

    /// Caller source IP, for log context only
    pub fn source_ip(&self) -> Option<&str> {
        self.detail()
            .and_then(|d| d.get("sourceIPAddress"))
            .and_then(Value::as_str)
    }
}

impl From<Value> for IdentityEvent {
    fn from(raw: Value) -> Self {
        Self(raw)
    }
}

fn lookup_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(root, |node, key| node.get(key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}
