use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{LogId, SessionId};

/// A log flowing through the delivery channel.
///
/// The session-start marker is its own variant so the tracker can skip
/// new-session evaluation for it with a plain match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Log {
    #[serde(rename = "event")]
    Event(EventLog),

    #[serde(rename = "start_session")]
    StartSession(StartSessionLog),
}

impl Log {
    pub fn id(&self) -> &LogId {
        match self {
            Self::Event(log) => &log.id,
            Self::StartSession(log) => &log.id,
        }
    }

    pub fn sid(&self) -> Option<&SessionId> {
        match self {
            Self::Event(log) => log.sid.as_ref(),
            Self::StartSession(log) => log.sid.as_ref(),
        }
    }

    pub fn set_sid(&mut self, sid: SessionId) {
        match self {
            Self::Event(log) => log.sid = Some(sid),
            Self::StartSession(log) => log.sid = Some(sid),
        }
    }

    /// Explicit wall-clock reference timestamp, if the producer knows when the
    /// log really happened.
    pub fn toffset(&self) -> Option<i64> {
        match self {
            Self::Event(log) => log.toffset,
            Self::StartSession(log) => log.toffset,
        }
    }

    pub fn log_type(&self) -> &'static str {
        match self {
            Self::Event(_) => "event",
            Self::StartSession(_) => "start_session",
        }
    }

    pub fn is_start_session(&self) -> bool {
        matches!(self, Self::StartSession(_))
    }
}

impl From<EventLog> for Log {
    fn from(log: EventLog) -> Self {
        Self::Event(log)
    }
}

impl From<StartSessionLog> for Log {
    fn from(log: StartSessionLog) -> Self {
        Self::StartSession(log)
    }
}

/// An application event. Name and properties are opaque to session tracking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventLog {
    pub id: LogId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toffset: Option<i64>,
}

impl EventLog {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LogId::new(),
            name: name.into(),
            properties: Map::new(),
            sid: None,
            toffset: None,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_toffset(mut self, toffset: i64) -> Self {
        self.toffset = Some(toffset);
        self
    }
}

/// Synthetic marker emitted once when a session begins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StartSessionLog {
    pub id: LogId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toffset: Option<i64>,
}

impl StartSessionLog {
    pub fn new() -> Self {
        Self {
            id: LogId::new(),
            sid: None,
            toffset: None,
        }
    }

    pub fn for_session(sid: SessionId) -> Self {
        Self {
            sid: Some(sid),
            ..Self::new()
        }
    }
}

impl Default for StartSessionLog {
    fn default() -> Self {
        Self::new()
    }
}
