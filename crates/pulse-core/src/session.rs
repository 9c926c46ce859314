use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::TokenError;
use crate::ids::SessionId;

/// Separator between the start timestamp and the session id in a token.
pub const TOKEN_SEPARATOR: char = '/';

/// A session boundary: identifier plus wall-clock start time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Milliseconds since the UNIX epoch.
    pub started_at_ms: i64,
}

impl Session {
    pub fn new(id: SessionId, started_at_ms: i64) -> Self {
        Self { id, started_at_ms }
    }

    /// Start a brand new session at the given wall-clock instant.
    pub fn start(started_at_ms: i64) -> Self {
        Self::new(SessionId::new(), started_at_ms)
    }

    /// Persisted form: `"<start_ms>/<session_id>"`.
    pub fn to_token(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.started_at_ms, TOKEN_SEPARATOR, self.id)
    }
}

impl FromStr for Session {
    type Err = TokenError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = token.split(TOKEN_SEPARATOR).collect();
        let [start, id] = fields.as_slice() else {
            return Err(TokenError::Arity(fields.len()));
        };
        let started_at_ms = start
            .parse::<i64>()
            .map_err(|_| TokenError::Timestamp((*start).to_string()))?;
        let id = id
            .parse::<SessionId>()
            .map_err(|_| TokenError::SessionId((*id).to_string()))?;
        Ok(Self { id, started_at_ms })
    }
}
