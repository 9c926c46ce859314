/// Reasons a persisted `"<start_ms>/<session_id>"` token can be rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("expected 2 '/'-separated fields, found {0}")]
    Arity(usize),

    #[error("invalid start timestamp: {0}")]
    Timestamp(String),

    #[error("invalid session id: {0}")]
    SessionId(String),
}

/// Reasons an identifier string can be rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("malformed id: {0}")]
    Malformed(String),

    #[error("id not in lowercase hyphenated form: {0}")]
    NotCanonical(String),
}

impl TokenError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Arity(_) => "arity",
            Self::Timestamp(_) => "timestamp",
            Self::SessionId(_) => "session_id",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            TokenError::Arity(3).to_string(),
            "expected 2 '/'-separated fields, found 3"
        );
        assert_eq!(
            TokenError::Timestamp("500a".into()).to_string(),
            "invalid start timestamp: 500a"
        );
    }

    #[test]
    fn id_error_messages() {
        assert_eq!(
            IdError::NotCanonical("{x}".into()).to_string(),
            "id not in lowercase hyphenated form: {x}"
        );
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(TokenError::Arity(1).error_kind(), "arity");
        assert_eq!(TokenError::Timestamp(String::new()).error_kind(), "timestamp");
        assert_eq!(TokenError::SessionId(String::new()).error_kind(), "session_id");
    }
}
