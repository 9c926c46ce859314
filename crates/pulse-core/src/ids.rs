use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::IdError;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random (v4) identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.hyphenated(), f)
            }
        }

        /// Only the canonical lowercase hyphenated form parses, so a parsed
        /// id always displays as the exact input.
        impl FromStr for $name {
            type Err = IdError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::try_parse(s).map_err(|e| IdError::Malformed(e.to_string()))?;
                if uuid.hyphenated().to_string() != s {
                    return Err(IdError::NotCanonical(s.to_string()));
                }
                Ok(Self(uuid))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

uuid_id!(SessionId);
uuid_id!(LogId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn session_id_is_random_v4() {
        let id = SessionId::new();
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn display_is_hyphenated_lowercase() {
        let uuid = Uuid::parse_str("10ABD355-40A5-4B51-8071-CB5A4C338531").unwrap();
        assert_eq!(
            SessionId::from_uuid(uuid).to_string(),
            "10abd355-40a5-4b51-8071-cb5a4c338531"
        );
    }

    #[test]
    fn non_canonical_forms_rejected() {
        for input in [
            "10ABD355-40A5-4B51-8071-CB5A4C338531",
            "10abd35540a54b518071cb5a4c338531",
            "{10abd355-40a5-4b51-8071-cb5a4c338531}",
            "urn:uuid:10abd355-40a5-4b51-8071-cb5a4c338531",
        ] {
            assert_eq!(
                input.parse::<SessionId>(),
                Err(IdError::NotCanonical(input.to_string())),
                "accepted: {input}"
            );
        }
    }

    #[test]
    fn display_and_from_str_roundtrip() {
        let id = SessionId::new();
        let parsed: SessionId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn malformed_id_rejected() {
        assert!(matches!("invalid".parse::<SessionId>(), Err(IdError::Malformed(_))));
        assert!("".parse::<LogId>().is_err());
        assert!("10abd355-40a5-4b51-8071".parse::<SessionId>().is_err());
    }

    #[test]
    fn serde_is_transparent_string() {
        let id: SessionId = "10abd355-40a5-4b51-8071-cb5a4c338531".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"10abd355-40a5-4b51-8071-cb5a4c338531\"");
        let parsed: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }
}
