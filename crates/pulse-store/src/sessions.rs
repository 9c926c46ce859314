use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use pulse_core::ids::SessionId;
use pulse_core::session::Session;

use crate::error::StoreError;
use crate::kv::KeyValueStore;

/// Key the ledger is persisted under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "sessions";

/// Number of past session boundaries retained unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 5;

/// Bounded history of session boundaries, persisted as a string set of
/// `"<start_ms>/<session_id>"` tokens under a single key.
///
/// Only used to answer "which session covered this instant". Entries are
/// keyed by start time; corrupt tokens found at load are skipped and vanish
/// from storage on the next [`record`](Self::record).
pub struct SessionLedger {
    store: Arc<dyn KeyValueStore>,
    key: String,
    capacity: usize,
    sessions: BTreeMap<i64, SessionId>,
}

impl SessionLedger {
    /// Load the ledger from `store`. Capacity is clamped to at least one.
    #[instrument(skip_all)]
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        key: impl Into<String>,
        capacity: usize,
    ) -> Result<Self, StoreError> {
        let key = key.into();

        let mut parsed: Vec<Session> = Vec::new();
        for token in store.get_string_set(&key)?.unwrap_or_default() {
            match token.parse::<Session>() {
                Ok(session) => parsed.push(session),
                Err(e) => {
                    warn!(token = %token, kind = e.error_kind(), error = %e, "ignoring invalid session in store");
                }
            }
        }
        parsed.sort_by_key(|s| s.started_at_ms);

        let mut seen = HashSet::new();
        let mut sessions = BTreeMap::new();
        for session in parsed {
            if !seen.insert(session.id) {
                warn!(session_id = %session.id, "ignoring duplicate session in store");
                continue;
            }
            sessions.insert(session.started_at_ms, session.id);
        }

        let capacity = capacity.max(1);
        evict_overflow(&mut sessions, capacity);
        debug!(key = %key, count = sessions.len(), "session ledger loaded");
        Ok(Self {
            store,
            key,
            capacity,
            sessions,
        })
    }

    /// Insert a session boundary, evict the oldest beyond capacity and
    /// persist the full set. On a storage error the ledger is unchanged.
    #[instrument(skip(self, session), fields(session_id = %session.id, started_at_ms = session.started_at_ms))]
    pub fn record(&mut self, session: Session) -> Result<(), StoreError> {
        let mut next = self.sessions.clone();
        next.retain(|_, id| *id != session.id);
        if let Some(replaced) = next.insert(session.started_at_ms, session.id) {
            debug!(replaced = %replaced, "session with identical start time superseded");
        }
        evict_overflow(&mut next, self.capacity);
        self.persist(&next)?;
        self.sessions = next;
        Ok(())
    }

    /// Latest session whose start is at or before `timestamp_ms`.
    pub fn find_covering_session(&self, timestamp_ms: i64) -> Option<Session> {
        self.sessions
            .range(..=timestamp_ms)
            .next_back()
            .map(|(start, id)| Session::new(*id, *start))
    }

    /// Drop every boundary and remove the persisted key.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.store.remove(&self.key)?;
        self.sessions.clear();
        Ok(())
    }

    /// Sessions in ascending start order.
    pub fn sessions(&self) -> Vec<Session> {
        self.sessions
            .iter()
            .map(|(start, id)| Session::new(*id, *start))
            .collect()
    }

    pub fn latest(&self) -> Option<Session> {
        self.sessions
            .last_key_value()
            .map(|(start, id)| Session::new(*id, *start))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn persist(&self, sessions: &BTreeMap<i64, SessionId>) -> Result<(), StoreError> {
        let tokens: BTreeSet<String> = sessions
            .iter()
            .map(|(start, id)| Session::new(*id, *start).to_token())
            .collect();
        self.store.put_string_set(&self.key, &tokens)
    }
}

fn evict_overflow(sessions: &mut BTreeMap<i64, SessionId>, capacity: usize) {
    while sessions.len() > capacity {
        if let Some((start, id)) = sessions.pop_first() {
            debug!(session_id = %id, started_at_ms = start, "evicting oldest session");
        }
    }
}

impl std::fmt::Debug for SessionLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLedger")
            .field("key", &self.key)
            .field("capacity", &self.capacity)
            .field("sessions", &self.sessions)
            .finish()
    }
}
