use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, instrument};

use pulse_core::clock::Clock;
use pulse_core::events::{Log, StartSessionLog};
use pulse_core::session::Session;
use pulse_store::{KeyValueStore, SessionLedger, StoreError};

use crate::config::TrackerConfig;
use crate::error::EngineError;
use crate::sink::{EnqueueListener, EventSink};

/// Assigns a session identifier to every outgoing log.
///
/// A new session starts lazily on the first log after a background gap
/// longer than the configured timeout. Logs carrying a reference timestamp
/// are correlated against past session boundaries instead. All state
/// transitions happen under one lock; the session-start marker is handed to
/// the sink after the lock is released, so a sink that feeds logs back into
/// [`on_enqueuing_log`](Self::on_enqueuing_log) does not deadlock.
pub struct SessionTracker {
    config: TrackerConfig,
    timeout_ms: u64,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn EventSink>,
    state: Mutex<TrackerState>,
}

struct TrackerState {
    ledger: SessionLedger,
    current: Option<Session>,
    foreground: bool,
    /// Elapsed-clock readings.
    last_queued_ms: u64,
    last_resumed_ms: Option<u64>,
    last_paused_ms: Option<u64>,
}

impl TrackerState {
    fn new(ledger: SessionLedger) -> Self {
        Self {
            ledger,
            current: None,
            foreground: false,
            last_queued_ms: 0,
            last_resumed_ms: None,
            last_paused_ms: None,
        }
    }

    /// Latest known session starting at or before `timestamp_ms`.
    fn covering_session(&self, timestamp_ms: i64) -> Option<Session> {
        let stored = self.ledger.find_covering_session(timestamp_ms);
        let current = self.current.filter(|s| s.started_at_ms <= timestamp_ms);
        match (stored, current) {
            (Some(a), Some(b)) => Some(if b.started_at_ms >= a.started_at_ms { b } else { a }),
            (a, b) => a.or(b),
        }
    }

    fn has_timed_out(&self, now_ms: u64, timeout_ms: u64) -> bool {
        let last_activity = self
            .last_paused_ms
            .map_or(self.last_queued_ms, |paused| paused.max(self.last_queued_ms));
        if self.foreground {
            // Only the gap before the latest resume counts, and only until
            // a log has been queued since.
            match self.last_resumed_ms {
                Some(resumed) if self.last_queued_ms < resumed => {
                    resumed.saturating_sub(last_activity) > timeout_ms
                }
                _ => false,
            }
        } else {
            now_ms.saturating_sub(last_activity) > timeout_ms
        }
    }

    /// Current session, starting a new one when needed. The flag is set
    /// when the session was just started.
    fn assign(
        &mut self,
        now_ms: u64,
        wall_ms: i64,
        timeout_ms: u64,
    ) -> Result<(Session, bool), StoreError> {
        let reusable = match self.current {
            Some(session) if !self.has_timed_out(now_ms, timeout_ms) => Some(session),
            _ => None,
        };
        let assigned = match reusable {
            Some(session) => (session, false),
            None => {
                let session = Session::start(wall_ms);
                self.ledger.record(session)?;
                self.current = Some(session);
                (session, true)
            }
        };
        self.last_queued_ms = now_ms;
        Ok(assigned)
    }
}

impl SessionTracker {
    /// Build a tracker over an already loaded ledger. The ledger's own
    /// capacity and key apply.
    pub fn new(
        config: TrackerConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
        ledger: SessionLedger,
    ) -> Self {
        Self {
            timeout_ms: config.timeout_ms(),
            config,
            clock,
            sink,
            state: Mutex::new(TrackerState::new(ledger)),
        }
    }

    /// Load the ledger from `store` using the configured key and capacity.
    pub fn open(
        config: TrackerConfig,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn EventSink>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, EngineError> {
        let ledger = SessionLedger::load(
            store,
            config.storage_key.clone(),
            config.max_stored_sessions,
        )?;
        Ok(Self::new(config, clock, sink, ledger))
    }

    /// Stamp `log` with its session identifier.
    ///
    /// Emits one [`StartSessionLog`] to the sink under `group` whenever a
    /// new session starts. A marker passed in is stamped with the current
    /// session and nothing else happens.
    ///
    /// # Errors
    ///
    /// Fails only when recording a new session in the ledger fails; the log
    /// is left unstamped in that case.
    #[instrument(skip(self, log), fields(log_type = log.log_type()))]
    pub fn on_enqueuing_log(&self, log: &mut Log, group: &str) -> Result<(), EngineError> {
        let started = {
            let mut state = self.state.lock();

            if log.is_start_session() {
                if let Some(current) = state.current {
                    log.set_sid(current.id);
                }
                return Ok(());
            }

            if let Some(toffset) = log.toffset() {
                if toffset != self.clock.now_ms() {
                    if let Some(session) = state.covering_session(toffset) {
                        debug!(session_id = %session.id, toffset, "correlated log to past session");
                        log.set_sid(session.id);
                        return Ok(());
                    }
                    debug!(toffset, "no session covers reference time");
                }
            }

            let (session, is_new) =
                state.assign(self.clock.elapsed_ms(), self.clock.now_ms(), self.timeout_ms)?;
            log.set_sid(session.id);
            is_new.then_some(session)
        };

        if let Some(session) = started {
            info!(
                session_id = %session.id,
                started_at_ms = session.started_at_ms,
                "session started"
            );
            self.sink
                .enqueue(StartSessionLog::for_session(session.id).into(), group);
        }
        Ok(())
    }

    pub fn on_activity_resumed(&self) {
        let now = self.clock.elapsed_ms();
        let mut state = self.state.lock();
        state.foreground = true;
        state.last_resumed_ms = Some(now);
        debug!(elapsed_ms = now, "activity resumed");
    }

    pub fn on_activity_paused(&self) {
        let now = self.clock.elapsed_ms();
        let mut state = self.state.lock();
        state.foreground = false;
        state.last_paused_ms = Some(now);
        debug!(elapsed_ms = now, "activity paused");
    }

    /// Forget every session, persisted and current. Idempotent.
    #[instrument(skip(self))]
    pub fn clear_sessions(&self) -> Result<(), EngineError> {
        let mut state = self.state.lock();
        state.ledger.clear()?;
        state.current = None;
        info!("sessions cleared");
        Ok(())
    }

    pub fn current_session(&self) -> Option<Session> {
        self.state.lock().current
    }

    /// Persisted boundaries in ascending start order.
    pub fn ledger_snapshot(&self) -> Vec<Session> {
        self.state.lock().ledger.sessions()
    }

    pub fn is_foreground(&self) -> bool {
        self.state.lock().foreground
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

impl EnqueueListener for SessionTracker {
    fn on_enqueuing_log(&self, log: &mut Log, group: &str) -> Result<(), EngineError> {
        SessionTracker::on_enqueuing_log(self, log, group)
    }
}

impl std::fmt::Debug for SessionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTracker")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("current", &self.current_session())
            .finish()
    }
}
