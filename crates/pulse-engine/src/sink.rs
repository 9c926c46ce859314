//! Seams between the tracker and the delivery pipeline.

use parking_lot::Mutex;

use pulse_core::events::{Log, StartSessionLog};

use crate::error::EngineError;

/// Downstream delivery pipeline. Receives session-start markers.
pub trait EventSink: Send + Sync {
    fn enqueue(&self, log: Log, group: &str);
}

/// Called by a delivery channel for every log before it is queued.
pub trait EnqueueListener: Send + Sync {
    fn on_enqueuing_log(&self, log: &mut Log, group: &str) -> Result<(), EngineError>;
}

/// Sink that keeps everything it receives, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(String, Log)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(group, log)` pairs in arrival order.
    pub fn entries(&self) -> Vec<(String, Log)> {
        self.entries.lock().clone()
    }

    pub fn markers(&self) -> Vec<StartSessionLog> {
        self.entries
            .lock()
            .iter()
            .filter_map(|(_, log)| match log {
                Log::StartSession(marker) => Some(marker.clone()),
                Log::Event(_) => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drain everything received so far.
    pub fn take(&self) -> Vec<(String, Log)> {
        std::mem::take(&mut *self.entries.lock())
    }
}

impl EventSink for RecordingSink {
    fn enqueue(&self, log: Log, group: &str) {
        self.entries.lock().push((group.to_string(), log));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::events::EventLog;
    use pulse_core::ids::SessionId;

    #[test]
    fn records_in_order_and_filters_markers() {
        let sink = RecordingSink::new();
        let sid = SessionId::new();
        sink.enqueue(EventLog::new("open").into(), "analytics");
        sink.enqueue(StartSessionLog::for_session(sid).into(), "analytics");

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "analytics");
        assert!(!entries[0].1.is_start_session());

        let markers = sink.markers();
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].sid, Some(sid));
    }

    #[test]
    fn take_drains() {
        let sink = RecordingSink::new();
        sink.enqueue(EventLog::new("a").into(), "g");
        assert_eq!(sink.take().len(), 1);
        assert!(sink.is_empty());
    }
}
