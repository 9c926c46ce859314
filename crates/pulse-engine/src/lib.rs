//! Session windowing: decides which session every outgoing log belongs to.

pub mod config;
pub mod error;
pub mod sink;
pub mod tracker;

pub use config::TrackerConfig;
pub use error::EngineError;
pub use sink::{EnqueueListener, EventSink, RecordingSink};
pub use tracker::SessionTracker;
