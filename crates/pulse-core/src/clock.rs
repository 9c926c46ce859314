//! Time sources.
//!
//! Session windowing needs two readings that must not be conflated:
//! [`ElapsedClock`] measures inactivity gaps and is immune to wall-clock
//! adjustment, while [`WallClock`] stamps session starts so they stay
//! comparable across process restarts.

use std::fmt;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic milliseconds since an arbitrary origin. Resets on restart.
pub trait ElapsedClock: Send + Sync {
    fn elapsed_ms(&self) -> u64;
}

/// Wall-clock milliseconds since the UNIX epoch.
pub trait WallClock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Both capabilities, for implementations that back the two readings.
pub trait Clock: ElapsedClock + WallClock + fmt::Debug {}

impl<T: ElapsedClock + WallClock + fmt::Debug + ?Sized> Clock for T {}

/// Production clock: `Instant` for elapsed time, `chrono::Utc` for wall time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ElapsedClock for SystemClock {
    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

impl WallClock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Hand-driven clock for deterministic tests and simulations.
///
/// [`advance`](Self::advance) moves both readings together, the way real time
/// passes; [`set_wall`](Self::set_wall) simulates a wall-clock adjustment
/// without touching elapsed time.
#[derive(Debug, Default)]
pub struct ManualClock {
    elapsed: AtomicU64,
    wall: AtomicI64,
}

impl ManualClock {
    /// Both readings start at `start_ms`.
    pub fn new(start_ms: u64) -> Self {
        Self {
            elapsed: AtomicU64::new(start_ms),
            wall: AtomicI64::new(i64::try_from(start_ms).unwrap_or(i64::MAX)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.elapsed.fetch_add(ms, Ordering::SeqCst);
        self.wall
            .fetch_add(i64::try_from(ms).unwrap_or(i64::MAX), Ordering::SeqCst);
    }

    pub fn set_wall(&self, now_ms: i64) {
        self.wall.store(now_ms, Ordering::SeqCst);
    }

    /// Simulate a process restart: elapsed time starts over, wall time does not.
    pub fn reset_elapsed(&self) {
        self.elapsed.store(0, Ordering::SeqCst);
    }
}

impl ElapsedClock for ManualClock {
    fn elapsed_ms(&self) -> u64 {
        self.elapsed.load(Ordering::SeqCst)
    }
}

impl WallClock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.wall.load(Ordering::SeqCst)
    }
}
