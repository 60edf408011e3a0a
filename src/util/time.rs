//! Time sources for the anti-cheat core

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Monotonic millisecond clock consumed by both components.
///
/// Values are milliseconds since the Unix epoch but must never go backwards,
/// even if the wall clock is adjusted while the server runs.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Wall-clock anchored at construction, advanced by `Instant`
#[derive(Debug, Clone)]
pub struct SystemClock {
    anchor: Instant,
    anchor_millis: u64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
            anchor_millis: unix_millis(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        self.anchor_millis + self.anchor.elapsed().as_millis() as u64
    }
}

/// Manually driven clock for replaying recorded traces and for tests
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(start_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(start_millis),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Jump to an absolute time; earlier values are ignored to stay monotonic
    pub fn set(&self, millis: u64) {
        self.now.fetch_max(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
