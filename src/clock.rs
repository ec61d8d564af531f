// Time source for task timestamps and ids

use chrono::{DateTime, Duration, Local};
use std::cell::Cell;

/// Display format for `createdAt` / `updatedAt`, e.g. `18 Oct 2026, 08:09 pm`
pub const TIMESTAMP_FORMAT: &str = "%d %b %Y, %I:%M %P";

/// Source of "now" for the stores
pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<DateTime<Local>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self { now: Cell::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}

/// Format a point in time the way tasks store it
pub fn format_timestamp(at: DateTime<Local>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}
