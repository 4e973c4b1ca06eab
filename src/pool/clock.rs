use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in seconds, truncated to `u32`.
pub trait Clock {
    fn now(&self) -> u32;
}

/// Wall clock. Times before the Unix epoch read as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> u32 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as u32)
            .unwrap_or(0)
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManualClock {
    time: u32,
}

impl ManualClock {
    pub fn new(time: u32) -> Self {
        Self { time }
    }

    pub fn set(&mut self, time: u32) {
        self.time = time;
    }

    /// Moves forward by `seconds`, wrapping like the oracle timestamps.
    pub fn advance(&mut self, seconds: u32) {
        self.time = self.time.wrapping_add(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> u32 {
        self.time
    }
}
