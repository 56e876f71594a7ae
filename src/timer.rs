use std::time::{Duration, Instant};

/// how often the timers count down, and how often we redraw
pub const CHIP8_TICK_HZ: u32 = 60;

pub fn tick_interval() -> Duration {
    Duration::from_secs(1) / CHIP8_TICK_HZ
}

/// The delay and sound timers. Both count down to zero and stay there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Timers { delay: 0, sound: 0 }
    }

    /// one 1/60s tick
    pub fn tick(&mut self) {
        self.delay = self.delay.saturating_sub(1);
        self.sound = self.sound.saturating_sub(1);
    }

    pub fn is_sounding(&self) -> bool {
        self.sound > 0
    }
}

/// Tracks a fixed real-time interval. The caller passes in the time so that
/// nothing here reads the clock itself.
#[derive(Debug, Clone, Copy)]
pub struct Cadence {
    interval: Duration,
    next: Instant,
}

impl Cadence {
    pub fn new(interval: Duration, start: Instant) -> Self {
        Cadence {
            interval,
            next: start + interval,
        }
    }

    /// how many whole intervals have come due since the last call
    pub fn due(&mut self, now: Instant) -> u32 {
        if now < self.next {
            return 0;
        }
        let behind = (now - self.next).as_nanos();
        let interval = self.interval.as_nanos();
        // a stall longer than u32::MAX intervals settles for u32::MAX
        let count = u32::try_from(behind / interval)
            .unwrap_or(u32::MAX)
            .saturating_add(1);
        // the remainder is below one interval, so it fits
        let into = Duration::from_nanos((behind % interval) as u64);
        self.next = now + (self.interval - into);
        count
    }
}
