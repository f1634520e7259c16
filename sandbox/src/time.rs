use std::time::Duration;

use tracing::warn;

use crate::constants::MAX_TICKS_PER_FRAME;

/// Fixed-timestep accumulator: real time goes in, whole ticks come out.
#[derive(Debug, Clone)]
pub struct TickClock {
    tick_duration: Duration,
    accumulator: Duration,
}

impl TickClock {
    pub fn new(tick_duration: Duration) -> Self {
        Self {
            tick_duration: tick_duration.max(Duration::from_nanos(1)),
            accumulator: Duration::ZERO,
        }
    }

    /// Adds `elapsed` and returns how many ticks are now due.
    ///
    /// At most `MAX_TICKS_PER_FRAME` ticks are returned; beyond that the
    /// backlog is dropped so a stall cannot snowball into ever longer frames.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;

        let mut ticks = 0;
        while self.accumulator >= self.tick_duration && ticks < MAX_TICKS_PER_FRAME {
            self.accumulator -= self.tick_duration;
            ticks += 1;
        }

        if self.accumulator >= self.tick_duration {
            warn!(
                backlog_ms = self.accumulator.as_millis() as u64,
                "simulation fell behind; skipping ticks to catch up"
            );
            let remainder = self.accumulator.as_nanos() % self.tick_duration.as_nanos();
            self.accumulator = Duration::from_nanos(remainder as u64);
        }

        ticks
    }

    /// How far into the next tick real time has got, in `[0, 1)`.
    pub fn alpha(&self) -> f32 {
        (self.accumulator.as_secs_f64() / self.tick_duration.as_secs_f64()) as f32
    }
}
