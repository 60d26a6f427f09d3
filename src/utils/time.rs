use std::time::{Duration, Instant};

/// Source of per-frame delta times.
///
/// `Realtime` measures wall-clock time between ticks. `Fixed` advances by a
/// constant step, which keeps headless runs and tests deterministic.
#[derive(Debug, Clone)]
pub enum FrameClock {
    Realtime { last: Instant },
    Fixed { step: Duration },
}

/// Frame timing state.
#[derive(Debug, Clone)]
pub struct Timer {
    clock: FrameClock,
    /// Time since the previous tick.
    pub delta: Duration,
    /// Sum of all deltas.
    pub elapsed: Duration,
    pub frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::realtime()
    }
}

impl Timer {
    #[must_use]
    pub fn realtime() -> Self {
        Self::with_clock(FrameClock::Realtime { last: Instant::now() })
    }

    /// A timer that advances `1 / fps` seconds per tick.
    #[must_use]
    pub fn fixed(fps: u32) -> Self {
        Self::with_clock(FrameClock::Fixed {
            step: Duration::from_secs_f64(1.0 / f64::from(fps.max(1))),
        })
    }

    fn with_clock(clock: FrameClock) -> Self {
        Self {
            clock,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advances one frame and returns the delta in seconds.
    pub fn tick(&mut self) -> f32 {
        self.delta = match &mut self.clock {
            FrameClock::Realtime { last } => {
                let now = Instant::now();
                let delta = now - *last;
                *last = now;
                delta
            }
            FrameClock::Fixed { step } => *step,
        };
        self.elapsed += self.delta;
        self.frame_count += 1;
        self.delta.as_secs_f32()
    }
}
