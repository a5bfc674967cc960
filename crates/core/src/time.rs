use std::time::{Duration, Instant};

/// A monotonic clock abstraction for deterministic timing in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(Instant),
}

impl Clock {
    /// Returns a clock that reads the system monotonic clock.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given instant.
    #[must_use]
    pub fn fixed(at: Instant) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current instant according to the clock.
    #[must_use]
    pub fn now(&self) -> Instant {
        match self {
            Clock::Default => Instant::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::Default`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }

    /// Time elapsed since `earlier`, clamped at zero.
    #[must_use]
    pub fn elapsed_since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
#[must_use]
pub fn duration_to_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Returns a `Clock` fixed at the current instant, for tests that step time manually.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(Instant::now())
}
