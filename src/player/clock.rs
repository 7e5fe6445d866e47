use std::time::Instant;

/// Simulated playback position: wall time scaled by `rate`, from `offset`
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    origin: Instant,
    offset: f64,
    rate: f64,
}

impl PlaybackClock {
    /// Start playing at `offset` seconds; a non-positive or non-finite rate plays at 1x
    pub fn start(offset: f64, rate: f64) -> Self {
        Self::start_at(Instant::now(), offset, rate)
    }

    pub fn start_at(origin: Instant, offset: f64, rate: f64) -> Self {
        let rate = if rate.is_finite() && rate > 0.0 { rate } else { 1.0 };
        Self {
            origin,
            offset: offset.max(0.0),
            rate,
        }
    }

    pub fn position(&self) -> f64 {
        self.position_at(Instant::now())
    }

    pub fn position_at(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.origin).as_secs_f64();
        self.offset + elapsed * self.rate
    }
}
