//! Batch timing for the ingestion progress bar (`progress` feature).
//!
//! [`IterTimer`] keeps an exponential moving average of the time between two batches:
//! `ema = alpha * dt + (1 - alpha) * ema`, seeded with the first sample. [`fmt_dur`] renders
//! durations compactly for the bar message (`"640µs"`, `"42ms"`, `"3.14s"`).
use std::time::{Duration, Instant};

/// Smoothed time between consecutive [`IterTimer::tick`] calls.
#[derive(Debug, Clone)]
pub struct IterTimer {
    last: Instant,
    ema_ns: f64,
    alpha: f64,
    ticks: u64,
}

impl IterTimer {
    /// `alpha` is clamped to `(0, 1]`; `1.0` disables smoothing.
    pub fn new(alpha: f64) -> Self {
        Self {
            last: Instant::now(),
            ema_ns: 0.0,
            alpha: alpha.clamp(f64::EPSILON, 1.0),
            ticks: 0,
        }
    }

    /// Close the current interval and return its raw duration.
    #[inline]
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        self.record(dt);
        dt
    }

    fn record(&mut self, dt: Duration) {
        let dt_ns = dt.as_nanos() as f64;
        self.ticks += 1;
        self.ema_ns = if self.ticks == 1 {
            dt_ns
        } else {
            self.alpha * dt_ns + (1.0 - self.alpha) * self.ema_ns
        };
    }

    /// Smoothed interval, zero before the first tick.
    #[inline]
    pub fn avg(&self) -> Duration {
        Duration::from_nanos(self.ema_ns as u64)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Compact human-readable duration.
pub fn fmt_dur(d: Duration) -> String {
    match d.as_micros() {
        us if us < 1_000 => format!("{us}µs"),
        us if us < 1_000_000 => format!("{}ms", us / 1_000),
        _ => format!("{:.2}s", d.as_secs_f64()),
    }
}
