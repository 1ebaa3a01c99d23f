//! Fixed-interval frame pacing.
//!
//! `frame_start` only ever moves by whole multiples of the interval, so
//! anything scheduled at `frame_start + n * interval` stays on the grid even
//! when the loop oversleeps. Missed frames are coalesced into one advance.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_start: Instant,
    interval: Duration,
}

impl FrameClock {
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(Instant::now(), interval)
    }

    pub fn starting_at(origin: Instant, interval: Duration) -> Self {
        Self {
            frame_start: origin,
            interval: interval.max(Duration::from_nanos(1)),
        }
    }

    /// Advance against the wall clock. Returns true when at least one frame
    /// boundary was crossed.
    pub fn advance(&mut self) -> bool {
        self.advance_at(Instant::now())
    }

    pub fn advance_at(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.frame_start);
        let frames = elapsed.as_nanos() / self.interval.as_nanos();
        if frames == 0 {
            return false;
        }
        let step = self.interval.as_nanos() * frames;
        self.frame_start += Duration::from_nanos(u64::try_from(step).unwrap_or(u64::MAX));
        if frames > 1 {
            log::trace!("Coalesced {frames} frames");
        }
        true
    }

    /// Start of the current frame. Stable for a whole loop iteration.
    pub fn time(&self) -> Instant {
        self.frame_start
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the next frame is due.
    pub fn next_frame(&self) -> Instant {
        self.frame_start + self.interval
    }

    pub fn sleep_deadline(&self) -> Duration {
        self.sleep_deadline_at(Instant::now())
    }

    pub fn sleep_deadline_at(&self, now: Instant) -> Duration {
        self.next_frame().saturating_duration_since(now)
    }
}
