//! Frame timing for the demo loop.
//!
//! Delta time is measured between frames, not fixed-step: a stalled frame
//! simply produces a larger delta on the next update. A fixed delta can
//! be injected for deterministic runs.

use std::time::{Duration, Instant};

/// Tracks elapsed time, per-frame delta and frame count.
#[derive(Debug)]
pub struct Time {
    start: Instant,
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    paused: bool,
    pause_elapsed: Duration,
    fixed_delta: Option<f32>,
}

impl Time {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            paused: false,
            pause_elapsed: Duration::ZERO,
            fixed_delta: None,
        }
    }

    /// Update timing values. Call once per frame.
    ///
    /// Returns `(elapsed_time, delta_time)` for convenience. While paused
    /// the delta is zero and elapsed time stops increasing.
    pub fn update(&mut self) -> (f32, f32) {
        let now = Instant::now();

        if self.paused {
            self.delta_secs = 0.0;
            return (self.elapsed_secs, self.delta_secs);
        }

        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta);
        self.last_frame = now;

        let raw_elapsed = now.duration_since(self.start) - self.pause_elapsed;
        self.elapsed_secs = raw_elapsed.as_secs_f32();

        self.frame_count += 1;

        (self.elapsed_secs, self.delta_secs)
    }

    /// Total elapsed time in seconds since start, excluding pauses.
    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    /// Time since last frame in seconds.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Total frames since start.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop the clock; subsequent updates report a zero delta.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume after a pause without replaying the paused span.
    pub fn resume(&mut self) {
        if self.paused {
            let now = Instant::now();
            self.pause_elapsed += now.duration_since(self.last_frame);
            self.last_frame = now;
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Force a constant delta regardless of wall time. `None` restores
    /// measured frame timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
