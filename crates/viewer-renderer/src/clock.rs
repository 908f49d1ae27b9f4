//! Monotonic frame clock.

use std::time::Instant;

/// Monotonically increasing elapsed time in seconds.
///
/// Elapsed time is computed from a continuously running clock rather
/// than a frame counter, so skipped frames (hidden surface) introduce
/// no drift in time-driven uniforms.
pub struct FrameClock {
    start: Instant,
}

impl FrameClock {
    /// Starts the clock at the current instant.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds elapsed since the clock was started.
    pub fn elapsed_seconds(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_is_monotonic() {
        let clock = FrameClock::start();
        let a = clock.elapsed_seconds();
        let b = clock.elapsed_seconds();
        assert!(b >= a);
        assert!(a >= 0.0);
    }
}
