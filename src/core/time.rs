//! Frame time tracking

/// Time source handed to every system once per frame.
///
/// The host advances it with the frame's elapsed time; AI code only ever
/// reads `delta_seconds()` and `elapsed_seconds()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Time {
    /// Seconds since the previous frame
    delta: f32,
    /// Seconds since the clock started
    elapsed: f32,
    /// Frames advanced so far
    frame: u64,
}

impl Time {
    /// Create a clock at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock by one frame of `delta` seconds.
    ///
    /// Negative deltas are treated as zero so time never runs backwards.
    pub fn advance(&mut self, delta: f32) {
        let delta = delta.max(0.0);
        self.delta = delta;
        self.elapsed += delta;
        self.frame += 1;
    }

    /// Seconds elapsed during the last frame
    #[must_use]
    #[inline]
    pub fn delta_seconds(&self) -> f32 {
        self.delta
    }

    /// Seconds since the clock started
    #[must_use]
    #[inline]
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed
    }

    /// Number of frames advanced
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_accumulates() {
        let mut time = Time::new();
        time.advance(0.5);
        time.advance(0.25);

        assert!((time.delta_seconds() - 0.25).abs() < f32::EPSILON);
        assert!((time.elapsed_seconds() - 0.75).abs() < f32::EPSILON);
        assert_eq!(time.frame(), 2);
    }

    #[test]
    fn test_time_ignores_negative_delta() {
        let mut time = Time::new();
        time.advance(1.0);
        time.advance(-3.0);

        assert_eq!(time.delta_seconds(), 0.0);
        assert!((time.elapsed_seconds() - 1.0).abs() < f32::EPSILON);
    }
}
