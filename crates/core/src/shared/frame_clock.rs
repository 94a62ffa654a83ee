use crate::tracking::domain::tracking_error::TrackingError;

/// Maps consumed-frame counts to stream time in seconds.
///
/// The n-th frame (1-based) is stamped `n / frame_rate`, so the timestamp of
/// the last frame equals the duration of the processed stream.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameClock {
    frame_rate: f64,
}

impl FrameClock {
    pub fn new(frame_rate: f64) -> Result<Self, TrackingError> {
        validate_frame_rate(frame_rate)?;
        Ok(Self { frame_rate })
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Timestamp of the frame with zero-based decode index `index`.
    pub fn timestamp_of(&self, index: usize) -> f64 {
        self.elapsed(index + 1)
    }

    /// Stream time covered by `frame_count` frames.
    pub fn elapsed(&self, frame_count: usize) -> f64 {
        frame_count as f64 / self.frame_rate
    }
}

/// Rejects zero, negative and non-finite rates.
pub fn validate_frame_rate(frame_rate: f64) -> Result<(), TrackingError> {
    if frame_rate.is_finite() && frame_rate > 0.0 {
        Ok(())
    } else {
        Err(TrackingError::InvalidFrameRate(frame_rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_first_frame_is_one_tick_in() {
        let clock = FrameClock::new(10.0).unwrap();
        assert_relative_eq!(clock.timestamp_of(0), 0.1);
        assert_relative_eq!(clock.timestamp_of(2), 0.3);
    }

    #[test]
    fn test_elapsed_matches_last_timestamp() {
        let clock = FrameClock::new(25.0).unwrap();
        assert_relative_eq!(clock.elapsed(50), clock.timestamp_of(49));
        assert_relative_eq!(clock.elapsed(0), 0.0);
    }

    #[rstest]
    #[case::zero(0.0)]
    #[case::negative(-30.0)]
    #[case::nan(f64::NAN)]
    #[case::infinite(f64::INFINITY)]
    fn test_rejects_unusable_rates(#[case] rate: f64) {
        assert!(matches!(
            FrameClock::new(rate),
            Err(TrackingError::InvalidFrameRate(_))
        ));
    }
}
