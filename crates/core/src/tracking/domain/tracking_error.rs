use ab_glyph::InvalidFont;
use thiserror::Error;

/// Failures raised by the tracking core. All are caller errors or invalid
/// stream parameters; none is transient.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackingError {
    #[error("frame rate must be positive and finite, got {0}")]
    InvalidFrameRate(f64),
    #[error("ledger misuse: {0}")]
    LedgerMisuse(#[from] LedgerMisuse),
    #[error("annotator expects 3-channel RGB frames, got {channels} channels")]
    UnsupportedFrameLayout { channels: u8 },
    #[error("bundled label font could not be parsed")]
    LabelFont(#[from] InvalidFont),
}

/// Contract violations on the track ledger. Fatal, never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerMisuse {
    #[error("record called after finalize")]
    RecordAfterFinalize,
    #[error("finalize called twice")]
    FinalizedTwice,
    #[error("timestamp went backwards: {given} after {previous}")]
    TimestampRegressed { previous: f64, given: f64 },
    #[error("report requested before finalize")]
    NotFinalized,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_misuse_converts_into_tracking_error() {
        let err: TrackingError = LedgerMisuse::FinalizedTwice.into();
        assert_eq!(err.to_string(), "ledger misuse: finalize called twice");
    }

    #[test]
    fn test_regression_message_names_both_timestamps() {
        let err = LedgerMisuse::TimestampRegressed {
            previous: 0.5,
            given: 0.25,
        };
        assert_eq!(err.to_string(), "timestamp went backwards: 0.25 after 0.5");
    }
}
