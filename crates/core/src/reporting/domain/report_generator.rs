use crate::shared::frame_clock::validate_frame_rate;
use crate::tracking::domain::track_ledger::TrackLedger;
use crate::tracking::domain::tracking_error::{LedgerMisuse, TrackingError};

use super::report::{ObjectTime, Report};

/// Builds the end-of-stream [`Report`] from a finalized ledger.
///
/// A non-positive frame rate is rejected before any arithmetic, even for an
/// empty stream. With a valid rate and zero frames, duration and fps are
/// reported as zero.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportGenerator;

impl ReportGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(
        &self,
        ledger: &TrackLedger,
        frame_count: usize,
        frame_rate: f64,
    ) -> Result<Report, TrackingError> {
        validate_frame_rate(frame_rate)?;
        if !ledger.is_finalized() {
            return Err(LedgerMisuse::NotFinalized.into());
        }

        let (video_duration, processing_fps) = if frame_count == 0 {
            log::warn!("No frames processed; reporting zero duration");
            (0.0, 0.0)
        } else {
            (frame_count as f64 / frame_rate, frame_rate)
        };

        let object_times = ledger
            .tracks()
            .map(|track| ObjectTime {
                identity: track.identity(),
                seconds: track.cumulative_time(),
            })
            .collect();

        Ok(Report {
            total_unique_objects: ledger.unique_count(),
            video_duration,
            processing_fps,
            frame_count,
            object_times,
        })
    }
}
