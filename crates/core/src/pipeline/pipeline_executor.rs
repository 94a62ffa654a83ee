use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::detection_provider::DetectionProvider;
use crate::shared::frame_clock::FrameClock;
use crate::shared::video_metadata::VideoMetadata;
use crate::tracking::domain::track_ledger::{LedgerOptions, TrackLedger};
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::pipeline_logger::PipelineLogger;

/// Configuration for one pipeline run.
pub struct PipelineConfig {
    pub ledger_options: LedgerOptions,
    /// Stop after this many frames; the report then covers the prefix.
    pub max_frames: Option<usize>,
    /// Called after every written frame; returning `false` stops the run.
    pub on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    pub cancelled: Arc<AtomicBool>,
    pub logger: Box<dyn PipelineLogger>,
}

/// What a run leaves behind: the finalized ledger and how far it got.
#[derive(Debug)]
pub struct TrackingOutcome {
    pub ledger: TrackLedger,
    pub frames_processed: usize,
    pub stopped_early: bool,
}

/// Abstracts how the read → detect → track/annotate → write loop runs.
///
/// Implementations must feed the ledger from one thread in frame order and
/// finalize it with the timestamp of the last processed frame, also when the
/// run stops early.
pub trait PipelineExecutor: Send {
    #[allow(clippy::too_many_arguments)]
    fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        detector: Box<dyn DetectionProvider>,
        annotator: Box<dyn FrameAnnotator>,
        clock: FrameClock,
        metadata: &VideoMetadata,
        output_path: &Path,
        config: PipelineConfig,
    ) -> Result<TrackingOutcome, Box<dyn std::error::Error>>;
}
