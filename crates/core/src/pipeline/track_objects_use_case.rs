use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::detection_provider::DetectionProvider;
use crate::reporting::domain::report::Report;
use crate::reporting::domain::report_generator::ReportGenerator;
use crate::shared::frame_clock::FrameClock;
use crate::shared::video_metadata::VideoMetadata;
use crate::tracking::domain::track_ledger::LedgerOptions;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::pipeline_executor::{PipelineConfig, PipelineExecutor};
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};

/// Orchestrates a full tracking run: annotate every frame, accrue dwell
/// time per identity, and produce the end-of-stream report.
///
/// Single-use: `execute` consumes the owned components, so a second call
/// fails.
pub struct TrackObjectsUseCase {
    reader: Option<Box<dyn VideoReader>>,
    writer: Option<Box<dyn VideoWriter>>,
    detector: Option<Box<dyn DetectionProvider>>,
    annotator: Option<Box<dyn FrameAnnotator>>,
    executor: Box<dyn PipelineExecutor>,
    report_generator: ReportGenerator,
    ledger_options: LedgerOptions,
    max_frames: Option<usize>,
    logger: Option<Box<dyn PipelineLogger>>,
    on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
    cancelled: Arc<AtomicBool>,
}

impl TrackObjectsUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        detector: Box<dyn DetectionProvider>,
        annotator: Box<dyn FrameAnnotator>,
        executor: Box<dyn PipelineExecutor>,
        ledger_options: LedgerOptions,
        max_frames: Option<usize>,
        logger: Option<Box<dyn PipelineLogger>>,
        on_progress: Option<Box<dyn Fn(usize, usize) -> bool + Send>>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            reader: Some(reader),
            writer: Some(writer),
            detector: Some(detector),
            annotator: Some(annotator),
            executor,
            report_generator: ReportGenerator::new(),
            ledger_options,
            max_frames,
            logger,
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    /// Runs the pipeline over the stream described by `metadata`.
    ///
    /// `metadata.fps` drives the frame clock and must be positive; an
    /// invalid rate fails before any frame is read.
    pub fn execute(
        &mut self,
        metadata: &VideoMetadata,
        output_path: &Path,
    ) -> Result<Report, Box<dyn std::error::Error>> {
        let clock = FrameClock::new(metadata.fps)?;

        let config = PipelineConfig {
            ledger_options: self.ledger_options,
            max_frames: self.max_frames,
            on_progress: self.on_progress.take(),
            cancelled: self.cancelled.clone(),
            logger: self
                .logger
                .take()
                .unwrap_or_else(|| Box::new(NullPipelineLogger)),
        };

        let outcome = self.executor.execute(
            self.reader.take().ok_or("Pipeline already executed")?,
            self.writer.take().ok_or("Pipeline already executed")?,
            self.detector.take().ok_or("Pipeline already executed")?,
            self.annotator.take().ok_or("Pipeline already executed")?,
            clock,
            metadata,
            output_path,
            config,
        )?;

        let report = self.report_generator.generate(
            &outcome.ledger,
            outcome.frames_processed,
            clock.frame_rate(),
        )?;
        log::info!(
            "Report ready: {} unique objects, {:.2}s{}",
            report.total_unique_objects,
            report.video_duration,
            if outcome.stopped_early { " (partial)" } else { "" }
        );
        Ok(report)
    }
}
