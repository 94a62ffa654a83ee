use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::detection::domain::detection::Detection;
use crate::detection::domain::detection_provider::DetectionProvider;
use crate::pipeline::pipeline_executor::{PipelineConfig, PipelineExecutor, TrackingOutcome};
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::shared::frame::Frame;
use crate::shared::frame_clock::FrameClock;
use crate::shared::video_metadata::VideoMetadata;
use crate::tracking::domain::track_ledger::TrackLedger;
use crate::tracking::domain::tracking_error::TrackingError;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// A frame with its detections and how long detection took (ms).
type Detected = (Frame, Vec<Detection>, f64);

/// Runs the tracking pipeline with dedicated threads for I/O and detection.
///
/// Layout: `reader → detect → main [ledger/annotate] → writer`
///
/// The ledger lives on the main thread only, so frames reach it strictly in
/// decode order. Cancellation ends the run early but still finalizes the
/// ledger at the last processed frame.
pub struct ThreadedPipelineExecutor {
    channel_capacity: usize,
}

impl ThreadedPipelineExecutor {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_channel_capacity(capacity: usize) -> Self {
        Self {
            channel_capacity: capacity.max(1),
        }
    }
}

impl Default for ThreadedPipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineExecutor for ThreadedPipelineExecutor {
    fn execute(
        &self,
        reader: Box<dyn VideoReader>,
        mut writer: Box<dyn VideoWriter>,
        detector: Box<dyn DetectionProvider>,
        annotator: Box<dyn FrameAnnotator>,
        clock: FrameClock,
        metadata: &VideoMetadata,
        output_path: &Path,
        config: PipelineConfig,
    ) -> Result<TrackingOutcome, Box<dyn std::error::Error>> {
        let PipelineConfig {
            ledger_options,
            max_frames,
            on_progress,
            cancelled,
            mut logger,
        } = config;
        let cap = self.channel_capacity;
        let total_frames = match max_frames {
            Some(limit) if metadata.total_frames > 0 => metadata.total_frames.min(limit),
            Some(limit) => limit,
            None => metadata.total_frames,
        };

        writer.open(output_path, metadata)?;

        let (frame_tx, frame_rx) = crossbeam_channel::bounded::<Result<Frame, SendError>>(cap);
        let (detected_tx, detected_rx) =
            crossbeam_channel::bounded::<Result<Detected, SendError>>(cap);
        let (write_tx, write_rx) = crossbeam_channel::bounded::<Frame>(cap);

        let reader_handle = spawn_reader(reader, frame_tx, max_frames, cancelled.clone());
        let detect_handle = spawn_detector(detector, frame_rx, detected_tx, cancelled.clone());
        let writer_handle = spawn_writer(writer, write_rx);

        let mut main = MainLoop {
            ledger: TrackLedger::new(ledger_options),
            clock,
            annotator: &*annotator,
            write_tx: &write_tx,
            logger: &mut *logger,
            on_progress: on_progress.as_deref(),
            cancelled: &cancelled,
            total_frames,
            frames_processed: 0,
            stopped_early: false,
        };
        let main_result = match main.run(detected_rx) {
            Ok(()) => main.finish(),
            Err(e) => Err(e),
        };

        drop(write_tx);
        let joined = join_threads(reader_handle, detect_handle, writer_handle);

        let outcome = match (main_result, joined) {
            (Err(LoopError::WriterClosed), Err(e)) => return Err(e),
            (Err(LoopError::WriterClosed), Ok(())) => {
                return Err("Writer channel closed unexpectedly".into())
            }
            (Err(LoopError::Failed(e)), _) => return Err(e),
            (Ok(_), Err(e)) => return Err(e),
            (Ok(outcome), Ok(())) => outcome,
        };
        logger.summary();
        Ok(outcome)
    }
}

fn spawn_reader(
    mut reader: Box<dyn VideoReader>,
    frame_tx: crossbeam_channel::Sender<Result<Frame, SendError>>,
    max_frames: Option<usize>,
    cancelled: Arc<AtomicBool>,
) -> std::thread::JoinHandle<Box<dyn VideoReader>> {
    std::thread::spawn(move || {
        let limit = max_frames.unwrap_or(usize::MAX);
        for frame_result in reader.frames().take(limit) {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let mapped = frame_result.map_err(|e| -> SendError { e.to_string().into() });
            if frame_tx.send(mapped).is_err() {
                break;
            }
        }
        reader.close();
        reader
    })
}

fn spawn_detector(
    mut detector: Box<dyn DetectionProvider>,
    frame_rx: crossbeam_channel::Receiver<Result<Frame, SendError>>,
    detected_tx: crossbeam_channel::Sender<Result<Detected, SendError>>,
    cancelled: Arc<AtomicBool>,
) -> std::thread::JoinHandle<Box<dyn DetectionProvider>> {
    std::thread::spawn(move || {
        for frame_result in frame_rx {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }

            let result = frame_result.and_then(|frame| {
                let started = Instant::now();
                match detector.detect(&frame) {
                    Ok(detections) => {
                        let ms = started.elapsed().as_secs_f64() * 1000.0;
                        Ok((frame, detections, ms))
                    }
                    Err(e) => Err(format!("frame {}: {e}", frame.index()).into()),
                }
            });

            let failed = result.is_err();
            if detected_tx.send(result).is_err() || failed {
                break;
            }
        }
        detector
    })
}

fn spawn_writer(
    mut writer: Box<dyn VideoWriter>,
    write_rx: crossbeam_channel::Receiver<Frame>,
) -> std::thread::JoinHandle<Result<Box<dyn VideoWriter>, SendError>> {
    std::thread::spawn(move || {
        for frame in write_rx {
            writer
                .write(&frame)
                .map_err(|e| -> SendError { e.to_string().into() })?;
        }
        Ok(writer)
    })
}

enum LoopError {
    /// The writer thread hung up; its own error is the one to report.
    WriterClosed,
    Failed(Box<dyn std::error::Error>),
}

impl From<Box<dyn std::error::Error>> for LoopError {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        LoopError::Failed(err)
    }
}

impl From<TrackingError> for LoopError {
    fn from(err: TrackingError) -> Self {
        LoopError::Failed(Box::new(err))
    }
}

/// State owned by the main thread: the ledger and everything that touches it.
struct MainLoop<'a> {
    ledger: TrackLedger,
    clock: FrameClock,
    annotator: &'a dyn FrameAnnotator,
    write_tx: &'a crossbeam_channel::Sender<Frame>,
    logger: &'a mut dyn PipelineLogger,
    on_progress: Option<&'a (dyn Fn(usize, usize) -> bool + Send)>,
    cancelled: &'a AtomicBool,
    total_frames: usize,
    frames_processed: usize,
    stopped_early: bool,
}

impl MainLoop<'_> {
    fn run(
        &mut self,
        detected_rx: crossbeam_channel::Receiver<Result<Detected, SendError>>,
    ) -> Result<(), LoopError> {
        for detected_result in detected_rx {
            if self.cancelled.load(Ordering::Relaxed) {
                self.stopped_early = true;
                break;
            }
            let (frame, detections, detect_ms) =
                detected_result.map_err(|e| LoopError::Failed(e.to_string().into()))?;
            self.logger.timing("detect", detect_ms);

            if !self.process(frame, detections)? {
                self.cancelled.store(true, Ordering::Relaxed);
                self.stopped_early = true;
                break;
            }
        }
        // Upstream threads may have seen the flag before the main loop did.
        if self.cancelled.load(Ordering::Relaxed) {
            self.stopped_early = true;
        }
        Ok(())
    }

    /// Feeds one frame through the ledger and annotator. Returns `false`
    /// when the progress callback asks to stop.
    fn process(&mut self, frame: Frame, detections: Vec<Detection>) -> Result<bool, LoopError> {
        let timestamp = self.clock.timestamp_of(self.frames_processed);

        let started = Instant::now();
        self.ledger.begin_frame(timestamp)?;
        for detection in &detections {
            self.ledger
                .record(detection.identity, detection.centroid, timestamp)?;
        }
        self.logger.timing("track", elapsed_ms(started));
        self.logger.metric("detections", detections.len() as f64);
        self.logger
            .metric("visible_tracks", self.ledger.visible_tracks().count() as f64);

        let started = Instant::now();
        let annotated = self.annotator.annotate(&frame, &self.ledger)?;
        self.logger.timing("annotate", elapsed_ms(started));

        self.write_tx
            .send(annotated)
            .map_err(|_| LoopError::WriterClosed)?;

        self.frames_processed += 1;
        self.logger.progress(self.frames_processed, self.total_frames);

        Ok(match self.on_progress {
            Some(callback) => callback(self.frames_processed, self.total_frames),
            None => true,
        })
    }

    fn finish(mut self) -> Result<TrackingOutcome, LoopError> {
        let final_timestamp = self.clock.elapsed(self.frames_processed);
        if self.stopped_early {
            log::warn!(
                "Stopped early after {} frames; report covers {final_timestamp:.2}s",
                self.frames_processed
            );
        }
        self.ledger.finalize(final_timestamp)?;
        self.logger.info(&format!(
            "Tracked {} unique objects over {} frames",
            self.ledger.unique_count(),
            self.frames_processed
        ));

        Ok(TrackingOutcome {
            ledger: self.ledger,
            frames_processed: self.frames_processed,
            stopped_early: self.stopped_early,
        })
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

/// Joins all pipeline threads, closes the endpoints and returns the first
/// error encountered.
fn join_threads(
    reader_handle: std::thread::JoinHandle<Box<dyn VideoReader>>,
    detect_handle: std::thread::JoinHandle<Box<dyn DetectionProvider>>,
    writer_handle: std::thread::JoinHandle<Result<Box<dyn VideoWriter>, SendError>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut first_error: Option<Box<dyn std::error::Error>> = None;
    let mut set_if_none = |err: Box<dyn std::error::Error>| {
        if first_error.is_none() {
            first_error = Some(err);
        }
    };

    match reader_handle.join() {
        Ok(mut r) => r.close(),
        Err(_) => set_if_none("Reader thread panicked".into()),
    }

    if detect_handle.join().is_err() {
        set_if_none("Detect thread panicked".into());
    }

    match writer_handle.join() {
        Ok(Ok(mut w)) => {
            if let Err(e) = w.close() {
                set_if_none(e);
            }
        }
        Ok(Err(e)) => set_if_none(e.to_string().into()),
        Err(_) => set_if_none("Writer thread panicked".into()),
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
