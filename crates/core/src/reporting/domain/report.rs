use std::fmt;

use serde::Serialize;

use crate::shared::identity::Identity;

/// Dwell time credited to one identity.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObjectTime {
    pub identity: Identity,
    pub seconds: f64,
}

/// End-of-stream summary.
///
/// `Display` renders the stable line-oriented text format; downstream
/// parsers rely on it line by line, so keep it unchanged:
///
/// ```text
/// Total Unique Objects: 2
/// Video Duration: 0.30 seconds
/// Processing FPS: 10.00
/// Object Times:
///   Object 1: 0.20 seconds
///   Object 2: 0.10 seconds
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub total_unique_objects: usize,
    pub video_duration: f64,
    pub processing_fps: f64,
    pub frame_count: usize,
    /// Ordered by first appearance.
    pub object_times: Vec<ObjectTime>,
}

impl Report {
    /// True when no frame was processed.
    pub fn is_empty_stream(&self) -> bool {
        self.frame_count == 0
    }

    pub fn time_of(&self, identity: Identity) -> Option<f64> {
        self.object_times
            .iter()
            .find(|entry| entry.identity == identity)
            .map(|entry| entry.seconds)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Unique Objects: {}", self.total_unique_objects)?;
        writeln!(f, "Video Duration: {:.2} seconds", self.video_duration)?;
        writeln!(f, "Processing FPS: {:.2}", self.processing_fps)?;
        writeln!(f, "Object Times:")?;
        for entry in &self.object_times {
            writeln!(f, "  Object {}: {:.2} seconds", entry.identity, entry.seconds)?;
        }
        Ok(())
    }
}
