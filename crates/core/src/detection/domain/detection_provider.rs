use crate::shared::frame::Frame;

use super::detection::Detection;

/// Domain interface for the external detector/tracker.
///
/// Identities must be stable across calls within one run; the core does no
/// re-identification. Implementations may keep state across frames, hence
/// `&mut self`.
pub trait DetectionProvider: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>>;
}
