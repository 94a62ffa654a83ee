use std::path::PathBuf;

/// Stream properties reported by a frame source.
///
/// `total_frames` comes from the container and may be `0` when unknown;
/// report math uses the number of frames actually processed instead.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Same stream with the frame rate replaced, for containers that
    /// report no usable rate.
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }
}
