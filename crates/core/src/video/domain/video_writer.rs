use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Output sink for annotated frames.
///
/// Receives frames in source order at source resolution; codec and
/// container are the implementation's choice.
pub trait VideoWriter: Send {
    fn open(
        &mut self,
        path: &Path,
        metadata: &VideoMetadata,
    ) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    /// Flushes buffered output and finalizes the container.
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}
