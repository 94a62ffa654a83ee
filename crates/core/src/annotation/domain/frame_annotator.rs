use crate::shared::frame::Frame;
use crate::tracking::domain::track_ledger::TrackLedger;

/// Domain interface for drawing tracking overlays.
///
/// Implementations read the ledger and the source frame and return a new
/// frame of identical dimensions; the source frame is left untouched.
pub trait FrameAnnotator: Send {
    fn annotate(
        &self,
        frame: &Frame,
        ledger: &TrackLedger,
    ) -> Result<Frame, Box<dyn std::error::Error>>;
}
