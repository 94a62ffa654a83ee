pub mod constants;
pub mod frame;
pub mod frame_clock;
pub mod identity;
pub mod video_metadata;
