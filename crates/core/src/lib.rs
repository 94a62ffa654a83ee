//! Track aggregation and temporal metrics for annotated video streams.
//!
//! Consumes per-frame detections (identity + centroid), keeps a bounded
//! trajectory and a cumulative dwell time per identity, draws trail overlays
//! and produces an end-of-stream report.

pub mod annotation;
pub mod detection;
pub mod pipeline;
pub mod reporting;
pub mod shared;
pub mod tracking;
pub mod video;
