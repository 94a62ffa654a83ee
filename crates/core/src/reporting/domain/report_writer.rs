use std::path::Path;

use super::report::Report;

/// Persists a finished report for the presentation layer.
pub trait ReportWriter: Send {
    fn write(&self, path: &Path, report: &Report) -> Result<(), Box<dyn std::error::Error>>;
}
