use std::path::Path;

use crate::reporting::domain::report::Report;
use crate::reporting::domain::report_writer::ReportWriter;

/// Writes the line-oriented text report.
pub struct TextReportWriter;

impl TextReportWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TextReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportWriter for TextReportWriter {
    fn write(&self, path: &Path, report: &Report) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, report.to_string())?;
        Ok(())
    }
}
