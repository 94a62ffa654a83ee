use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::reporting::domain::report::Report;
use crate::reporting::domain::report_writer::ReportWriter;

/// Writes the report as pretty-printed JSON for machine consumers.
pub struct JsonReportWriter;

impl JsonReportWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportWriter for JsonReportWriter {
    fn write(&self, path: &Path, report: &Report) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, report)?;
        out.write_all(b"\n")?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::domain::report::ObjectTime;
    use crate::shared::identity::Identity;

    #[test]
    fn test_writes_parseable_json() {
        let report = Report {
            total_unique_objects: 2,
            video_duration: 1.0,
            processing_fps: 30.0,
            frame_count: 30,
            object_times: vec![
                ObjectTime {
                    identity: Identity(2),
                    seconds: 0.5,
                },
                ObjectTime {
                    identity: Identity(1),
                    seconds: 1.0,
                },
            ],
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        JsonReportWriter::new().write(&path, &report).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["frame_count"], 30);
        assert_eq!(value["object_times"][0]["identity"], 2);
        assert_eq!(value["object_times"][1]["seconds"], 1.0);
    }
}
