use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::detection_provider::DetectionProvider;
use crate::shared::frame::Frame;
use crate::shared::identity::{Centroid, Identity};

#[derive(Debug, Error)]
pub enum AnnotationFileError {
    #[error("failed to read annotations: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: frame {frame} does not come after frame {previous}")]
    Unsorted {
        line: usize,
        frame: usize,
        previous: usize,
    },
    #[error("line {line}: object {id} has neither center nor bbox")]
    MissingPosition { line: usize, id: Identity },
    #[error("line {line}: object {id} appears more than once")]
    DuplicateIdentity { line: usize, id: Identity },
}

#[derive(Debug, Deserialize)]
struct FrameRecord {
    frame: usize,
    #[serde(default)]
    objects: Vec<ObjectRecord>,
}

#[derive(Debug, Deserialize)]
struct ObjectRecord {
    id: Identity,
    #[serde(default)]
    center: Option<[i32; 2]>,
    #[serde(default)]
    bbox: Option<[f64; 4]>,
}

/// Replays detections from a JSON-lines annotation file.
///
/// One line per annotated frame, frames strictly ascending:
///
/// ```text
/// {"frame": 0, "objects": [{"id": 1, "bbox": [10, 20, 50, 80]}]}
/// {"frame": 1, "objects": [{"id": 1, "center": [31, 52]}, {"id": 2, "center": [200, 40]}]}
/// ```
///
/// Frames without a line yield no detections. Reads at most one line ahead
/// of the frame being served.
pub struct JsonlDetectionProvider<R> {
    reader: R,
    line_number: usize,
    last_frame: Option<usize>,
    pending: Option<(usize, FrameRecord)>,
    exhausted: bool,
}

impl JsonlDetectionProvider<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, AnnotationFileError> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> JsonlDetectionProvider<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            last_frame: None,
            pending: None,
            exhausted: false,
        }
    }

    /// Detections annotated for the frame with decode index `frame_index`.
    ///
    /// Indices must be requested in ascending order; annotations for
    /// indices that were skipped over are discarded.
    pub fn detections_for(
        &mut self,
        frame_index: usize,
    ) -> Result<Vec<Detection>, AnnotationFileError> {
        loop {
            if self.pending.is_none() {
                self.pending = self.read_record()?;
            }
            let Some((line, record)) = self.pending.take() else {
                return Ok(Vec::new());
            };

            if record.frame < frame_index {
                log::warn!(
                    "Discarding annotations for frame {} (already at frame {frame_index})",
                    record.frame
                );
                continue;
            }
            if record.frame > frame_index {
                self.pending = Some((line, record));
                return Ok(Vec::new());
            }
            return to_detections(line, record);
        }
    }

    fn read_record(&mut self) -> Result<Option<(usize, FrameRecord)>, AnnotationFileError> {
        if self.exhausted {
            return Ok(None);
        }
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                self.exhausted = true;
                return Ok(None);
            }
            self.line_number += 1;
            let text = buf.trim();
            if text.is_empty() {
                continue;
            }

            let line = self.line_number;
            let record: FrameRecord = serde_json::from_str(text)
                .map_err(|source| AnnotationFileError::Json { line, source })?;

            if let Some(previous) = self.last_frame {
                if record.frame <= previous {
                    return Err(AnnotationFileError::Unsorted {
                        line,
                        frame: record.frame,
                        previous,
                    });
                }
            }
            self.last_frame = Some(record.frame);
            return Ok(Some((line, record)));
        }
    }
}

fn to_detections(line: usize, record: FrameRecord) -> Result<Vec<Detection>, AnnotationFileError> {
    let mut seen = HashSet::with_capacity(record.objects.len());
    record
        .objects
        .into_iter()
        .map(|obj| {
            if !seen.insert(obj.id) {
                return Err(AnnotationFileError::DuplicateIdentity { line, id: obj.id });
            }
            let centroid = match (obj.center, obj.bbox) {
                (Some([x, y]), _) => Centroid::new(x, y),
                (None, Some(bbox)) => Centroid::from_bbox(bbox),
                (None, None) => {
                    return Err(AnnotationFileError::MissingPosition { line, id: obj.id })
                }
            };
            Ok(Detection {
                identity: obj.id,
                centroid,
            })
        })
        .collect()
}

impl<R: BufRead + Send> DetectionProvider for JsonlDetectionProvider<R> {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Box<dyn std::error::Error>> {
        Ok(self.detections_for(frame.index())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn provider(text: &str) -> JsonlDetectionProvider<Cursor<Vec<u8>>> {
        JsonlDetectionProvider::from_reader(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn test_serves_annotated_frames_and_fills_gaps() {
        let mut p = provider(concat!(
            "{\"frame\": 0, \"objects\": [{\"id\": 1, \"center\": [3, 4]}]}\n",
            "\n",
            "{\"frame\": 2, \"objects\": [{\"id\": 1, \"center\": [5, 4]}, {\"id\": 2, \"bbox\": [0, 0, 10, 10]}]}\n",
        ));

        assert_eq!(p.detections_for(0).unwrap(), vec![Detection::new(Identity(1), (3, 4))]);
        assert!(p.detections_for(1).unwrap().is_empty());
        assert_eq!(
            p.detections_for(2).unwrap(),
            vec![Detection::new(Identity(1), (5, 4)), Detection::new(Identity(2), (5, 5))]
        );
        assert!(p.detections_for(3).unwrap().is_empty());
    }

    #[test]
    fn test_frame_without_objects_field_is_empty() {
        let mut p = provider("{\"frame\": 0}\n");
        assert!(p.detections_for(0).unwrap().is_empty());
    }

    #[test]
    fn test_skipped_frames_discard_their_annotations() {
        let mut p = provider(concat!(
            "{\"frame\": 0, \"objects\": [{\"id\": 1, \"center\": [0, 0]}]}\n",
            "{\"frame\": 1, \"objects\": [{\"id\": 2, \"center\": [0, 0]}]}\n",
            "{\"frame\": 4, \"objects\": [{\"id\": 3, \"center\": [0, 0]}]}\n",
        ));
        assert_eq!(p.detections_for(4).unwrap(), vec![Detection::new(Identity(3), (0, 0))]);
    }

    #[test]
    fn test_center_takes_precedence_over_bbox() {
        let mut p = provider(
            "{\"frame\": 0, \"objects\": [{\"id\": 1, \"center\": [1, 1], \"bbox\": [0, 0, 100, 100]}]}\n",
        );
        assert_eq!(p.detections_for(0).unwrap(), vec![Detection::new(Identity(1), (1, 1))]);
    }

    #[test]
    fn test_unsorted_frames_are_rejected() {
        let mut p = provider(concat!(
            "{\"frame\": 3, \"objects\": []}\n",
            "{\"frame\": 3, \"objects\": []}\n",
        ));
        p.detections_for(3).unwrap();
        let err = p.detections_for(4).unwrap_err();
        assert!(matches!(
            err,
            AnnotationFileError::Unsorted {
                line: 2,
                frame: 3,
                previous: 3
            }
        ));
    }

    #[test]
    fn test_invalid_json_reports_line() {
        let mut p = provider("{\"frame\": 0}\nnot json\n");
        p.detections_for(0).unwrap();
        let err = p.detections_for(1).unwrap_err();
        assert!(matches!(err, AnnotationFileError::Json { line: 2, .. }));
        assert!(err.to_string().starts_with("line 2:"));
    }

    #[test]
    fn test_object_without_position_is_rejected() {
        let mut p = provider("{\"frame\": 0, \"objects\": [{\"id\": 9}]}\n");
        let err = p.detections_for(0).unwrap_err();
        assert!(matches!(
            err,
            AnnotationFileError::MissingPosition {
                line: 1,
                id: Identity(9)
            }
        ));
    }

    #[test]
    fn test_repeated_identity_within_a_frame_is_rejected() {
        let mut p = provider(concat!(
            "{\"frame\": 0, \"objects\": [{\"id\": 4, \"center\": [1, 1]}]}\n",
            "{\"frame\": 1, \"objects\": [{\"id\": 1, \"center\": [0, 0]}, {\"id\": 1, \"center\": [9, 9]}]}\n",
        ));
        assert_eq!(p.detections_for(0).unwrap(), vec![Detection::new(Identity(4), (1, 1))]);

        let err = p.detections_for(1).unwrap_err();
        assert!(matches!(
            err,
            AnnotationFileError::DuplicateIdentity {
                line: 2,
                id: Identity(1)
            }
        ));
        assert_eq!(err.to_string(), "line 2: object 1 appears more than once");
    }

    #[test]
    fn test_detect_uses_frame_index() {
        let mut p = provider("{\"frame\": 1, \"objects\": [{\"id\": 4, \"center\": [7, 8]}]}\n");
        let frame = Frame::filled(2, 2, [0, 0, 0], 1);
        let dets = p.detect(&frame).unwrap();
        assert_eq!(dets, vec![Detection::new(Identity(4), (7, 8))]);
    }

    #[test]
    fn test_open_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("detections.jsonl");
        std::fs::write(&path, "{\"frame\": 0, \"objects\": [{\"id\": 5, \"center\": [1, 2]}]}\n")
            .unwrap();
        let mut p = JsonlDetectionProvider::open(&path).unwrap();
        assert_eq!(p.detections_for(0).unwrap(), vec![Detection::new(Identity(5), (1, 2))]);
    }

    #[test]
    fn test_open_missing_file_fails() {
        let err = JsonlDetectionProvider::open(Path::new("/nonexistent/detections.jsonl"));
        assert!(matches!(err, Err(AnnotationFileError::Io(_))));
    }
}
