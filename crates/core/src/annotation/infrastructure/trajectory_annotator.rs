use ab_glyph::FontRef;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::annotation::domain::annotation_style::{unique_count_label, AnnotationStyle};
use crate::annotation::domain::frame_annotator::FrameAnnotator;
use crate::shared::constants::trail_color;
use crate::shared::frame::Frame;
use crate::tracking::domain::track::Track;
use crate::tracking::domain::track_ledger::TrackLedger;
use crate::tracking::domain::tracking_error::TrackingError;

use super::counter_label::{draw_label, fill_rect, label_extent, label_font};

type Point = (f64, f64);

/// Draws a trail polyline and a position marker for every identity seen in
/// the current frame, plus the running unique-object counter.
///
/// Works on a copy of the frame; the input buffer is never modified.
pub struct TrajectoryAnnotator {
    style: AnnotationStyle,
}

impl TrajectoryAnnotator {
    pub fn new(style: AnnotationStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    pub fn render(&self, frame: &Frame, ledger: &TrackLedger) -> Result<Frame, TrackingError> {
        if frame.channels() != 3 {
            return Err(TrackingError::UnsupportedFrameLayout {
                channels: frame.channels(),
            });
        }
        let font = label_font()?;

        let mut canvas = to_canvas(frame.clone())?;
        for track in ledger.visible_tracks() {
            self.draw_track(&mut canvas, track);
        }

        let text = unique_count_label(ledger.unique_count());
        let mut annotated = to_frame(canvas, frame.index());
        if let Some(background) = self.style.label_background {
            self.draw_label_box(&mut annotated, &font, &text, background);
        }
        let mut canvas = to_canvas(annotated)?;
        draw_label(
            &mut canvas,
            &font,
            &text,
            self.style.label_origin,
            self.label_height(),
            self.style.label_color,
        );
        Ok(to_frame(canvas, frame.index()))
    }

    fn label_height(&self) -> f32 {
        self.style.label_height.max(1.0)
    }

    fn draw_track(&self, canvas: &mut RgbImage, track: &Track) {
        let color = Rgb(trail_color(track.identity().0));
        let points: Vec<Point> = track
            .trajectory()
            .iter()
            .map(|c| (f64::from(c.x), f64::from(c.y)))
            .collect();

        for pair in points.windows(2) {
            self.draw_thick_segment(canvas, pair[0], pair[1], color);
        }

        if let Some(latest) = track.trajectory().latest() {
            let radius = self.style.marker_radius.max(0);
            let (width, height) = canvas.dimensions();
            let reach_x = -i64::from(radius)..=i64::from(width) + i64::from(radius);
            let reach_y = -i64::from(radius)..=i64::from(height) + i64::from(radius);
            if reach_x.contains(&i64::from(latest.x)) && reach_y.contains(&i64::from(latest.y)) {
                draw_filled_circle_mut(canvas, (latest.x, latest.y), radius, color);
            }
        }
    }

    fn draw_thick_segment(&self, canvas: &mut RgbImage, start: Point, end: Point, color: Rgb<u8>) {
        let thickness = self.style.trail_thickness.max(1) as i32;
        let pad = f64::from(thickness) + 1.0;
        let (width, height) = canvas.dimensions();
        let Some((start, end)) = clip_segment(
            start,
            end,
            (-pad, -pad),
            (f64::from(width) - 1.0 + pad, f64::from(height) - 1.0 + pad),
        ) else {
            return;
        };

        let first = -((thickness - 1) / 2);
        for ox in first..first + thickness {
            for oy in first..first + thickness {
                let (ox, oy) = (f64::from(ox), f64::from(oy));
                draw_line_segment_mut(
                    canvas,
                    ((start.0 + ox) as f32, (start.1 + oy) as f32),
                    ((end.0 + ox) as f32, (end.1 + oy) as f32),
                    color,
                );
            }
        }
    }

    fn draw_label_box(&self, frame: &mut Frame, font: &FontRef<'_>, text: &str, color: [u8; 3]) {
        let (x, y) = self.style.label_origin;
        let (w, h) = label_extent(font, text, self.label_height());
        let pad = (self.label_height() / 6.0).round() as u32;
        fill_rect(
            frame,
            x.saturating_sub(pad),
            y.saturating_sub(pad),
            w + 2 * pad,
            h + 2 * pad,
            color,
        );
    }
}

/// Liang-Barsky: the part of `start -> end` inside the box `min..=max`, or
/// `None` when the segment misses it entirely.
fn clip_segment(start: Point, end: Point, min: Point, max: Point) -> Option<(Point, Point)> {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    let edges = [
        (-dx, start.0 - min.0),
        (dx, max.0 - start.0),
        (-dy, start.1 - min.1),
        (dy, max.1 - start.1),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((
        (start.0 + t0 * dx, start.1 + t0 * dy),
        (start.0 + t1 * dx, start.1 + t1 * dy),
    ))
}

fn to_canvas(frame: Frame) -> Result<RgbImage, TrackingError> {
    let (width, height, channels) = (frame.width(), frame.height(), frame.channels());
    RgbImage::from_raw(width, height, frame.into_data())
        .ok_or(TrackingError::UnsupportedFrameLayout { channels })
}

fn to_frame(canvas: RgbImage, index: usize) -> Frame {
    let (width, height) = canvas.dimensions();
    Frame::new(canvas.into_raw(), width, height, 3, index)
}

impl Default for TrajectoryAnnotator {
    fn default() -> Self {
        Self::new(AnnotationStyle::default())
    }
}

impl FrameAnnotator for TrajectoryAnnotator {
    fn annotate(
        &self,
        frame: &Frame,
        ledger: &TrackLedger,
    ) -> Result<Frame, Box<dyn std::error::Error>> {
        Ok(self.render(frame, ledger)?)
    }
}
