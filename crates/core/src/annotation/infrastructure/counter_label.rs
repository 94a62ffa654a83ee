//! On-frame text label: an optional filled box behind antialiased text set
//! in the bundled DejaVu Sans face.

use ab_glyph::{Font, FontRef, InvalidFont, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use ndarray::{s, Axis};

use crate::shared::frame::Frame;

static FONT_DATA: &[u8] = include_bytes!("../../../assets/DejaVuSans.ttf");

pub(crate) fn label_font() -> Result<FontRef<'static>, InvalidFont> {
    FontRef::try_from_slice(FONT_DATA)
}

/// Width of `text` and the full line height (ascent to descent) at `height` px.
pub(crate) fn label_extent(font: &FontRef<'_>, text: &str, height: f32) -> (u32, u32) {
    let scale = PxScale::from(height);
    let (width, _) = text_size(scale, font, text);
    let line = font.as_scaled(scale).height().ceil().max(0.0) as u32;
    (width, line)
}

/// Draws `text` with its line box's top-left at `origin`.
pub(crate) fn draw_label(
    canvas: &mut RgbImage,
    font: &FontRef<'_>,
    text: &str,
    origin: (u32, u32),
    height: f32,
    color: [u8; 3],
) {
    draw_text_mut(
        canvas,
        Rgb(color),
        origin.0 as i32,
        origin.1 as i32,
        PxScale::from(height),
        font,
        text,
    );
}

/// Fills a rectangle, clipped to the frame.
pub(crate) fn fill_rect(frame: &mut Frame, x: u32, y: u32, w: u32, h: u32, color: [u8; 3]) {
    let x0 = x.min(frame.width()) as usize;
    let y0 = y.min(frame.height()) as usize;
    let x1 = x.saturating_add(w).min(frame.width()) as usize;
    let y1 = y.saturating_add(h).min(frame.height()) as usize;
    if x0 >= x1 || y0 >= y1 {
        return;
    }

    let mut pixels = frame.as_ndarray_mut();
    let mut region = pixels.slice_mut(s![y0..y1, x0..x1, ..]);
    for (channel, value) in color.iter().enumerate() {
        region.index_axis_mut(Axis(2), channel).fill(*value);
    }
}
