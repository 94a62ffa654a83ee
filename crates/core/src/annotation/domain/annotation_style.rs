/// Visual parameters for trail overlays and the unique-count label.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationStyle {
    pub marker_radius: i32,
    /// Line width in pixels; values below 1 are drawn as 1.
    pub trail_thickness: u32,
    /// Top-left corner of the label box.
    pub label_origin: (u32, u32),
    /// Line height of the label text in pixels.
    pub label_height: f32,
    pub label_color: [u8; 3],
    pub label_background: Option<[u8; 3]>,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            marker_radius: 5,
            trail_thickness: 2,
            label_origin: (10, 10),
            label_height: 24.0,
            label_color: [255, 255, 255],
            label_background: Some([0, 0, 0]),
        }
    }
}

/// Text of the live unique-object counter.
pub fn unique_count_label(count: usize) -> String {
    format!("UNIQUE OBJECTS: {count}")
}
