/// Number of recent centroids kept per identity.
pub const TRAJECTORY_CAPACITY: usize = 30;

pub const DEFAULT_REPORT_FILENAME: &str = "report.txt";

/// Trail colours, picked per identity so neighbouring IDs stay distinguishable.
pub const TRAIL_PALETTE: &[[u8; 3]] = &[
    [230, 25, 75],
    [60, 180, 75],
    [255, 225, 25],
    [0, 130, 200],
    [245, 130, 48],
    [145, 30, 180],
    [70, 240, 240],
    [240, 50, 230],
    [210, 245, 60],
    [250, 190, 212],
];

pub fn trail_color(identity: u32) -> [u8; 3] {
    TRAIL_PALETTE[identity as usize % TRAIL_PALETTE.len()]
}
