pub const DEFAULT_BLUR_KERNEL_SIZE: usize = 51;

pub const DEFAULT_BOX_WIDTH: u32 = 139;
pub const DEFAULT_BOX_HEIGHT: u32 = 51;

/// Seconds the watermark stays at one position. Source dependent; 2.5 s
/// has also been observed.
pub const DEFAULT_CYCLE_INTERVAL_SECS: f64 = 2.3;

/// Number of anchor positions the watermark cycles through.
pub const POSITION_COUNT: usize = 3;

/// Frames per position for the discrete 227-frame pattern.
pub const FRAME_PATTERN: [usize; POSITION_COUNT] = [66, 80, 81];

pub const STANDARD_FEATHER_SIZE: usize = 10;
pub const EDGE_AWARE_FEATHER_SIZE: usize = 15;

pub const BILATERAL_DIAMETER: usize = 9;
pub const BILATERAL_SIGMA_COLOR: f64 = 75.0;
pub const BILATERAL_SIGMA_SPACE: f64 = 75.0;

/// Gaussian passes applied after the bilateral filter in edge-aware mode.
pub const EDGE_AWARE_GAUSSIAN_PASSES: usize = 2;
