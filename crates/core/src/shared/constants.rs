/// Scales searched per frame; larger scales look for closer vehicles.
pub const DEFAULT_SCALES: &[f64] = &[1.0, 1.25, 1.5, 1.75, 2.0, 2.25, 2.5, 3.0];

/// Search band rows for a 1280x720 dash camera: below the horizon,
/// above the hood.
pub const DEFAULT_YSTART: u32 = 400;
pub const DEFAULT_YSTOP: u32 = 656;

pub const DEFAULT_CELLS_PER_STEP: usize = 2;

pub const DEFAULT_MAX_FRAMES: usize = 5;
pub const DEFAULT_EVICT_COUNT: usize = 2;
pub const DEFAULT_HEAT_THRESHOLD: u32 = 5;

/// Box outline color (RGB) and thickness in pixels.
pub const DEFAULT_BOX_COLOR: [u8; 3] = [0, 0, 255];
pub const DEFAULT_BOX_THICKNESS: u32 = 6;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
