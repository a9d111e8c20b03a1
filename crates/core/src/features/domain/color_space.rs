use ndarray::{Array3, ArrayView3};
use serde::{Deserialize, Serialize};

/// Color space the feature extractor works in.
///
/// Every variant maps RGB in `[0, 1]` to three channels in `[0, 1]`.
/// Hue and the CIE components are rescaled so one histogram range
/// covers all spaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    Rgb,
    Hsv,
    Luv,
    Hls,
    #[default]
    Yuv,
    YCrCb,
}

impl ColorSpace {
    pub const ALL: &[ColorSpace] = &[
        ColorSpace::Rgb,
        ColorSpace::Hsv,
        ColorSpace::Luv,
        ColorSpace::Hls,
        ColorSpace::Yuv,
        ColorSpace::YCrCb,
    ];

    pub fn convert_pixel(self, rgb: [f32; 3]) -> [f32; 3] {
        let [r, g, b] = rgb;
        let out = match self {
            ColorSpace::Rgb => rgb,
            ColorSpace::Hsv => rgb_to_hsv(r, g, b),
            ColorSpace::Luv => rgb_to_luv(r, g, b),
            ColorSpace::Hls => rgb_to_hls(r, g, b),
            ColorSpace::Yuv => rgb_to_yuv(r, g, b),
            ColorSpace::YCrCb => rgb_to_ycrcb(r, g, b),
        };
        out.map(|v| v.clamp(0.0, 1.0))
    }
}

impl std::fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorSpace::Rgb => write!(f, "RGB"),
            ColorSpace::Hsv => write!(f, "HSV"),
            ColorSpace::Luv => write!(f, "LUV"),
            ColorSpace::Hls => write!(f, "HLS"),
            ColorSpace::Yuv => write!(f, "YUV"),
            ColorSpace::YCrCb => write!(f, "YCrCb"),
        }
    }
}

/// Normalizes an RGB `u8` view of shape `(h, w, 3)` to `[0, 1]` and
/// converts every pixel into `color_space`.
pub fn to_feature_space(rgb: ArrayView3<u8>, color_space: ColorSpace) -> Array3<f32> {
    let (h, w, _) = rgb.dim();
    let mut out = Array3::<f32>::zeros((h, w, 3));
    for y in 0..h {
        for x in 0..w {
            let px = [
                rgb[[y, x, 0]] as f32 / 255.0,
                rgb[[y, x, 1]] as f32 / 255.0,
                rgb[[y, x, 2]] as f32 / 255.0,
            ];
            let converted = color_space.convert_pixel(px);
            for (c, v) in converted.into_iter().enumerate() {
                out[[y, x, c]] = v;
            }
        }
    }
    out
}

fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

fn rgb_to_yuv(r: f32, g: f32, b: f32) -> [f32; 3] {
    let y = luma(r, g, b);
    [y, 0.492 * (b - y) + 0.5, 0.877 * (r - y) + 0.5]
}

fn rgb_to_ycrcb(r: f32, g: f32, b: f32) -> [f32; 3] {
    let y = luma(r, g, b);
    [y, 0.713 * (r - y) + 0.5, 0.564 * (b - y) + 0.5]
}

/// Hue in degrees `[0, 360)` plus max/min/delta, shared by HSV and HLS.
fn hue(r: f32, g: f32, b: f32) -> (f32, f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta) % 6.0)
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    (h, max, min, delta)
}

fn rgb_to_hsv(r: f32, g: f32, b: f32) -> [f32; 3] {
    let (h, max, _min, delta) = hue(r, g, b);
    let s = if max > 0.0 { delta / max } else { 0.0 };
    [h / 360.0, s, max]
}

fn rgb_to_hls(r: f32, g: f32, b: f32) -> [f32; 3] {
    let (h, max, min, delta) = hue(r, g, b);
    let l = (max + min) / 2.0;
    let s = if delta == 0.0 {
        0.0
    } else if l < 0.5 {
        delta / (max + min)
    } else {
        delta / (2.0 - max - min)
    };
    [h / 360.0, l, s]
}

// D65 white point chromaticity.
const UN: f32 = 0.197_939_43;
const VN: f32 = 0.468_310_96;

fn rgb_to_luv(r: f32, g: f32, b: f32) -> [f32; 3] {
    let x = 0.412_453 * r + 0.357_580 * g + 0.180_423 * b;
    let y = 0.212_671 * r + 0.715_160 * g + 0.072_169 * b;
    let z = 0.019_334 * r + 0.119_193 * g + 0.950_227 * b;

    let l = if y > 0.008_856 {
        116.0 * y.cbrt() - 16.0
    } else {
        903.3 * y
    };
    let d = x + 15.0 * y + 3.0 * z;
    let (u_prime, v_prime) = if d > 0.0 {
        (4.0 * x / d, 9.0 * y / d)
    } else {
        (UN, VN)
    };
    let u = 13.0 * l * (u_prime - UN);
    let v = 13.0 * l * (v_prime - VN);

    // L in [0, 100], u in [-134, 220], v in [-140, 122]
    [l / 100.0, (u + 134.0) / 354.0, (v + 140.0) / 262.0]
}
