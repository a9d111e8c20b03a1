use ndarray::{Array3, ArrayView3};

/// Resize an `(h, w, c)` float image with bilinear interpolation.
///
/// Sample positions are aligned on pixel centers, so a uniform image
/// stays uniform and a same-size resize is an exact copy.
pub fn resize_bilinear(src: ArrayView3<f32>, out_h: usize, out_w: usize) -> Array3<f32> {
    let (in_h, in_w, channels) = src.dim();
    if in_h == out_h && in_w == out_w {
        return src.to_owned();
    }

    let mut out = Array3::<f32>::zeros((out_h, out_w, channels));
    if in_h == 0 || in_w == 0 || out_h == 0 || out_w == 0 {
        return out;
    }

    let ratio_y = in_h as f32 / out_h as f32;
    let ratio_x = in_w as f32 / out_w as f32;

    for y in 0..out_h {
        let (y0, y1, fy) = source_coords(y, ratio_y, in_h);
        for x in 0..out_w {
            let (x0, x1, fx) = source_coords(x, ratio_x, in_w);
            for c in 0..channels {
                let v00 = src[[y0, x0, c]];
                let v10 = src[[y0, x1, c]];
                let v01 = src[[y1, x0, c]];
                let v11 = src[[y1, x1, c]];

                out[[y, x, c]] = v00 * (1.0 - fx) * (1.0 - fy)
                    + v10 * fx * (1.0 - fy)
                    + v01 * (1.0 - fx) * fy
                    + v11 * fx * fy;
            }
        }
    }

    out
}

fn source_coords(dst: usize, ratio: f32, len: usize) -> (usize, usize, f32) {
    let s = ((dst as f32 + 0.5) * ratio - 0.5).max(0.0);
    let i0 = (s.floor() as usize).min(len - 1);
    let i1 = (i0 + 1).min(len - 1);
    let frac = if i1 == i0 { 0.0 } else { s - i0 as f32 };
    (i0, i1, frac)
}
