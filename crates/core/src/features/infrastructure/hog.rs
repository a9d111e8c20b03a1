//! Histogram of oriented gradients over a single image channel.
//!
//! The grid is computed once per search region and sliced per window,
//! which is what makes dense sliding-window search affordable.

use ndarray::{s, Array3, ArrayView2, ArrayView3, Axis};

const EPS: f32 = 1e-5;
const L2_HYS_CLIP: f32 = 0.2;

/// Block-normalized gradient histograms for one channel.
///
/// Shape: `(blocks_y, blocks_x, cells_per_block² × orientations)`, with
/// the last axis ordered `(cell_y, cell_x, orientation)`.
pub fn hog_grid(
    channel: ArrayView2<f32>,
    orientations: usize,
    pixels_per_cell: usize,
    cells_per_block: usize,
) -> Array3<f32> {
    let cells = cell_histograms(channel, orientations, pixels_per_cell);
    normalize_blocks(cells.view(), cells_per_block)
}

/// Per-cell orientation histograms weighted by gradient magnitude.
///
/// Gradients are centered differences with zero at the image border.
/// Orientation is unsigned (`[0°, 180°)`), and every bin is divided by
/// the cell area. Trailing rows/columns that do not fill a whole cell
/// are ignored.
pub fn cell_histograms(
    channel: ArrayView2<f32>,
    orientations: usize,
    pixels_per_cell: usize,
) -> Array3<f32> {
    let (h, w) = channel.dim();
    let n_cy = h / pixels_per_cell;
    let n_cx = w / pixels_per_cell;
    let mut hist = Array3::<f32>::zeros((n_cy, n_cx, orientations));
    if n_cy == 0 || n_cx == 0 || orientations == 0 {
        return hist;
    }

    let bin_width = 180.0 / orientations as f32;
    let cell_area = (pixels_per_cell * pixels_per_cell) as f32;

    for y in 0..n_cy * pixels_per_cell {
        for x in 0..n_cx * pixels_per_cell {
            let gx = if x > 0 && x + 1 < w {
                channel[[y, x + 1]] - channel[[y, x - 1]]
            } else {
                0.0
            };
            let gy = if y > 0 && y + 1 < h {
                channel[[y + 1, x]] - channel[[y - 1, x]]
            } else {
                0.0
            };

            let magnitude = (gx * gx + gy * gy).sqrt();
            if magnitude == 0.0 {
                continue;
            }

            let mut angle = gy.atan2(gx).to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }
            if angle >= 180.0 {
                angle -= 180.0;
            }
            let bin = ((angle / bin_width) as usize).min(orientations - 1);
            hist[[y / pixels_per_cell, x / pixels_per_cell, bin]] += magnitude / cell_area;
        }
    }

    hist
}

/// Groups cells into overlapping blocks (stride one cell) and applies
/// L2-Hys normalization to each block.
pub fn normalize_blocks(cells: ArrayView3<f32>, cells_per_block: usize) -> Array3<f32> {
    let (n_cy, n_cx, orientations) = cells.dim();
    let block_len = cells_per_block * cells_per_block * orientations;
    if cells_per_block == 0 || n_cy < cells_per_block || n_cx < cells_per_block {
        return Array3::zeros((0, 0, block_len));
    }

    let n_by = n_cy - cells_per_block + 1;
    let n_bx = n_cx - cells_per_block + 1;
    let mut out = Array3::<f32>::zeros((n_by, n_bx, block_len));
    let mut block = Vec::with_capacity(block_len);

    for by in 0..n_by {
        for bx in 0..n_bx {
            block.clear();
            block.extend(
                cells
                    .slice(s![by..by + cells_per_block, bx..bx + cells_per_block, ..])
                    .iter()
                    .copied(),
            );
            l2_hys(&mut block);
            for (i, v) in block.iter().enumerate() {
                out[[by, bx, i]] = *v;
            }
        }
    }

    out
}

fn l2_normalize(v: &mut [f32]) {
    let norm = (v.iter().map(|x| x * x).sum::<f32>() + EPS * EPS).sqrt();
    for x in v.iter_mut() {
        *x /= norm;
    }
}

fn l2_hys(v: &mut [f32]) {
    l2_normalize(v);
    for x in v.iter_mut() {
        *x = x.min(L2_HYS_CLIP);
    }
    l2_normalize(v);
}

/// Gradient grids for every selected channel of one search region.
#[derive(Clone, Debug)]
pub struct GradientGrid {
    channels: Vec<Array3<f32>>,
    blocks_per_window: usize,
}

impl GradientGrid {
    /// Computes a grid for each channel index of an `(h, w, c)` image.
    pub fn compute(
        image: ArrayView3<f32>,
        channel_indices: &[usize],
        orientations: usize,
        pixels_per_cell: usize,
        cells_per_block: usize,
        blocks_per_window: usize,
    ) -> Self {
        let channels = channel_indices
            .iter()
            .map(|&c| {
                hog_grid(
                    image.index_axis(Axis(2), c),
                    orientations,
                    pixels_per_cell,
                    cells_per_block,
                )
            })
            .collect();
        Self {
            channels,
            blocks_per_window,
        }
    }

    pub fn blocks_y(&self) -> usize {
        self.channels.first().map_or(0, |g| g.dim().0)
    }

    pub fn blocks_x(&self) -> usize {
        self.channels.first().map_or(0, |g| g.dim().1)
    }

    pub fn blocks_per_window(&self) -> usize {
        self.blocks_per_window
    }

    /// Appends the window starting at block `(block_y, block_x)`, channel
    /// by channel, each flattened in `(block_y, block_x, value)` order.
    ///
    /// Returns false without touching `out` if the window does not fit.
    pub fn window_features(&self, block_y: usize, block_x: usize, out: &mut Vec<f32>) -> bool {
        let n = self.blocks_per_window;
        if block_y + n > self.blocks_y() || block_x + n > self.blocks_x() {
            return false;
        }
        for grid in &self.channels {
            out.extend(
                grid.slice(s![block_y..block_y + n, block_x..block_x + n, ..])
                    .iter()
                    .copied(),
            );
        }
        true
    }

    /// Flattens every block of every channel.
    pub fn flatten(&self) -> Vec<f32> {
        self.channels
            .iter()
            .flat_map(|g| g.iter().copied())
            .collect()
    }
}
