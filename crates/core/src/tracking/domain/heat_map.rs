use ndarray::{s, Array2, ArrayView2};

use super::labeled_region::LabeledRegion;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::math::{find, union};

/// Per-pixel count of detection boxes, `(height, width)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeatMap {
    data: Array2<u32>,
}

impl HeatMap {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: Array2::zeros((height as usize, width as usize)),
        }
    }

    pub fn width(&self) -> u32 {
        self.data.dim().1 as u32
    }

    pub fn height(&self) -> u32 {
        self.data.dim().0 as u32
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.data[[y as usize, x as usize]]
    }

    pub fn max(&self) -> u32 {
        self.data.iter().copied().max().unwrap_or(0)
    }

    pub fn as_array(&self) -> ArrayView2<'_, u32> {
        self.data.view()
    }

    /// Adds one to every pixel of `bbox` inside the map. Returns false
    /// when the box misses the map entirely.
    pub fn add_box(&mut self, bbox: &BoundingBox) -> bool {
        let Some(clipped) = bbox.clip(self.width(), self.height()) else {
            return false;
        };
        self.data
            .slice_mut(s![
                clipped.top() as usize..clipped.bottom() as usize,
                clipped.left() as usize..clipped.right() as usize
            ])
            .mapv_inplace(|v| v.saturating_add(1));
        true
    }

    pub fn add_heat<'a>(&mut self, boxes: impl IntoIterator<Item = &'a BoundingBox>) {
        for bbox in boxes {
            self.add_box(bbox);
        }
    }

    /// Zeroes every pixel at or below `threshold`.
    pub fn apply_threshold(&mut self, threshold: u32) {
        self.data.mapv_inplace(|v| if v <= threshold { 0 } else { v });
    }

    /// 4-connected component labeling of the non-zero pixels.
    ///
    /// Two passes over the map: provisional labels with union-find on
    /// the left/up neighbours, then resolution to final labels `1..=n`
    /// in raster order of each component's first pixel.
    pub fn label(&self) -> Vec<LabeledRegion> {
        let (h, w) = self.data.dim();
        let mut labels = vec![0usize; h * w];
        // parent[0] is the background sentinel
        let mut parent: Vec<usize> = vec![0];

        for y in 0..h {
            for x in 0..w {
                if self.data[[y, x]] == 0 {
                    continue;
                }
                let left = if x > 0 { labels[y * w + x - 1] } else { 0 };
                let up = if y > 0 { labels[(y - 1) * w + x] } else { 0 };
                labels[y * w + x] = match (left, up) {
                    (0, 0) => {
                        let next = parent.len();
                        parent.push(next);
                        next
                    }
                    (l, 0) => l,
                    (0, u) => u,
                    (l, u) => {
                        union(&mut parent, l, u);
                        l.min(u)
                    }
                };
            }
        }

        // Root label -> index into `stats`
        let mut slot = vec![usize::MAX; parent.len()];
        let mut stats: Vec<RegionStats> = Vec::new();

        for y in 0..h {
            for x in 0..w {
                let provisional = labels[y * w + x];
                if provisional == 0 {
                    continue;
                }
                let root = find(&mut parent, provisional);
                if slot[root] == usize::MAX {
                    slot[root] = stats.len();
                    stats.push(RegionStats::new(x, y));
                }
                stats[slot[root]].add(x, y, self.data[[y, x]]);
            }
        }

        stats
            .into_iter()
            .enumerate()
            .filter_map(|(i, s)| s.into_region(i as u32 + 1))
            .collect()
    }
}

struct RegionStats {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
    pixel_count: usize,
    peak_heat: u32,
}

impl RegionStats {
    fn new(x: usize, y: usize) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            pixel_count: 0,
            peak_heat: 0,
        }
    }

    fn add(&mut self, x: usize, y: usize, heat: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.pixel_count += 1;
        self.peak_heat = self.peak_heat.max(heat);
    }

    fn into_region(self, label: u32) -> Option<LabeledRegion> {
        let bbox = BoundingBox::new(
            self.min_x as i32,
            self.min_y as i32,
            self.max_x as i32 + 1,
            self.max_y as i32 + 1,
        )
        .ok()?;
        Some(LabeledRegion {
            label,
            bbox,
            pixel_count: self.pixel_count,
            peak_heat: self.peak_heat,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(l: i32, t: i32, r: i32, b: i32) -> BoundingBox {
        BoundingBox::new(l, t, r, b).unwrap()
    }

    #[test]
    fn test_add_box_covers_half_open_range() {
        let mut heat = HeatMap::new(10, 10);
        heat.add_box(&bbox(2, 3, 5, 6));
        assert_eq!(heat.get(2, 3), 1);
        assert_eq!(heat.get(4, 5), 1);
        assert_eq!(heat.get(5, 5), 0);
        assert_eq!(heat.get(4, 6), 0);
        assert_eq!(heat.as_array().iter().sum::<u32>(), 9);
    }

    #[test]
    fn test_add_box_clips_to_map() {
        let mut heat = HeatMap::new(10, 10);
        assert!(heat.add_box(&bbox(-5, 8, 3, 20)));
        assert_eq!(heat.as_array().iter().sum::<u32>(), 3 * 2);
        assert!(!heat.add_box(&bbox(10, 0, 15, 5)));
    }

    #[test]
    fn test_overlap_accumulates() {
        let mut heat = HeatMap::new(10, 10);
        heat.add_heat(&[bbox(0, 0, 4, 4), bbox(2, 2, 6, 6)]);
        assert_eq!(heat.get(1, 1), 1);
        assert_eq!(heat.get(3, 3), 2);
        assert_eq!(heat.max(), 2);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let mut heat = HeatMap::new(4, 4);
        heat.add_heat(&[bbox(0, 0, 2, 2), bbox(0, 0, 1, 1)]);
        heat.apply_threshold(1);
        assert_eq!(heat.get(0, 0), 2);
        assert_eq!(heat.get(1, 1), 0);
    }

    #[test]
    fn test_empty_map_has_no_regions() {
        assert!(HeatMap::new(8, 8).label().is_empty());
    }

    #[test]
    fn test_single_box_region_equals_box() {
        let mut heat = HeatMap::new(20, 20);
        let b = bbox(3, 4, 11, 9);
        heat.add_box(&b);
        let regions = heat.label();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].label, 1);
        assert_eq!(regions[0].bbox, b);
        assert_eq!(regions[0].pixel_count, 8 * 5);
        assert_eq!(regions[0].peak_heat, 1);
    }

    #[test]
    fn test_disjoint_boxes_make_two_regions_in_raster_order() {
        let mut heat = HeatMap::new(20, 20);
        heat.add_heat(&[bbox(12, 10, 16, 14), bbox(1, 1, 5, 5)]);
        let regions = heat.label();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].bbox, bbox(1, 1, 5, 5));
        assert_eq!(regions[1].bbox, bbox(12, 10, 16, 14));
        assert_eq!(regions[1].label, 2);
    }

    #[test]
    fn test_diagonal_contact_is_not_connected() {
        let mut heat = HeatMap::new(10, 10);
        heat.add_heat(&[bbox(0, 0, 3, 3), bbox(3, 3, 6, 6)]);
        assert_eq!(heat.label().len(), 2);
    }

    #[test]
    fn test_edge_contact_is_connected() {
        let mut heat = HeatMap::new(10, 10);
        heat.add_heat(&[bbox(0, 0, 3, 3), bbox(3, 0, 6, 3)]);
        let regions = heat.label();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox, bbox(0, 0, 6, 3));
    }

    #[test]
    fn test_u_shape_merges_through_union_find() {
        // Two arms joined only on the bottom row: the right arm gets its
        // own provisional label until the join.
        let mut heat = HeatMap::new(7, 5);
        heat.add_heat(&[bbox(0, 0, 2, 5), bbox(5, 0, 7, 5), bbox(0, 4, 7, 5)]);
        let regions = heat.label();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox, bbox(0, 0, 7, 5));
    }

    #[test]
    fn test_overlap_region_after_threshold() {
        let mut heat = HeatMap::new(20, 20);
        heat.add_heat(&[bbox(0, 0, 10, 10), bbox(6, 7, 16, 17)]);
        heat.apply_threshold(1);
        let regions = heat.label();
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].bbox, bbox(6, 7, 10, 10));
        assert_eq!(regions[0].peak_heat, 2);
    }
}
