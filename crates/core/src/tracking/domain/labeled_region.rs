use crate::shared::bounding_box::BoundingBox;

/// One connected component of above-threshold heat.
///
/// Recomputed every cycle; `label` is only stable within one labeling.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabeledRegion {
    /// 1-based, assigned in raster order of each component's first pixel.
    pub label: u32,
    /// Half-open bounding rectangle of the component's pixels.
    pub bbox: BoundingBox,
    pub pixel_count: usize,
    pub peak_heat: u32,
}
