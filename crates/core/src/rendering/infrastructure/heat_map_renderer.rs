use crate::shared::frame::Frame;
use crate::tracking::domain::heat_map::HeatMap;

/// Gray RGB frame of the heat map, one intensity step per unit of heat,
/// saturating at 255.
pub fn render_heat_map(heat: &HeatMap, index: usize) -> Frame {
    let view = heat.as_array();
    let mut data = Vec::with_capacity(view.len() * 3);
    for &v in view.iter() {
        let g = v.min(255) as u8;
        data.extend_from_slice(&[g, g, g]);
    }
    Frame::new(data, heat.width(), heat.height(), 3, index)
}
