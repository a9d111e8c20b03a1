pub mod heat_map_renderer;
pub mod rectangle_annotator;
