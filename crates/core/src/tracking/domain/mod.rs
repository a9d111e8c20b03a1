pub mod evidence_tracker;
pub mod heat_map;
pub mod labeled_region;
