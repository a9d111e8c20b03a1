pub mod color_features;
pub mod hog;
pub mod hog_color_extractor;
pub mod resample;
