pub mod color_space;
pub mod feature_params;
