pub mod multi_scale_detector;
pub mod window_scanner;
