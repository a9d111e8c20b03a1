pub mod vehicle_detector;
