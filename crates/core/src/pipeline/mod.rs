pub mod detect_vehicles_use_case;
pub mod infrastructure;
pub mod pipeline_config;
pub mod pipeline_executor;
pub mod pipeline_logger;
pub mod track_vehicles_use_case;
