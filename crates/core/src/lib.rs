pub mod classification;
pub mod detection;
pub mod features;
pub mod pipeline;
pub mod rendering;
pub mod shared;
pub mod tracking;
pub mod video;
