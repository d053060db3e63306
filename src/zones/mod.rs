// src/zones/mod.rs
pub mod swing_detector;
pub mod zone_aggregator;
pub mod zone_detection;

pub use swing_detector::detect_swing_points;
pub use zone_aggregator::cluster_zones;
pub use zone_detection::{ZoneDetectionEngine, ZoneDetectionResult};
