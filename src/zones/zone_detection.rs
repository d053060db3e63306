// src/zones/zone_detection.rs
// Candles -> swing points -> zones, shared by scheduled and forced runs

use crate::types::{Candle, LevelType, SwingPoint, Zone};
use crate::zones::swing_detector::{detect_swing_points, min_candles};
use crate::zones::zone_aggregator::cluster_zones;
use log::debug;

// ==================== ZONE DETECTION RESULT ====================

#[derive(Debug, Clone)]
pub struct ZoneDetectionResult {
    pub swing_points: Vec<SwingPoint>,
    /// Ascending by zone price.
    pub zones: Vec<Zone>,
    pub candles_analyzed: usize,
}

impl ZoneDetectionResult {
    pub fn zones_of(&self, level_type: LevelType) -> impl Iterator<Item = &Zone> {
        self.zones.iter().filter(move |z| z.level_type == level_type)
    }

    /// Zone of the given type closest to `price`, in either direction.
    pub fn nearest(&self, level_type: LevelType, price: f64) -> Option<&Zone> {
        nearest_zone(self.zones_of(level_type), price)
    }
}

pub fn nearest_zone<'a>(zones: impl Iterator<Item = &'a Zone>, price: f64) -> Option<&'a Zone> {
    zones.fold(None::<&Zone>, |best, zone| match best {
        Some(b) if b.distance_to(price) <= zone.distance_to(price) => Some(b),
        _ => Some(zone),
    })
}

// ==================== CORE ZONE DETECTION ENGINE ====================
#[derive(Debug, Clone)]
pub struct ZoneDetectionEngine {
    swing_window: usize,
    merge_distance: f64,
}

impl ZoneDetectionEngine {
    pub fn new(swing_window: usize, merge_distance: f64) -> Self {
        Self {
            swing_window,
            merge_distance,
        }
    }

    pub fn detect_zones(&self, candles: &[Candle]) -> ZoneDetectionResult {
        let swing_points = detect_swing_points(candles, self.swing_window);
        match min_candles(self.swing_window) {
            Some(needed) if candles.len() < needed => debug!(
                "[ZoneEngine] {} candles is below the {} needed to confirm a swing",
                candles.len(),
                needed
            ),
            None => debug!("[ZoneEngine] swing window {} is too large", self.swing_window),
            _ => {}
        }

        let zones = cluster_zones(&swing_points, self.merge_distance);
        debug!(
            "[ZoneEngine] {} candles -> {} swing points -> {} zones",
            candles.len(),
            swing_points.len(),
            zones.len()
        );

        ZoneDetectionResult {
            swing_points,
            zones,
            candles_analyzed: candles.len(),
        }
    }
}
