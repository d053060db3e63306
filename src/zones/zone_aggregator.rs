// src/zones/zone_aggregator.rs
// Greedy price-ordered clustering of swing points into zones

use crate::types::{LevelType, SwingPoint, Zone};
use std::cmp::Ordering;

pub const MAX_STRENGTH: u8 = 3;
/// Average wick ratio at which a zone earns one bonus strength point.
pub const WICK_BONUS_RATIO: f64 = 2.0;

/// Points accumulated for the zone currently being built.
struct OpenZone {
    level_type: LevelType,
    points: Vec<SwingPoint>,
    price_sum: f64,
}

impl OpenZone {
    fn seed(point: SwingPoint) -> Self {
        Self {
            level_type: point.level_type,
            price_sum: point.price,
            points: vec![point],
        }
    }

    fn mean_price(&self) -> f64 {
        self.price_sum / self.points.len() as f64
    }

    fn accepts(&self, point: &SwingPoint, merge_distance: f64) -> bool {
        point.level_type == self.level_type
            && (point.price - self.mean_price()).abs() <= merge_distance
    }

    fn push(&mut self, point: SwingPoint) {
        self.price_sum += point.price;
        self.points.push(point);
    }

    fn close(self) -> Zone {
        let zone_price = self.mean_price();
        let reaction_count = self.points.len();
        let avg_wick_ratio =
            self.points.iter().map(|p| p.wick_ratio).sum::<f64>() / reaction_count as f64;

        let mut strength = reaction_count.min(MAX_STRENGTH as usize) as u8;
        if avg_wick_ratio >= WICK_BONUS_RATIO && strength < MAX_STRENGTH {
            strength += 1;
        }

        let mut reactions = self.points;
        reactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Zone {
            level_type: self.level_type,
            zone_price,
            reaction_count,
            strength,
            avg_wick_ratio,
            reactions,
        }
    }
}

/// Cluster swing points into zones in one pass over the points sorted by price.
///
/// Each point joins the open zone when it has the same type and lies within
/// `merge_distance` of that zone's running mean; otherwise the zone is closed and the
/// point seeds the next one. The running mean drifts as points join: a zone can reach
/// past `merge_distance` from its seed, and a point right next to the zone's newest
/// member can still start a new zone. Zones come back in ascending price order.
pub fn cluster_zones(points: &[SwingPoint], merge_distance: f64) -> Vec<Zone> {
    let mut sorted = points.to_vec();
    // stable, so equal prices keep candle order
    sorted.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal));

    let mut zones = Vec::new();
    let mut iter = sorted.into_iter();
    let Some(first) = iter.next() else {
        return zones;
    };

    let mut current = OpenZone::seed(first);
    for point in iter {
        if current.accepts(&point, merge_distance) {
            current.push(point);
        } else {
            zones.push(std::mem::replace(&mut current, OpenZone::seed(point)).close());
        }
    }
    zones.push(current.close());

    zones
}
