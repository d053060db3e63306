// src/zones/swing_detector.rs
// Confirmed swing highs/lows over a symmetric candle window

use crate::types::{Candle, LevelType, SwingPoint};

/// Floor for the candle body so doji candles don't divide by zero.
pub const MIN_BODY: f64 = 1e-5;

/// Scan `candles` for swing highs and lows confirmed by `window` candles on each side.
///
/// A candle is a swing high when no other candle in `[i - window, i + window]` has a
/// strictly greater high, so a plateau of equal highs yields one point per candle.
/// Lows mirror this with a strict-less comparison. Candles closer than `window` to
/// either end of the series are never evaluated, and a series shorter than
/// `2 * window + 1` produces nothing.
pub fn detect_swing_points(candles: &[Candle], window: usize) -> Vec<SwingPoint> {
    let mut points = Vec::new();
    let Some(span) = min_candles(window) else {
        return points;
    };
    if window == 0 || candles.len() < span {
        return points;
    }

    for i in window..candles.len() - window {
        let candle = &candles[i];
        let neighbours = &candles[i - window..=i + window];

        let is_swing_high = neighbours.iter().all(|other| other.high <= candle.high);
        let is_swing_low = neighbours.iter().all(|other| other.low >= candle.low);

        if is_swing_high {
            points.push(build_point(candle, i, LevelType::Resistance));
        }
        if is_swing_low {
            points.push(build_point(candle, i, LevelType::Support));
        }
    }

    points
}

/// `2 * window + 1`, or `None` when that overflows.
pub fn min_candles(window: usize) -> Option<usize> {
    window.checked_mul(2)?.checked_add(1)
}

/// Rejection wick divided by body for the side the swing point sits on.
pub fn wick_ratio(candle: &Candle, level_type: LevelType) -> f64 {
    let body = (candle.close - candle.open).abs().max(MIN_BODY);
    let wick = match level_type {
        LevelType::Resistance => candle.high - candle.body_top(),
        LevelType::Support => candle.body_bottom() - candle.low,
    };
    wick / body
}

fn build_point(candle: &Candle, index: usize, level_type: LevelType) -> SwingPoint {
    let price = match level_type {
        LevelType::Resistance => candle.high,
        LevelType::Support => candle.low,
    };
    SwingPoint {
        price,
        timestamp: candle.timestamp,
        wick_ratio: wick_ratio(candle, level_type),
        level_type,
        candle_index: index,
        source_candle: *candle,
    }
}
