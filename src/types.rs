// src/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Input ---
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(timestamp: DateTime<Utc>, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    pub fn body_top(&self) -> f64 {
        self.open.max(self.close)
    }

    pub fn body_bottom(&self) -> f64 {
        self.open.min(self.close)
    }
}

/// Which side of the market a swing point or zone belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LevelType {
    Resistance,
    Support,
}

impl LevelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelType::Resistance => "resistance",
            LevelType::Support => "support",
        }
    }

    /// Japanese label used in display messages.
    pub fn label(&self) -> &'static str {
        match self {
            LevelType::Resistance => "レジスタンス",
            LevelType::Support => "サポート",
        }
    }
}

impl fmt::Display for LevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Derived ---
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SwingPoint {
    pub price: f64,
    pub timestamp: DateTime<Utc>,
    pub wick_ratio: f64,
    pub level_type: LevelType,
    pub candle_index: usize,
    pub source_candle: Candle,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Zone {
    pub level_type: LevelType,
    pub zone_price: f64,
    pub reaction_count: usize,
    pub strength: u8,
    pub avg_wick_ratio: f64,
    /// Newest first.
    pub reactions: Vec<SwingPoint>,
}

impl Zone {
    pub fn distance_to(&self, price: f64) -> f64 {
        (self.zone_price - price).abs()
    }
}

/// The fixed set of alert kinds, each with its own cooldown timer.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Resistance,
    Support,
    Range,
    BreakoutUp,
    BreakoutDown,
}

impl AlertKind {
    pub const ALL: [AlertKind; 5] = [
        AlertKind::Resistance,
        AlertKind::Support,
        AlertKind::Range,
        AlertKind::BreakoutUp,
        AlertKind::BreakoutDown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Resistance => "resistance",
            AlertKind::Support => "support",
            AlertKind::Range => "range",
            AlertKind::BreakoutUp => "breakout_up",
            AlertKind::BreakoutDown => "breakout_down",
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price difference expressed in pip-equivalent units for a 2-decimal quote.
pub fn to_pips(price_diff: f64) -> f64 {
    price_diff * 100.0
}
