// src/realtime/market_state.rs
// Picks the single most relevant situation for the current price

use crate::types::{AlertKind, LevelType, Zone};
use crate::zones::zone_detection::nearest_zone;
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MarketState {
    BreakoutUp { zone: Zone },
    BreakoutDown { zone: Zone },
    Range { resistance: Zone, support: Zone },
    ApproachResistance { zone: Zone },
    ApproachSupport { zone: Zone },
    Calm,
}

impl MarketState {
    pub fn alert_kind(&self) -> Option<AlertKind> {
        match self {
            MarketState::BreakoutUp { .. } => Some(AlertKind::BreakoutUp),
            MarketState::BreakoutDown { .. } => Some(AlertKind::BreakoutDown),
            MarketState::Range { .. } => Some(AlertKind::Range),
            MarketState::ApproachResistance { .. } => Some(AlertKind::Resistance),
            MarketState::ApproachSupport { .. } => Some(AlertKind::Support),
            MarketState::Calm => None,
        }
    }

    pub fn is_calm(&self) -> bool {
        matches!(self, MarketState::Calm)
    }
}

struct ClassifierInput<'a> {
    price: f64,
    zones: &'a [Zone],
    threshold: f64,
    breakout_margin: f64,
}

impl<'a> ClassifierInput<'a> {
    fn of_type(&self, level_type: LevelType) -> impl Iterator<Item = &'a Zone> {
        self.zones.iter().filter(move |z| z.level_type == level_type)
    }

    fn is_nearby(&self, zone: &Zone) -> bool {
        zone.distance_to(self.price) <= self.threshold
    }

    fn nearby_resistance(&self) -> Option<&'a Zone> {
        let floor = self.price - self.threshold;
        nearest_zone(
            self.of_type(LevelType::Resistance)
                .filter(|z| z.zone_price >= floor && self.is_nearby(z)),
            self.price,
        )
    }

    fn nearby_support(&self) -> Option<&'a Zone> {
        let ceiling = self.price + self.threshold;
        nearest_zone(
            self.of_type(LevelType::Support)
                .filter(|z| z.zone_price <= ceiling && self.is_nearby(z)),
            self.price,
        )
    }
}

type Rule = fn(&ClassifierInput) -> Option<MarketState>;

/// Evaluated top-down, first match wins.
const RULES: [(&str, Rule); 5] = [
    ("breakout_up", breakout_up),
    ("breakout_down", breakout_down),
    ("range", range),
    ("approach_resistance", approach_resistance),
    ("approach_support", approach_support),
];

fn breakout_up(input: &ClassifierInput) -> Option<MarketState> {
    let limit = input.price - input.breakout_margin;
    input
        .of_type(LevelType::Resistance)
        .filter(|z| z.zone_price < limit)
        .fold(None::<&Zone>, |best, z| match best {
            Some(b) if b.zone_price >= z.zone_price => Some(b),
            _ => Some(z),
        })
        .map(|zone| MarketState::BreakoutUp { zone: zone.clone() })
}

fn breakout_down(input: &ClassifierInput) -> Option<MarketState> {
    let limit = input.price + input.breakout_margin;
    input
        .of_type(LevelType::Support)
        .filter(|z| z.zone_price > limit)
        .fold(None::<&Zone>, |best, z| match best {
            Some(b) if b.zone_price <= z.zone_price => Some(b),
            _ => Some(z),
        })
        .map(|zone| MarketState::BreakoutDown { zone: zone.clone() })
}

fn range(input: &ClassifierInput) -> Option<MarketState> {
    match (input.nearby_resistance(), input.nearby_support()) {
        (Some(resistance), Some(support)) => Some(MarketState::Range {
            resistance: resistance.clone(),
            support: support.clone(),
        }),
        _ => None,
    }
}

fn approach_resistance(input: &ClassifierInput) -> Option<MarketState> {
    input
        .nearby_resistance()
        .map(|zone| MarketState::ApproachResistance { zone: zone.clone() })
}

fn approach_support(input: &ClassifierInput) -> Option<MarketState> {
    input
        .nearby_support()
        .map(|zone| MarketState::ApproachSupport { zone: zone.clone() })
}

#[derive(Debug, Clone)]
pub struct MarketStateClassifier {
    threshold: f64,
    breakout_margin: f64,
}

impl MarketStateClassifier {
    pub fn new(threshold: f64, breakout_margin: f64) -> Self {
        Self {
            threshold,
            breakout_margin,
        }
    }

    pub fn classify(&self, current_price: f64, zones: &[Zone]) -> MarketState {
        let input = ClassifierInput {
            price: current_price,
            zones,
            threshold: self.threshold,
            breakout_margin: self.breakout_margin,
        };

        for (name, rule) in RULES.iter() {
            if let Some(state) = rule(&input) {
                debug!("🎯 Market state at {:.3}: {}", current_price, name);
                return state;
            }
        }

        debug!("🎯 Market state at {:.3}: calm", current_price);
        MarketState::Calm
    }
}
