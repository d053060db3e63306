// src/notifications/message_composer.rs
// Renders a classified market state into the LINE/Telegram message and the
// plain-text context handed to the AI advisor

use crate::realtime::market_state::MarketState;
use crate::types::{to_pips, Candle, LevelType, Zone};
use crate::zones::zone_detection::ZoneDetectionResult;
use chrono::FixedOffset;
use std::cmp::Ordering;
use std::fmt::Write;

pub const MAX_REACTIONS_SHOWN: usize = 3;
pub const MAX_CONTEXT_ZONES: usize = 5;
/// 24 hours of 15-minute candles.
pub const DAY_CANDLES: usize = 96;
/// 4 hours of 15-minute candles.
pub const MOMENTUM_CANDLES: usize = 16;
/// Net move (price units) needed before a window counts as rising or falling.
pub const MOMENTUM_BAND: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Momentum {
    Rising,
    Falling,
    Flat,
}

impl Momentum {
    pub fn from_delta(delta: f64) -> Self {
        if delta > MOMENTUM_BAND {
            Momentum::Rising
        } else if delta < -MOMENTUM_BAND {
            Momentum::Falling
        } else {
            Momentum::Flat
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Momentum::Rising => "上昇",
            Momentum::Falling => "下落",
            Momentum::Flat => "横ばい",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionQuality {
    Strong,
    Moderate,
    BodyReach,
}

impl RejectionQuality {
    pub fn from_wick_ratio(ratio: f64) -> Self {
        if ratio >= 2.0 {
            RejectionQuality::Strong
        } else if ratio >= 1.0 {
            RejectionQuality::Moderate
        } else {
            RejectionQuality::BodyReach
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            RejectionQuality::Strong => "長いヒゲで強く反発",
            RejectionQuality::Moderate => "ヒゲで反発",
            RejectionQuality::BodyReach => "実体まで到達後に反発",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSummary {
    pub high: f64,
    pub low: f64,
    pub delta: f64,
    pub direction: Momentum,
    pub candles: usize,
}

/// High, low and net move (last close minus first open) over the newest `count` candles.
pub fn summarize_window(candles: &[Candle], count: usize) -> Option<WindowSummary> {
    let window = &candles[candles.len().saturating_sub(count)..];
    let first = window.first()?;
    let last = window.last()?;

    let high = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
    let low = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
    let delta = last.close - first.open;

    Some(WindowSummary {
        high,
        low,
        delta,
        direction: Momentum::from_delta(delta),
        candles: window.len(),
    })
}

/// `★` per strength point, padded with `☆` to three.
pub fn stars(strength: u8) -> String {
    let filled = strength.min(3) as usize;
    format!("{}{}", "★".repeat(filled), "☆".repeat(3 - filled))
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedAlert {
    pub message: String,
    pub context: String,
}

impl ComposedAlert {
    /// Final text to deliver; empty advisories are dropped.
    pub fn with_advisory(&self, advisory: &str) -> String {
        let advisory = advisory.trim();
        if advisory.is_empty() {
            self.message.clone()
        } else {
            format!("{}\n\n🤖AIアナリストのひとこと:\n{}", self.message, advisory)
        }
    }
}

#[derive(Debug, Clone)]
pub struct MessageComposer {
    symbol: String,
    display_offset: FixedOffset,
}

impl MessageComposer {
    pub fn new(symbol: impl Into<String>, display_offset: FixedOffset) -> Self {
        Self {
            symbol: symbol.into(),
            display_offset,
        }
    }

    /// `None` for a calm market.
    pub fn compose(
        &self,
        state: &MarketState,
        current_price: f64,
        candles: &[Candle],
        zones: &[Zone],
    ) -> Option<ComposedAlert> {
        let (message, reason) = match state {
            MarketState::Calm => return None,
            MarketState::ApproachResistance { zone } => (
                format!(
                    "【⚠️レジスタンス接近】{}\n{}\n{}\n※反発下落の可能性に注意してください。",
                    self.symbol,
                    self.price_line(current_price),
                    self.zone_block(zone, current_price)
                ),
                format!(
                    "現在価格{:.2}円。強度{}のレジスタンス({:.2}円)まであと{:.1}pipsに接近中。",
                    current_price,
                    zone.strength,
                    zone.zone_price,
                    to_pips(zone.distance_to(current_price))
                ),
            ),
            MarketState::ApproachSupport { zone } => (
                format!(
                    "【⚠️サポート接近】{}\n{}\n{}\n※反発上昇の可能性に注意してください。",
                    self.symbol,
                    self.price_line(current_price),
                    self.zone_block(zone, current_price)
                ),
                format!(
                    "現在価格{:.2}円。強度{}のサポート({:.2}円)まであと{:.1}pipsに接近中。",
                    current_price,
                    zone.strength,
                    zone.zone_price,
                    to_pips(zone.distance_to(current_price))
                ),
            ),
            MarketState::Range { resistance, support } => (
                format!(
                    "【📉レンジ相場】{}\n{}\n上下の壁に挟まれています。\n\n▼上限（レジスタンス）\n{}\n\n▲下限（サポート）\n{}\n※ブレイクアウトにご注意ください。",
                    self.symbol,
                    self.price_line(current_price),
                    self.zone_block(resistance, current_price),
                    self.zone_block(support, current_price)
                ),
                format!(
                    "現在価格{:.2}円。レジスタンス{:.2}円(強度{})とサポート{:.2}円(強度{})に挟まれたレンジ。",
                    current_price,
                    resistance.zone_price,
                    resistance.strength,
                    support.zone_price,
                    support.strength
                ),
            ),
            MarketState::BreakoutUp { zone } => (
                format!(
                    "【🚀上抜けブレイク】{}\n{}\nレジスタンスを上抜けました。\n{}\n※ダマシと押し目に注意してください。",
                    self.symbol,
                    self.price_line(current_price),
                    self.zone_block(zone, current_price)
                ),
                format!(
                    "現在価格{:.2}円。強度{}のレジスタンス({:.2}円)を{:.1}pips上抜け。",
                    current_price,
                    zone.strength,
                    zone.zone_price,
                    to_pips(zone.distance_to(current_price))
                ),
            ),
            MarketState::BreakoutDown { zone } => (
                format!(
                    "【💥下抜けブレイク】{}\n{}\nサポートを下抜けました。\n{}\n※ダマシと戻りに注意してください。",
                    self.symbol,
                    self.price_line(current_price),
                    self.zone_block(zone, current_price)
                ),
                format!(
                    "現在価格{:.2}円。強度{}のサポート({:.2}円)を{:.1}pips下抜け。",
                    current_price,
                    zone.strength,
                    zone.zone_price,
                    to_pips(zone.distance_to(current_price))
                ),
            ),
        };

        Some(ComposedAlert {
            message,
            context: self.market_context(&reason, current_price, candles, zones),
        })
    }

    /// Forced-run summary, produced regardless of thresholds.
    pub fn compose_diagnostic(
        &self,
        current_price: f64,
        detection: &ZoneDetectionResult,
        candles: &[Candle],
    ) -> ComposedAlert {
        let resistance_count = detection.zones_of(LevelType::Resistance).count();
        let support_count = detection.zones_of(LevelType::Support).count();
        let nearest_resistance = detection.nearest(LevelType::Resistance, current_price);
        let nearest_support = detection.nearest(LevelType::Support, current_price);

        let message = format!(
            "【🔧診断レポート】{}\n{}\nローソク足: {}本\nスイングポイント: {}件\nゾーン: {}件（レジスタンス{} / サポート{}）\n最寄りレジスタンス: {}\n最寄りサポート: {}",
            self.symbol,
            self.price_line(current_price),
            detection.candles_analyzed,
            detection.swing_points.len(),
            detection.zones.len(),
            resistance_count,
            support_count,
            describe_nearest(nearest_resistance, current_price),
            describe_nearest(nearest_support, current_price)
        );

        let reason = format!(
            "手動診断。現在価格{:.2}円、検出ゾーン{}件（最寄りレジスタンス: {} / 最寄りサポート: {}）。",
            current_price,
            detection.zones.len(),
            describe_nearest(nearest_resistance, current_price),
            describe_nearest(nearest_support, current_price)
        );

        ComposedAlert {
            message,
            context: self.market_context(&reason, current_price, candles, &detection.zones),
        }
    }

    /// Structured context for the advisor: reason, 24h summary, 4h momentum and the
    /// closest zones on each side with signed pip distances.
    pub fn market_context(
        &self,
        reason: &str,
        current_price: f64,
        candles: &[Candle],
        zones: &[Zone],
    ) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "【アラート理由】\n{}", reason);

        let _ = writeln!(out, "\n【直近24時間】");
        match summarize_window(candles, DAY_CANDLES) {
            Some(day) => {
                let _ = writeln!(
                    out,
                    "高値: {:.2}円 / 安値: {:.2}円 / 方向: {}（{}本）",
                    day.high,
                    day.low,
                    day.direction.label(),
                    day.candles
                );
            }
            None => {
                let _ = writeln!(out, "データなし");
            }
        }

        let _ = writeln!(out, "\n【直近4時間の勢い】");
        match summarize_window(candles, MOMENTUM_CANDLES) {
            Some(recent) => {
                let _ = writeln!(out, "{}（{:+.3}円）", recent.direction.label(), recent.delta);
            }
            None => {
                let _ = writeln!(out, "データなし");
            }
        }

        for level_type in [LevelType::Resistance, LevelType::Support] {
            let _ = writeln!(out, "\n【{}（近い順）】", level_type.label());
            let nearest = nearest_zones(zones, level_type, current_price, MAX_CONTEXT_ZONES);
            if nearest.is_empty() {
                let _ = writeln!(out, "・なし");
            }
            for zone in nearest {
                let _ = writeln!(
                    out,
                    "・{:.2}円（{:+.1}pips, 強度{} {}, 反応{}回）",
                    zone.zone_price,
                    to_pips(zone.zone_price - current_price),
                    zone.strength,
                    stars(zone.strength),
                    zone.reaction_count
                );
            }
        }

        out.trim_end().to_string()
    }

    fn price_line(&self, current_price: f64) -> String {
        format!("現在価格: {:.3}円", current_price)
    }

    fn zone_block(&self, zone: &Zone, current_price: f64) -> String {
        let mut block = format!(
            "壁の価格: {:.2}円\n強度: {}（反応{}回）\n距離: {:.1}pips",
            zone.zone_price,
            stars(zone.strength),
            zone.reaction_count,
            to_pips(zone.distance_to(current_price))
        );

        if !zone.reactions.is_empty() {
            block.push_str("\n直近の反応:");
            for reaction in zone.reactions.iter().take(MAX_REACTIONS_SHOWN) {
                let _ = write!(
                    block,
                    "\n・{} {:.2}円 {}",
                    reaction
                        .timestamp
                        .with_timezone(&self.display_offset)
                        .format("%m/%d %H:%M"),
                    reaction.price,
                    RejectionQuality::from_wick_ratio(reaction.wick_ratio).describe()
                );
            }
        }

        block
    }
}

/// Up to `limit` zones of one type, closest first.
pub fn nearest_zones(
    zones: &[Zone],
    level_type: LevelType,
    current_price: f64,
    limit: usize,
) -> Vec<&Zone> {
    let mut matching: Vec<&Zone> = zones.iter().filter(|z| z.level_type == level_type).collect();
    matching.sort_by(|a, b| {
        a.distance_to(current_price)
            .partial_cmp(&b.distance_to(current_price))
            .unwrap_or(Ordering::Equal)
    });
    matching.truncate(limit);
    matching
}

fn describe_nearest(zone: Option<&Zone>, current_price: f64) -> String {
    match zone {
        Some(zone) => format!(
            "{:.2}円（{:+.1}pips, {}）",
            zone.zone_price,
            to_pips(zone.zone_price - current_price),
            stars(zone.strength)
        ),
        None => "なし".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SwingPoint;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn jst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn ts(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 0, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn reaction(price: f64, minutes: i64, wick_ratio: f64) -> SwingPoint {
        let candle = Candle::new(ts(minutes), price - 0.1, price, price - 0.2, price - 0.05);
        SwingPoint {
            price,
            timestamp: ts(minutes),
            wick_ratio,
            level_type: LevelType::Resistance,
            candle_index: 0,
            source_candle: candle,
        }
    }

    fn zone(level_type: LevelType, price: f64, strength: u8, reactions: Vec<SwingPoint>) -> Zone {
        Zone {
            level_type,
            zone_price: price,
            reaction_count: reactions.len().max(1),
            strength,
            avg_wick_ratio: 1.0,
            reactions,
        }
    }

    fn flat_candles(count: usize, price: f64) -> Vec<Candle> {
        (0..count)
            .map(|i| Candle::new(ts(15 * i as i64), price, price + 0.05, price - 0.05, price))
            .collect()
    }

    fn composer() -> MessageComposer {
        MessageComposer::new("USD/JPY", jst())
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(1), "★☆☆");
        assert_eq!(stars(2), "★★☆");
        assert_eq!(stars(3), "★★★");
        assert_eq!(stars(7), "★★★");
    }

    #[test]
    fn test_rejection_quality_thresholds() {
        assert_eq!(RejectionQuality::from_wick_ratio(2.0), RejectionQuality::Strong);
        assert_eq!(RejectionQuality::from_wick_ratio(1.99), RejectionQuality::Moderate);
        assert_eq!(RejectionQuality::from_wick_ratio(1.0), RejectionQuality::Moderate);
        assert_eq!(RejectionQuality::from_wick_ratio(0.4), RejectionQuality::BodyReach);
    }

    #[test]
    fn test_momentum_band() {
        assert_eq!(Momentum::from_delta(0.03), Momentum::Rising);
        assert_eq!(Momentum::from_delta(-0.03), Momentum::Falling);
        assert_eq!(Momentum::from_delta(0.015), Momentum::Flat);
        assert_eq!(Momentum::from_delta(-0.015), Momentum::Flat);
    }

    #[test]
    fn test_summarize_window_uses_newest_candles() {
        let mut candles = flat_candles(20, 150.0);
        // an old spike outside the 16-candle window
        candles[0].high = 152.0;
        candles[19].close = 150.10;
        let recent = summarize_window(&candles, MOMENTUM_CANDLES).unwrap();
        assert_eq!(recent.candles, 16);
        assert!((recent.high - 150.05).abs() < 1e-9);
        assert_eq!(recent.direction, Momentum::Rising);

        let day = summarize_window(&candles, DAY_CANDLES).unwrap();
        assert_eq!(day.candles, 20);
        assert!((day.high - 152.0).abs() < 1e-9);

        assert!(summarize_window(&[], DAY_CANDLES).is_none());
    }

    #[test]
    fn test_approach_message_lists_three_newest_reactions() {
        let reactions = vec![
            reaction(151.21, 600, 2.5),
            reaction(151.20, 400, 1.2),
            reaction(151.19, 200, 0.3),
            reaction(151.20, 100, 0.3),
        ];
        let resistance = zone(LevelType::Resistance, 151.20, 3, reactions);
        let state = MarketState::ApproachResistance {
            zone: resistance.clone(),
        };
        let alert = composer()
            .compose(&state, 151.18, &flat_candles(10, 151.1), &[resistance])
            .unwrap();

        assert!(alert.message.contains("レジスタンス接近"));
        assert!(alert.message.contains("151.20円"));
        assert!(alert.message.contains("★★★"));
        assert!(alert.message.contains("反応4回"));
        assert!(alert.message.contains("2.0pips"));
        assert!(alert.message.contains("長いヒゲで強く反発"));
        assert!(alert.message.contains("ヒゲで反発"));
        assert!(alert.message.contains("実体まで到達後に反発"));
        // 600 minutes after 00:00 UTC is 19:00 JST
        assert!(alert.message.contains("10/14 19:00"));
        assert_eq!(alert.message.matches("\n・").count(), 3);
    }

    #[test]
    fn test_range_message_names_both_walls() {
        let resistance = zone(LevelType::Resistance, 150.50, 2, vec![]);
        let support = zone(LevelType::Support, 150.40, 1, vec![]);
        let state = MarketState::Range {
            resistance: resistance.clone(),
            support: support.clone(),
        };
        let alert = composer()
            .compose(&state, 150.45, &flat_candles(4, 150.45), &[support, resistance])
            .unwrap();
        assert!(alert.message.contains("レンジ相場"));
        assert!(alert.message.contains("150.50円"));
        assert!(alert.message.contains("150.40円"));
        assert!(alert.context.contains("レンジ"));
    }

    #[test]
    fn test_calm_composes_nothing() {
        assert!(composer()
            .compose(&MarketState::Calm, 150.0, &flat_candles(4, 150.0), &[])
            .is_none());
    }

    #[test]
    fn test_context_lists_top_five_per_side_with_signed_distance() {
        let mut zones = Vec::new();
        for i in 1..=7 {
            zones.push(zone(LevelType::Resistance, 150.0 + 0.1 * i as f64, 1, vec![]));
            zones.push(zone(LevelType::Support, 150.0 - 0.1 * i as f64, 1, vec![]));
        }
        let context = composer().market_context("テスト", 150.0, &flat_candles(100, 150.0), &zones);

        assert!(context.starts_with("【アラート理由】\nテスト"));
        assert!(context.contains("方向: 横ばい（96本）"));
        assert!(context.contains("+10.0pips"));
        assert!(context.contains("-10.0pips"));
        assert!(context.contains("+50.0pips"));
        assert!(!context.contains("+60.0pips"));
        assert!(!context.contains("-70.0pips"));
        assert_eq!(context.matches("強度1 ★☆☆").count(), 10);
    }

    #[test]
    fn test_context_without_zones_or_candles() {
        let context = composer().market_context("理由", 150.0, &[], &[]);
        assert!(context.contains("データなし"));
        assert_eq!(context.matches("・なし").count(), 2);
    }

    #[test]
    fn test_advisory_is_appended_only_when_present() {
        let alert = ComposedAlert {
            message: "base".to_string(),
            context: String::new(),
        };
        assert_eq!(alert.with_advisory(""), "base");
        assert_eq!(alert.with_advisory("  \n"), "base");
        let full = alert.with_advisory("押し目買い優勢");
        assert!(full.starts_with("base\n\n🤖AIアナリストのひとこと:\n"));
        assert!(full.ends_with("押し目買い優勢"));
    }

    #[test]
    fn test_nearest_zones_orders_by_distance() {
        let zones = vec![
            zone(LevelType::Support, 149.0, 1, vec![]),
            zone(LevelType::Support, 149.8, 1, vec![]),
            zone(LevelType::Resistance, 150.1, 1, vec![]),
            zone(LevelType::Support, 149.5, 1, vec![]),
        ];
        let nearest = nearest_zones(&zones, LevelType::Support, 150.0, 2);
        let prices: Vec<f64> = nearest.iter().map(|z| z.zone_price).collect();
        assert_eq!(prices, vec![149.8, 149.5]);
    }
}
