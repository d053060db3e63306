// src/config.rs
// Runtime settings, read from the environment (and `.env`) with defaults

use chrono::{Duration, FixedOffset, Offset, Utc};
use log::{info, warn};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

/// One year.
pub const MAX_COOLDOWN_HOURS: f64 = 24.0 * 365.0;
pub const MAX_SWING_WINDOW: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub cooldown_hours: f64,
    pub proximity_threshold: f64,
    pub zone_merge_distance: f64,
    pub breakout_margin: f64,
    pub swing_window: usize,
    pub symbol: String,
    pub candle_period: String,
    pub candle_interval: String,
    pub check_interval_secs: u64,
    pub market_utc_offset_hours: i32,
    pub advisor_timeout_secs: u64,
    pub notifier_timeout_secs: u64,
    pub port: u16,
    pub enable_scheduler: bool,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub line_notify_token: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            cooldown_hours: 1.0,
            proximity_threshold: 0.10,
            zone_merge_distance: 0.05,
            breakout_margin: 0.05,
            swing_window: 5,
            symbol: "JPY=X".to_string(),
            candle_period: "5d".to_string(),
            candle_interval: "15m".to_string(),
            check_interval_secs: 900,
            market_utc_offset_hours: 9,
            advisor_timeout_secs: 20,
            notifier_timeout_secs: 15,
            port: 8080,
            enable_scheduler: true,
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash".to_string(),
            line_notify_token: None,
            telegram_bot_token: None,
            telegram_chat_id: None,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse::<T>().unwrap_or_else(|_| {
            warn!("⚙️ Invalid {}={:?}, using default {}", key, raw, default);
            default
        }),
    }
}

fn flag_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup(key).map(|v| v.trim().to_lowercase()) {
        None => default,
        Some(v) if matches!(v.as_str(), "true" | "1" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "false" | "0" | "no" | "off") => false,
        Some(v) => {
            warn!("⚙️ Invalid {}={:?}, using default {}", key, v, default);
            default
        }
    }
}

fn secret(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl MonitorConfig {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };

        let mut config = Self {
            cooldown_hours: parse_or(&lookup, "COOLDOWN_HOURS", d.cooldown_hours),
            proximity_threshold: parse_or(&lookup, "PROXIMITY_THRESHOLD", d.proximity_threshold),
            zone_merge_distance: parse_or(&lookup, "ZONE_MERGE_DISTANCE", d.zone_merge_distance),
            breakout_margin: parse_or(&lookup, "BREAKOUT_MARGIN", d.breakout_margin),
            swing_window: parse_or(&lookup, "SWING_WINDOW", d.swing_window),
            symbol: text("FX_SYMBOL", d.symbol),
            candle_period: text("CANDLE_PERIOD", d.candle_period),
            candle_interval: text("CANDLE_INTERVAL", d.candle_interval),
            check_interval_secs: parse_or(&lookup, "CHECK_INTERVAL_SECS", d.check_interval_secs),
            market_utc_offset_hours: parse_or(
                &lookup,
                "MARKET_UTC_OFFSET_HOURS",
                d.market_utc_offset_hours,
            ),
            advisor_timeout_secs: parse_or(&lookup, "ADVISOR_TIMEOUT_SECS", d.advisor_timeout_secs),
            notifier_timeout_secs: parse_or(
                &lookup,
                "NOTIFIER_TIMEOUT_SECS",
                d.notifier_timeout_secs,
            ),
            port: parse_or(&lookup, "PORT", d.port),
            enable_scheduler: flag_or(&lookup, "ENABLE_SCHEDULER", d.enable_scheduler),
            gemini_api_key: secret(&lookup, "GEMINI_API_KEY"),
            gemini_model: text("GEMINI_MODEL", d.gemini_model),
            line_notify_token: secret(&lookup, "LINE_NOTIFY_TOKEN"),
            telegram_bot_token: secret(&lookup, "TELEGRAM_BOT_TOKEN"),
            telegram_chat_id: secret(&lookup, "TELEGRAM_CHAT_ID"),
        };
        config.sanitize();
        config
    }

    /// Negative, non-finite or out-of-range numbers fall back to their defaults.
    fn sanitize(&mut self) {
        let d = Self::default();
        let fix = |name: &str, value: &mut f64, default: f64| {
            if !value.is_finite() || *value < 0.0 {
                warn!("⚙️ {} must be a non-negative number, using default {}", name, default);
                *value = default;
            }
        };
        fix("COOLDOWN_HOURS", &mut self.cooldown_hours, d.cooldown_hours);
        fix("PROXIMITY_THRESHOLD", &mut self.proximity_threshold, d.proximity_threshold);
        fix("ZONE_MERGE_DISTANCE", &mut self.zone_merge_distance, d.zone_merge_distance);
        fix("BREAKOUT_MARGIN", &mut self.breakout_margin, d.breakout_margin);

        if self.cooldown_hours > MAX_COOLDOWN_HOURS {
            warn!(
                "⚙️ COOLDOWN_HOURS={} exceeds {}, using default {}",
                self.cooldown_hours, MAX_COOLDOWN_HOURS, d.cooldown_hours
            );
            self.cooldown_hours = d.cooldown_hours;
        }
        if self.swing_window == 0 || self.swing_window > MAX_SWING_WINDOW {
            warn!(
                "⚙️ SWING_WINDOW={} must be between 1 and {}, using default {}",
                self.swing_window, MAX_SWING_WINDOW, d.swing_window
            );
            self.swing_window = d.swing_window;
        }

        if self.check_interval_secs == 0 {
            warn!("⚙️ CHECK_INTERVAL_SECS must be positive, using default {}", d.check_interval_secs);
            self.check_interval_secs = d.check_interval_secs;
        }
        if FixedOffset::east_opt(self.market_utc_offset_hours.saturating_mul(3600)).is_none() {
            warn!(
                "⚙️ MARKET_UTC_OFFSET_HOURS={} is out of range, using default {}",
                self.market_utc_offset_hours, d.market_utc_offset_hours
            );
            self.market_utc_offset_hours = d.market_utc_offset_hours;
        }
    }

    pub fn cooldown(&self) -> Duration {
        let hours = self.cooldown_hours.clamp(0.0, MAX_COOLDOWN_HOURS);
        Duration::try_seconds((hours * 3600.0).round() as i64)
            .unwrap_or_else(|| Duration::hours(MAX_COOLDOWN_HOURS as i64))
    }

    /// Offset used both for the weekday gate and for displayed times.
    pub fn market_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.market_utc_offset_hours.saturating_mul(3600))
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn log_summary(&self) {
        info!(
            "⚙️ {} {} candles over {} | swing window {} | merge {:.3} | threshold {:.3} | breakout margin {:.3} | cooldown {}h",
            self.symbol,
            self.candle_interval,
            self.candle_period,
            self.swing_window,
            self.zone_merge_distance,
            self.proximity_threshold,
            self.breakout_margin,
            self.cooldown_hours
        );
        info!(
            "⚙️ UTC{:+} market time | tick every {}s | scheduler {}",
            self.market_utc_offset_hours,
            self.check_interval_secs,
            if self.enable_scheduler { "on" } else { "off" }
        );
    }
}
