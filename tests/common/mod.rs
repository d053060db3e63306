// tests/common/mod.rs
// In-memory collaborators for driving ZoneMonitor without network access
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use fx_zone_alert::advisor::Advisor;
use fx_zone_alert::config::MonitorConfig;
use fx_zone_alert::data::CandleSource;
use fx_zone_alert::errors::{AdvisorError, DataError, NotifyError};
use fx_zone_alert::notifications::Notifier;
use fx_zone_alert::realtime::ZoneMonitor;
use fx_zone_alert::types::Candle;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub fn setup_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Wednesday 2026-10-14 12:00 JST.
pub fn weekday_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 14, 3, 0, 0).unwrap()
}

/// Saturday 2026-10-17 12:00 JST.
pub fn saturday_noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 3, 0, 0).unwrap()
}

pub fn test_config() -> MonitorConfig {
    MonitorConfig {
        swing_window: 2,
        ..default_window_config()
    }
}

/// Default swing window of 5, short timeouts.
pub fn default_window_config() -> MonitorConfig {
    MonitorConfig {
        advisor_timeout_secs: 1,
        notifier_timeout_secs: 1,
        ..MonitorConfig::default()
    }
}

/// Candles from (high, low) pairs, 15 minutes apart, body inside the range.
pub fn bars(ranges: &[(f64, f64)]) -> Vec<Candle> {
    let start = Utc.with_ymd_and_hms(2026, 10, 13, 0, 0, 0).unwrap();
    ranges
        .iter()
        .enumerate()
        .map(|(i, &(high, low))| {
            let span = high - low;
            Candle::new(
                start + ChronoDuration::minutes(15 * i as i64),
                low + span * 0.3,
                high,
                low,
                low + span * 0.6,
            )
        })
        .collect()
}

/// Single swing high at 151.20 with window 2.
pub fn resistance_151_20() -> Vec<Candle> {
    bars(&[
        (150.90, 150.70),
        (151.00, 150.80),
        (151.20, 151.00),
        (151.00, 150.80),
        (150.90, 150.70),
    ])
}

/// Single swing high at 151.20 confirmed by five candles on each side.
pub fn resistance_151_20_wide() -> Vec<Candle> {
    bars(&[
        (150.70, 150.50),
        (150.80, 150.60),
        (150.90, 150.70),
        (151.00, 150.80),
        (151.10, 150.90),
        (151.20, 151.00),
        (151.10, 150.90),
        (151.00, 150.80),
        (150.90, 150.70),
        (150.80, 150.60),
        (150.70, 150.50),
    ])
}

/// Swing high at 150.50 and swing low at 150.40 with window 2.
pub fn range_150_40_to_150_50() -> Vec<Candle> {
    bars(&[
        (150.46, 150.43),
        (150.48, 150.44),
        (150.50, 150.45),
        (150.47, 150.43),
        (150.46, 150.40),
        (150.45, 150.42),
        (150.46, 150.44),
    ])
}

/// Single swing high at 150.00 with window 2.
pub fn resistance_150_00() -> Vec<Candle> {
    bars(&[
        (149.90, 149.70),
        (149.95, 149.75),
        (150.00, 149.80),
        (149.95, 149.75),
        (149.90, 149.70),
    ])
}

// ==================== CANDLE SOURCE ====================

pub struct StaticCandleSource {
    candles: Mutex<Vec<Candle>>,
    last_price: Mutex<Option<f64>>,
    fail: AtomicBool,
    pub fetches: AtomicUsize,
}

impl StaticCandleSource {
    pub fn new(candles: Vec<Candle>, last_price: Option<f64>) -> Arc<Self> {
        Arc::new(Self {
            candles: Mutex::new(candles),
            last_price: Mutex::new(last_price),
            fail: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn set_last_price(&self, price: Option<f64>) {
        *self.last_price.lock() = price;
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandleSource for StaticCandleSource {
    async fn fetch_candles(
        &self,
        _symbol: &str,
        _period: &str,
        _interval: &str,
    ) -> Result<Vec<Candle>, DataError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(DataError::Upstream("feed offline".to_string()));
        }
        Ok(self.candles.lock().clone())
    }

    async fn last_price(&self, _symbol: &str) -> Option<f64> {
        *self.last_price.lock()
    }
}

// ==================== ADVISOR ====================

pub enum AdvisorMode {
    Reply(String),
    Fail,
    Hang,
}

pub struct ScriptedAdvisor {
    mode: AdvisorMode,
    pub contexts: Mutex<Vec<String>>,
}

impl ScriptedAdvisor {
    pub fn new(mode: AdvisorMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            contexts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Advisor for ScriptedAdvisor {
    async fn advise(&self, context: &str) -> Result<String, AdvisorError> {
        self.contexts.lock().push(context.to_string());
        match &self.mode {
            AdvisorMode::Reply(text) => Ok(text.clone()),
            AdvisorMode::Fail => Err(AdvisorError::EmptyResponse),
            AdvisorMode::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok("too late".to_string())
            }
        }
    }
}

// ==================== NOTIFIER ====================

pub struct RecordingNotifier {
    pub sent: Mutex<Vec<String>>,
    fail: AtomicBool,
    delay: Option<Duration>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Self::with_delay(None)
    }

    pub fn with_delay(delay: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
            delay,
        })
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected {
                channel: "recording",
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.sent.lock().push(message.to_string());
        Ok(())
    }
}

pub struct Harness {
    pub monitor: Arc<ZoneMonitor>,
    pub source: Arc<StaticCandleSource>,
    pub advisor: Arc<ScriptedAdvisor>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness_with(
    config: MonitorConfig,
    candles: Vec<Candle>,
    last_price: Option<f64>,
    advisor_mode: AdvisorMode,
    notifier: Arc<RecordingNotifier>,
) -> Harness {
    setup_test_logging();
    let source = StaticCandleSource::new(candles, last_price);
    let advisor = ScriptedAdvisor::new(advisor_mode);
    let monitor = Arc::new(ZoneMonitor::new(
        config,
        source.clone(),
        advisor.clone(),
        notifier.clone(),
    ));
    Harness {
        monitor,
        source,
        advisor,
        notifier,
    }
}

pub fn harness(candles: Vec<Candle>, last_price: Option<f64>) -> Harness {
    harness_with(
        test_config(),
        candles,
        last_price,
        AdvisorMode::Reply("上値の重さに注意".to_string()),
        RecordingNotifier::new(),
    )
}
