// src/realtime/zone_monitor.rs
// One analysis run: fetch -> detect -> classify -> gate -> compose -> advise -> notify

use crate::advisor::Advisor;
use crate::config::MonitorConfig;
use crate::data::CandleSource;
use crate::errors::{AdvisorError, MonitorError, NotifyError};
use crate::notifications::{AlertStateEntry, Gatekeeper, MessageComposer, Notifier};
use crate::realtime::market_state::MarketStateClassifier;
use crate::types::{AlertKind, Candle};
use crate::zones::ZoneDetectionEngine;
use chrono::{DateTime, Datelike, Utc};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum RunOutcome {
    SkippedWeekend,
    SkippedBusy,
    NoData,
    NoSignal,
    Suppressed(AlertKind),
    Notified(AlertKind),
    DeliveryFailed(AlertKind),
    Diagnostic,
    Aborted(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub forced: bool,
    pub outcome: RunOutcome,
}

/// Set while a run holds the lock, cleared on drop (including unwinding).
struct BusyFlag<'a>(&'a AtomicBool);

impl<'a> BusyFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for BusyFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct ZoneMonitor {
    config: MonitorConfig,
    source: Arc<dyn CandleSource>,
    advisor: Arc<dyn Advisor>,
    notifier: Arc<dyn Notifier>,
    gatekeeper: Gatekeeper,
    engine: ZoneDetectionEngine,
    classifier: MarketStateClassifier,
    composer: MessageComposer,
    run_lock: Mutex<()>,
    in_progress: AtomicBool,
    last_run: parking_lot::Mutex<Option<RunRecord>>,
}

impl ZoneMonitor {
    pub fn new(
        config: MonitorConfig,
        source: Arc<dyn CandleSource>,
        advisor: Arc<dyn Advisor>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let gatekeeper = Gatekeeper::new(config.cooldown());
        let engine = ZoneDetectionEngine::new(config.swing_window, config.zone_merge_distance);
        let classifier =
            MarketStateClassifier::new(config.proximity_threshold, config.breakout_margin);
        let composer = MessageComposer::new(config.symbol.clone(), config.market_offset());

        Self {
            config,
            source,
            advisor,
            notifier,
            gatekeeper,
            engine,
            classifier,
            composer,
            run_lock: Mutex::new(()),
            in_progress: AtomicBool::new(false),
            last_run: parking_lot::Mutex::new(None),
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn cooldowns(&self, now: DateTime<Utc>) -> Vec<AlertStateEntry> {
        self.gatekeeper.snapshot(now)
    }

    pub fn last_run(&self) -> Option<RunRecord> {
        self.last_run.lock().clone()
    }

    /// Read-only; never contends with the run lock.
    pub fn is_busy(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    pub async fn run_once(&self, force: bool) -> RunOutcome {
        self.run_once_at(force, Utc::now()).await
    }

    /// Never fails: every error ends up as a logged `RunOutcome`.
    pub async fn run_once_at(&self, force: bool, now: DateTime<Utc>) -> RunOutcome {
        let Ok(_guard) = self.run_lock.try_lock() else {
            warn!("⏳ Analysis already in progress, rejecting overlapping run (force={})", force);
            return RunOutcome::SkippedBusy;
        };
        let _busy = BusyFlag::raise(&self.in_progress);

        let run_id = Uuid::new_v4().to_string();
        let tag = &run_id[..8];
        info!("🔎 [run {}] Starting analysis of {} (force={})", tag, self.config.symbol, force);

        let outcome = if !force && self.is_weekend(now) {
            info!("🛌 [run {}] Market closed for the weekend, skipping", tag);
            RunOutcome::SkippedWeekend
        } else {
            match self.analyze(force, now, tag).await {
                Ok(outcome) => outcome,
                Err(MonitorError::NoPrice) => {
                    warn!("⚠️ [run {}] No usable current price, skipping", tag);
                    RunOutcome::NoData
                }
                Err(e) => {
                    error!("❌ [run {}] Analysis aborted: {}", tag, e);
                    RunOutcome::Aborted(e.to_string())
                }
            }
        };

        info!("🏁 [run {}] Finished: {:?}", tag, outcome);
        *self.last_run.lock() = Some(RunRecord {
            run_id,
            started_at: now,
            forced: force,
            outcome: outcome.clone(),
        });
        outcome
    }

    /// Saturday or Sunday in market-local time.
    pub fn is_weekend(&self, now: DateTime<Utc>) -> bool {
        now.with_timezone(&self.config.market_offset())
            .weekday()
            .number_from_monday()
            >= 6
    }

    async fn analyze(
        &self,
        force: bool,
        now: DateTime<Utc>,
        tag: &str,
    ) -> Result<RunOutcome, MonitorError> {
        let candles = self
            .source
            .fetch_candles(
                &self.config.symbol,
                &self.config.candle_period,
                &self.config.candle_interval,
            )
            .await?;

        if candles.is_empty() {
            warn!("📭 [run {}] Candle source returned no data", tag);
            return Ok(RunOutcome::NoData);
        }

        let current_price = self.current_price(&candles).await?;
        let detection = self.engine.detect_zones(&candles);
        info!(
            "📐 [run {}] {:.3} | {} candles, {} swing points, {} zones",
            tag,
            current_price,
            candles.len(),
            detection.swing_points.len(),
            detection.zones.len()
        );

        if force {
            let diagnostic = self
                .composer
                .compose_diagnostic(current_price, &detection, &candles);
            let advisory = self.advise(&diagnostic.context, tag).await;
            if let Err(e) = self.deliver(&diagnostic.with_advisory(&advisory)).await {
                error!("❌ [run {}] Diagnostic delivery failed: {}", tag, e);
            }
            return Ok(RunOutcome::Diagnostic);
        }

        let state = self.classifier.classify(current_price, &detection.zones);
        let Some(kind) = state.alert_kind() else {
            debug!("😴 [run {}] Nothing near {:.3}", tag, current_price);
            return Ok(RunOutcome::NoSignal);
        };

        if !self.gatekeeper.can_notify(kind, now) {
            info!("🔕 [run {}] {} alert suppressed by cooldown", tag, kind);
            return Ok(RunOutcome::Suppressed(kind));
        }

        let Some(alert) = self
            .composer
            .compose(&state, current_price, &candles, &detection.zones)
        else {
            return Ok(RunOutcome::NoSignal);
        };

        let advisory = self.advise(&alert.context, tag).await;
        match self.deliver(&alert.with_advisory(&advisory)).await {
            Ok(()) => {
                self.gatekeeper.update_state(kind, current_price, now);
                info!("🔔 [run {}] {} alert sent at {:.3}", tag, kind, current_price);
                Ok(RunOutcome::Notified(kind))
            }
            Err(e) => {
                error!("❌ [run {}] {} alert lost: {}", tag, kind, e);
                Ok(RunOutcome::DeliveryFailed(kind))
            }
        }
    }

    async fn current_price(&self, candles: &[Candle]) -> Result<f64, MonitorError> {
        let usable = |p: &f64| p.is_finite() && *p > 0.0;
        if let Some(price) = self.source.last_price(&self.config.symbol).await.filter(usable) {
            return Ok(price);
        }
        candles
            .last()
            .map(|c| c.close)
            .filter(usable)
            .ok_or(MonitorError::NoPrice)
    }

    /// Empty on any advisor failure or timeout.
    async fn advise(&self, context: &str, tag: &str) -> String {
        let limit = self.config.advisor_timeout_secs;
        match timeout(Duration::from_secs(limit), self.advisor.advise(context)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!("🤖 [run {}] Advisor failed, sending without advisory: {}", tag, e);
                String::new()
            }
            Err(_) => {
                warn!("🤖 [run {}] {}, sending without advisory", tag, AdvisorError::Timeout(limit));
                String::new()
            }
        }
    }

    async fn deliver(&self, message: &str) -> Result<(), NotifyError> {
        let limit = self.config.notifier_timeout_secs;
        timeout(Duration::from_secs(limit), self.notifier.send(message))
            .await
            .map_err(|_| NotifyError::Timeout(limit))?
    }
}
