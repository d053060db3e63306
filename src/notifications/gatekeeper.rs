// src/notifications/gatekeeper.rs
// Per-alert-kind cooldown so the same situation isn't re-sent every tick

use crate::types::AlertKind;
use chrono::{DateTime, Duration, Utc};
use log::debug;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertState {
    pub last_notified_at: Option<DateTime<Utc>>,
    pub last_price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertStateEntry {
    pub kind: AlertKind,
    #[serde(flatten)]
    pub state: AlertState,
    pub cooldown_remaining_secs: i64,
}

#[derive(Debug)]
pub struct Gatekeeper {
    cooldown: Duration,
    states: Mutex<HashMap<AlertKind, AlertState>>,
}

impl Gatekeeper {
    pub fn new(cooldown: Duration) -> Self {
        let states = AlertKind::ALL
            .iter()
            .map(|kind| (*kind, AlertState::default()))
            .collect();
        Self {
            cooldown,
            states: Mutex::new(states),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// True when `kind` has never fired or its cooldown has fully elapsed.
    pub fn can_notify(&self, kind: AlertKind, now: DateTime<Utc>) -> bool {
        let states = self.states.lock();
        match states.get(&kind).and_then(|s| s.last_notified_at) {
            None => true,
            Some(last) => {
                let allowed = now - last > self.cooldown;
                if !allowed {
                    debug!(
                        "⏱️ {} still cooling down ({}s since last alert)",
                        kind,
                        (now - last).num_seconds()
                    );
                }
                allowed
            }
        }
    }

    /// Record a delivered alert. Other kinds are untouched.
    pub fn update_state(&self, kind: AlertKind, price: f64, now: DateTime<Utc>) {
        let mut states = self.states.lock();
        let state = states.entry(kind).or_default();
        state.last_notified_at = Some(now);
        state.last_price = price;
    }

    pub fn state(&self, kind: AlertKind) -> AlertState {
        self.states.lock().get(&kind).cloned().unwrap_or_default()
    }

    /// All kinds in fixed order, with how long each still has to wait.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<AlertStateEntry> {
        let states = self.states.lock();
        AlertKind::ALL
            .iter()
            .map(|kind| {
                let state = states.get(kind).cloned().unwrap_or_default();
                let cooldown_remaining_secs = state
                    .last_notified_at
                    .map(|last| (self.cooldown - (now - last)).num_seconds().max(0))
                    .unwrap_or(0);
                AlertStateEntry {
                    kind: *kind,
                    state,
                    cooldown_remaining_secs,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 3, 0, 0).unwrap()
    }

    #[test]
    fn test_first_alert_is_always_allowed() {
        let gate = Gatekeeper::new(Duration::hours(1));
        for kind in AlertKind::ALL {
            assert!(gate.can_notify(kind, t0()));
        }
    }

    #[test]
    fn test_cooldown_blocks_until_strictly_elapsed() {
        let gate = Gatekeeper::new(Duration::hours(1));
        gate.update_state(AlertKind::Resistance, 151.18, t0());

        assert!(!gate.can_notify(AlertKind::Resistance, t0() + Duration::minutes(30)));
        assert!(!gate.can_notify(AlertKind::Resistance, t0() + Duration::hours(1)));
        assert!(gate.can_notify(AlertKind::Resistance, t0() + Duration::hours(1) + Duration::seconds(1)));
    }

    #[test]
    fn test_kinds_are_independent() {
        let gate = Gatekeeper::new(Duration::hours(1));
        gate.update_state(AlertKind::BreakoutUp, 150.08, t0());

        assert!(!gate.can_notify(AlertKind::BreakoutUp, t0() + Duration::minutes(5)));
        assert!(gate.can_notify(AlertKind::BreakoutDown, t0() + Duration::minutes(5)));
        assert!(gate.can_notify(AlertKind::Range, t0() + Duration::minutes(5)));
        assert_eq!(gate.state(AlertKind::Support), AlertState::default());
    }

    #[test]
    fn test_update_records_price_and_time() {
        let gate = Gatekeeper::new(Duration::hours(2));
        gate.update_state(AlertKind::Range, 150.45, t0());
        let state = gate.state(AlertKind::Range);
        assert_eq!(state.last_notified_at, Some(t0()));
        assert_eq!(state.last_price, 150.45);
    }

    #[test]
    fn test_snapshot_reports_remaining_cooldown() {
        let gate = Gatekeeper::new(Duration::hours(1));
        gate.update_state(AlertKind::Support, 149.9, t0());
        let snapshot = gate.snapshot(t0() + Duration::minutes(15));

        assert_eq!(snapshot.len(), 5);
        let support = snapshot.iter().find(|e| e.kind == AlertKind::Support).unwrap();
        assert_eq!(support.cooldown_remaining_secs, 45 * 60);
        let range = snapshot.iter().find(|e| e.kind == AlertKind::Range).unwrap();
        assert_eq!(range.cooldown_remaining_secs, 0);
        assert!(range.state.last_notified_at.is_none());
    }
}
