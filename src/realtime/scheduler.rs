// src/realtime/scheduler.rs
// Periodic driver for ZoneMonitor::run_once

use crate::realtime::zone_monitor::ZoneMonitor;
use log::{info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

#[derive(Default)]
pub struct Scheduler {
    running: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// False once stopped, or once the task has ended on its own (e.g. a panicking run).
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self
                .task
                .lock()
                .as_ref()
                .is_some_and(|task| !task.is_finished())
    }

    /// First tick fires immediately, then every `every`.
    pub fn start(&self, monitor: Arc<ZoneMonitor>, every: Duration) {
        let mut task = self.task.lock();
        if task.is_some() {
            warn!("⏰ Scheduler already running");
            return;
        }

        info!("⏰ Scheduler started, checking every {}s", every.as_secs());
        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);

        *task = Some(tokio::spawn(async move {
            let mut ticker = interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            while running.load(Ordering::SeqCst) {
                ticker.tick().await;
                monitor.run_once(false).await;
            }
        }));
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.lock().take() {
            task.abort();
            info!("⏰ Scheduler stopped");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}
