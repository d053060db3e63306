// src/notifications/notification_manager.rs
use crate::errors::NotifyError;
use crate::notifications::notifier::Notifier;
use async_trait::async_trait;
use futures::future::join_all;
use log::{error, info, warn};
use std::sync::Arc;

/// Fans one message out to every enabled channel concurrently.
///
/// Succeeds when at least one channel delivered. With no enabled channel the message
/// is only written to the log.
pub struct NotificationManager {
    channels: Vec<Arc<dyn Notifier>>,
}

impl NotificationManager {
    pub fn new(channels: Vec<Arc<dyn Notifier>>) -> Self {
        Self { channels }
    }

    pub fn enabled_channels(&self) -> Vec<&'static str> {
        self.channels
            .iter()
            .filter(|c| c.is_enabled())
            .map(|c| c.name())
            .collect()
    }
}

#[async_trait]
impl Notifier for NotificationManager {
    fn name(&self) -> &'static str {
        "manager"
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let enabled: Vec<&Arc<dyn Notifier>> =
            self.channels.iter().filter(|c| c.is_enabled()).collect();

        if enabled.is_empty() {
            warn!("📢 No notification channel configured, logging alert instead:\n{}", message);
            return Ok(());
        }

        info!("📢 Sending notification to {} channel(s)", enabled.len());
        let results = join_all(enabled.iter().map(|c| c.send(message))).await;

        let mut failures = 0;
        for (channel, result) in enabled.iter().zip(results) {
            if let Err(e) = result {
                error!("📢 {} notification failed: {}", channel.name(), e);
                failures += 1;
            }
        }

        if failures == enabled.len() {
            Err(NotifyError::AllChannelsFailed(failures))
        } else {
            Ok(())
        }
    }
}
