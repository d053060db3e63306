// src/notifications/notifier.rs
use crate::errors::NotifyError;
use async_trait::async_trait;

/// A delivery channel for finished alert messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// Disabled channels are skipped by the manager.
    fn is_enabled(&self) -> bool {
        true
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}
