// src/notifications/line_notifier.rs
use crate::errors::NotifyError;
use crate::notifications::notifier::Notifier;
use async_trait::async_trait;
use log::{error, info, warn};
use reqwest::Client;
use std::time::Duration;

pub const LINE_NOTIFY_URL: &str = "https://notify-api.line.me/api/notify";

pub struct LineNotifier {
    client: Client,
    token: Option<String>,
    endpoint: String,
}

impl LineNotifier {
    pub fn new(token: Option<String>, timeout_secs: u64) -> Self {
        let token = token.filter(|t| !t.is_empty());
        if token.is_some() {
            info!("💬 LINE notifier initialized");
        } else {
            warn!("💬 LINE notifier disabled - missing LINE_NOTIFY_TOKEN");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            token,
            endpoint: LINE_NOTIFY_URL.to_string(),
        }
    }

    /// Point the notifier at a different endpoint (self-hosted relay or test server).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Notifier for LineNotifier {
    fn name(&self) -> &'static str {
        "line"
    }

    fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let Some(token) = &self.token else {
            return Ok(());
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .form(&[("message", message)])
            .send()
            .await?;

        if response.status().is_success() {
            info!("💬 LINE notification sent ({} chars)", message.chars().count());
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("💬 LINE Notify rejected the message: HTTP {} {}", status, body);
            Err(NotifyError::Rejected {
                channel: "line",
                status,
                body,
            })
        }
    }
}
