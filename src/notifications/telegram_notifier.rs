// src/notifications/telegram_notifier.rs
use crate::errors::NotifyError;
use crate::notifications::notifier::Notifier;
use async_trait::async_trait;
use log::{error, info, warn};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

struct TelegramCredentials {
    bot_token: String,
    chat_id: String,
}

pub struct TelegramNotifier {
    client: Client,
    credentials: Option<TelegramCredentials>,
}

impl TelegramNotifier {
    pub fn new(bot_token: Option<String>, chat_id: Option<String>, timeout_secs: u64) -> Self {
        let credentials = match (bot_token, chat_id) {
            (Some(bot_token), Some(chat_id)) if !bot_token.is_empty() && !chat_id.is_empty() => {
                info!("📱 Telegram notifier initialized");
                Some(TelegramCredentials { bot_token, chat_id })
            }
            _ => {
                warn!("📱 Telegram notifier disabled - missing TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID");
                None
            }
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, credentials }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn is_enabled(&self) -> bool {
        self.credentials.is_some()
    }

    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let Some(credentials) = &self.credentials else {
            return Ok(());
        };

        let url = format!("{}/bot{}/sendMessage", TELEGRAM_API_BASE, credentials.bot_token);
        // sent as plain text, no parse_mode
        let payload = json!({
            "chat_id": credentials.chat_id,
            "text": message,
            "disable_web_page_preview": true
        });

        let response = self.client.post(&url).json(&payload).send().await?;

        if response.status().is_success() {
            info!("📱 Telegram notification sent ({} chars)", message.chars().count());
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("📱 Failed to send Telegram notification: {}", body);
            Err(NotifyError::Rejected {
                channel: "telegram",
                status,
                body,
            })
        }
    }
}
