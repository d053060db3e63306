// src/advisor/gemini_advisor.rs
use crate::advisor::Advisor;
use crate::errors::AdvisorError;
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.text.as_deref())
    }
}

pub fn build_prompt(context: &str) -> String {
    format!(
        "あなたはドル円を専門に担当するFXアナリストです。\n\
         次の相場状況を読み、トレーダー向けに客観的で短い一言アドバイスを書いてください。\n\
         100文字以内、挨拶や前置きは不要です。\n\n\
         【現在の相場状況】\n{}",
        context
    )
}

pub struct GeminiAdvisor {
    client: Client,
    api_key: Option<String>,
    model: String,
}

impl GeminiAdvisor {
    pub fn new(api_key: Option<String>, model: impl Into<String>, timeout_secs: u64) -> Self {
        let api_key = api_key.filter(|k| !k.is_empty());
        let model = model.into();
        if api_key.is_some() {
            info!("🤖 Gemini advisor initialized (model {})", model);
        } else {
            warn!("🤖 Gemini advisor disabled - missing GEMINI_API_KEY");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            model,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl Advisor for GeminiAdvisor {
    async fn advise(&self, context: &str) -> Result<String, AdvisorError> {
        let Some(api_key) = &self.api_key else {
            return Ok(String::new());
        };

        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);
        let payload = json!({
            "contents": [{ "parts": [{ "text": build_prompt(context) }] }]
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AdvisorError::Status { status, body });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed
            .first_text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AdvisorError::EmptyResponse)?;

        debug!("🤖 Gemini advisory: {}", text);
        Ok(text.to_string())
    }
}
