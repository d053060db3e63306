// src/advisor/mod.rs
pub mod gemini_advisor;

pub use gemini_advisor::GeminiAdvisor;

use crate::errors::AdvisorError;
use async_trait::async_trait;

/// Turns a market context into a short advisory line.
///
/// An empty string means "nothing to add"; the caller drops the advisory section.
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, context: &str) -> Result<String, AdvisorError>;
}
