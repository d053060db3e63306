// src/data/candle_source.rs
// Candle retrieval for the monitored instrument

use crate::errors::DataError;
use crate::types::Candle;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const YAHOO_CHART_BASE: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) fx_zone_alert";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[async_trait]
pub trait CandleSource: Send + Sync {
    /// Ascending by timestamp. An empty vector means no data is available right now.
    async fn fetch_candles(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<Candle>, DataError>;

    /// Best-effort latest traded price; `None` falls back to the last close.
    async fn last_price(&self, symbol: &str) -> Option<f64>;
}

// ==================== YAHOO CHART PAYLOAD ====================

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

struct ParsedChart {
    candles: Vec<Candle>,
    market_price: Option<f64>,
}

fn parse_chart(body: &str) -> Result<ParsedChart, DataError> {
    let envelope: ChartEnvelope =
        serde_json::from_str(body).map_err(|e| DataError::Malformed(e.to_string()))?;

    if let Some(err) = envelope.chart.error {
        return Err(DataError::Upstream(format!(
            "{}: {}",
            err.code.unwrap_or_else(|| "unknown".to_string()),
            err.description.unwrap_or_default()
        )));
    }

    let Some(result) = envelope.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(ParsedChart {
            candles: Vec::new(),
            market_price: None,
        });
    };

    let market_price = result
        .meta
        .and_then(|m| m.regular_market_price)
        .filter(|p| p.is_finite());

    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(ParsedChart {
            candles: Vec::new(),
            market_price,
        });
    };

    let mut candles = Vec::with_capacity(result.timestamp.len());
    let mut skipped = 0usize;
    for (i, ts) in result.timestamp.iter().enumerate() {
        let field = |values: &Vec<Option<f64>>| values.get(i).copied().flatten().filter(|v| v.is_finite());
        let bar = (
            Utc.timestamp_opt(*ts, 0).single(),
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
        );
        match bar {
            (Some(timestamp), Some(open), Some(high), Some(low), Some(close)) => {
                candles.push(Candle::new(timestamp, open, high, low, close));
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("📊 Skipped {} incomplete bars", skipped);
    }
    candles.sort_by_key(|c| c.timestamp);

    Ok(ParsedChart {
        candles,
        market_price,
    })
}

// ==================== YAHOO SOURCE ====================

pub struct YahooCandleSource {
    client: Client,
    base_url: String,
}

impl YahooCandleSource {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: YAHOO_CHART_BASE.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_chart(&self, symbol: &str, range: &str, interval: &str) -> Result<ParsedChart, DataError> {
        let url = format!("{}/{}", self.base_url, symbol);
        let response = self
            .client
            .get(&url)
            .query(&[("range", range), ("interval", interval)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(DataError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_chart(&body)
    }
}

impl Default for YahooCandleSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CandleSource for YahooCandleSource {
    async fn fetch_candles(
        &self,
        symbol: &str,
        period: &str,
        interval: &str,
    ) -> Result<Vec<Candle>, DataError> {
        let chart = self.fetch_chart(symbol, period, interval).await?;
        info!(
            "📊 Fetched {} {} candles for {} over {}",
            chart.candles.len(),
            interval,
            symbol,
            period
        );
        Ok(chart.candles)
    }

    async fn last_price(&self, symbol: &str) -> Option<f64> {
        match self.fetch_chart(symbol, "1d", "1m").await {
            Ok(chart) => chart
                .market_price
                .or_else(|| chart.candles.last().map(|c| c.close)),
            Err(e) => {
                warn!("📊 Last price lookup for {} failed: {}", symbol, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"currency": "JPY", "symbol": "JPY=X", "regularMarketPrice": 151.18},
                "timestamp": [1791860400, 1791859500, 1791861300],
                "indicators": {"quote": [{
                    "open":  [151.02, 150.90, null],
                    "high":  [151.20, 151.05, 151.30],
                    "low":   [150.98, 150.85, 151.00],
                    "close": [151.10, 151.02, 151.25]
                }]}
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_skips_incomplete_bars_and_sorts() {
        let parsed = parse_chart(SAMPLE).unwrap();
        assert_eq!(parsed.candles.len(), 2);
        assert!(parsed.candles[0].timestamp < parsed.candles[1].timestamp);
        assert_eq!(parsed.candles[0].open, 150.90);
        assert_eq!(parsed.candles[1].close, 151.10);
        assert_eq!(parsed.market_price, Some(151.18));
    }

    #[test]
    fn test_parse_upstream_error() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;
        match parse_chart(body) {
            Err(DataError::Upstream(msg)) => assert!(msg.contains("Not Found")),
            other => panic!("expected upstream error, got {:?}", other.map(|c| c.candles.len())),
        }
    }

    #[test]
    fn test_parse_empty_result_is_soft() {
        let body = r#"{"chart":{"result":[],"error":null}}"#;
        let parsed = parse_chart(body).unwrap();
        assert!(parsed.candles.is_empty());
        assert!(parsed.market_price.is_none());
    }

    #[test]
    fn test_parse_garbage_is_malformed() {
        assert!(matches!(parse_chart("<html>"), Err(DataError::Malformed(_))));
    }
}
