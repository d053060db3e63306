// src/errors.rs
use thiserror::Error;

/// Failures while fetching candles or the last price.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("candle request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("candle source returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed candle payload: {0}")]
    Malformed(String),

    #[error("candle source reported an error: {0}")]
    Upstream(String),
}

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("advisor request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("advisor returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("advisor response had no text")]
    EmptyResponse,

    #[error("advisor timed out after {0}s")]
    Timeout(u64),
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{channel} rejected the message with HTTP {status}: {body}")]
    Rejected {
        channel: &'static str,
        status: u16,
        body: String,
    },

    #[error("notification timed out after {0}s")]
    Timeout(u64),

    #[error("all {0} notification channels failed")]
    AllChannelsFailed(usize),
}

/// Anything that aborts a single monitoring run.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("no usable current price")]
    NoPrice,
}
