// src/data/mod.rs
pub mod candle_source;

pub use candle_source::{CandleSource, YahooCandleSource};
