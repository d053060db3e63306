// src/lib.rs
pub mod advisor;
pub mod api;
pub mod config;
pub mod data;
pub mod errors;
pub mod notifications;
pub mod realtime;
pub mod types;
pub mod zones;
