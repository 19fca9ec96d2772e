//! Weblocation - IP to location, currency and weather
//!
//! Resolves an IPv4 address against periodically refreshed GeoLite2 CSV
//! datasets and enriches the result with live weather and exchange rates.
//!
//! # Architecture
//! - `store`: Score-ordered range index and dictionaries (memory / redis)
//! - `services`: Dataset ingestion, index building, resolution, enrichment
//! - `api`: HTTP handlers
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging

pub mod api;
pub mod config;
pub mod errors;
pub mod models;
pub mod runtime;
pub mod services;
pub mod store;
pub mod system;
pub mod utils;
