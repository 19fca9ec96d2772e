//! Lookup mode: resolve one address against the current store, no refresh

use anyhow::{Context, Result};

use crate::config::get_config;
use crate::runtime::lifetime::startup::prepare_services;

pub async fn run_lookup(ip: &str) -> Result<()> {
    let config = get_config();
    let context = prepare_services(&config).await?;

    let report = context.location_service.locate(ip).await;
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{}", json);
    Ok(())
}
