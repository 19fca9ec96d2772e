//! Refresh mode: one refresh cycle against the configured store, then exit

use anyhow::{Result, bail};
use colored::Colorize;

use crate::config::get_config;
use crate::models::Category;
use crate::runtime::lifetime::startup::prepare_services;
use crate::services::RefreshOutcome;

pub async fn run_refresh(category: Option<&str>) -> Result<()> {
    let config = get_config();
    let context = prepare_services(&config).await?;

    let outcomes = match category {
        Some(name) => {
            let category: Category = name.parse()?;
            vec![context.refresh_service.refresh_one(category).await]
        }
        None => context.refresh_service.refresh_all().await,
    };

    for outcome in &outcomes {
        println!("{}", format_outcome(outcome));
    }

    let failed = outcomes.iter().filter(|o| !o.success).count();
    if failed > 0 {
        bail!("{} of {} categories failed to refresh", failed, outcomes.len());
    }
    Ok(())
}

fn format_outcome(outcome: &RefreshOutcome) -> String {
    if outcome.success {
        format!(
            "{} {:<9} {} ranges, {} entries, {} skipped",
            "[OK]".green().bold(),
            outcome.category.to_string(),
            outcome.ranges,
            outcome.entries,
            outcome.skipped
        )
    } else {
        format!(
            "{} {:<9} {}",
            "[FAILED]".red().bold(),
            outcome.category.to_string(),
            outcome.error.as_deref().unwrap_or("unknown error")
        )
    }
}
