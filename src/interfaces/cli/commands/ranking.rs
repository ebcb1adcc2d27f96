//! `ranking` command

use colored::Colorize;

use crate::api::services::admin::parse_date;
use crate::interfaces::cli::CliError;
use crate::runtime::lifetime::startup::StartupContext;

/// Compute and store the ranking for `date` (default: yesterday)
pub async fn run_ranking(ctx: &StartupContext, date: Option<String>) -> Result<(), CliError> {
    let day = match date {
        Some(value) => parse_date(&value)?,
        None => ctx.analytics.yesterday(),
    };

    let entries = ctx.analytics.compute_daily_ranking(day).await?;
    if entries.is_empty() {
        println!("{} No views recorded on {}", "ℹ".bold().blue(), day);
        return Ok(());
    }

    println!(
        "{} Ranking for {} stored ({} articles)",
        "✓".bold().green(),
        day.to_string().cyan(),
        entries.len()
    );
    for entry in entries.iter().take(10) {
        println!(
            "  {:>3}. article {} - {} views",
            entry.rank, entry.article_id, entry.views
        );
    }
    Ok(())
}
