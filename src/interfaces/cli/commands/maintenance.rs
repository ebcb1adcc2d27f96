//! `seed-categories`, `cleanup`, `report`

use colored::Colorize;

use crate::ingest::{
    CleanupReason, SizeStatus, delete_candidates, find_cleanup_candidates, size_report,
};
use crate::interfaces::cli::CliError;
use crate::runtime::lifetime::startup::StartupContext;

fn short(title: &str, max: usize) -> String {
    title.chars().take(max).collect()
}

pub async fn seed_categories(ctx: &StartupContext) -> Result<(), CliError> {
    let report = crate::ingest::seed_categories(&ctx.editorial).await?;
    let total = ctx.storage.count_categories().await?;

    println!("{}", "Categories".bold());
    println!("  {}: {}", "Created".green(), report.created);
    println!("  {}: {}", "Already present".dimmed(), report.existing);
    println!("  {}: {}", "Total".cyan(), total);
    Ok(())
}

pub async fn cleanup(ctx: &StartupContext, confirmed: bool) -> Result<(), CliError> {
    let candidates = find_cleanup_candidates(&ctx.storage, &ctx.media).await?;
    if candidates.is_empty() {
        println!("{} No problematic articles found", "✓".bold().green());
        return Ok(());
    }

    let (missing_image, truncated): (Vec<_>, Vec<_>) = candidates
        .iter()
        .partition(|c| c.reason == CleanupReason::MissingImage);

    println!(
        "{} Articles without image or with a missing file: {}",
        "✗".red(),
        missing_image.len()
    );
    for c in &missing_image {
        println!("  ID {}: {}", c.id, short(&c.title, 70));
    }
    println!("{} Articles with truncated text: {}", "✗".red(), truncated.len());
    for c in &truncated {
        println!("  ID {}: {}", c.id, short(&c.title, 70));
    }

    if !confirmed {
        println!(
            "\n{} {} articles would be deleted. Run again with {} to delete them.",
            "ℹ".bold().blue(),
            candidates.len(),
            "--yes".bold()
        );
        return Ok(());
    }

    let deleted = delete_candidates(&ctx.editorial, &candidates).await;
    let remaining = ctx.storage.count_articles().await?;
    println!(
        "{} {} articles deleted, {} remaining",
        "✓".bold().green(),
        deleted,
        remaining
    );
    Ok(())
}

pub async fn report(ctx: &StartupContext) -> Result<(), CliError> {
    let report = size_report(&ctx.storage).await?;

    println!("{}", "Latest articles".bold());
    for entry in &report.entries {
        let label = entry.status.as_ref();
        let marker = match entry.status {
            SizeStatus::Ok => label.green(),
            SizeStatus::Warn => label.yellow(),
            SizeStatus::Short => label.red(),
        };
        println!(
            "  [{:>5}] ID {}: {:4} chars - {}",
            marker,
            entry.id,
            entry.body_chars,
            short(&entry.title, 60)
        );
    }
    println!("\n{}: {}", "Total articles".cyan(), report.total);
    Ok(())
}
