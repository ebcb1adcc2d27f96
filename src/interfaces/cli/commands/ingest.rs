//! `ingest newsapi` / `ingest refresh`

use colored::Colorize;

use crate::config::get_config;
use crate::ingest::{ExtractLimits, NewsApiClient, NewsImporter, build_client, refresh_articles};
use crate::interfaces::cli::CliError;
use crate::runtime::lifetime::startup::StartupContext;

fn missing_key_help() -> String {
    format!(
        r#"NewsAPI key not configured.

{}
  jcpe-portal ingest newsapi --api-key YOUR_KEY
  or set NEWS_API_KEY (or ingest.news_api_key in config.toml)

{}
  1. Open https://newsapi.org/ and click "Get API Key"
  2. Fill in the free registration form
  3. Copy the key and use one of the options above"#,
        "Options:".yellow().bold(),
        "Getting a free key:".yellow().bold()
    )
}

pub async fn ingest_newsapi(
    ctx: &StartupContext,
    api_key: Option<String>,
    category: Option<String>,
    limit: u32,
) -> Result<(), CliError> {
    let config = get_config();
    let Some(api_key) = api_key
        .or_else(|| config.ingest.news_api_key.clone())
        .filter(|k| !k.trim().is_empty())
    else {
        return Err(CliError::CommandError(missing_key_help()));
    };

    let client = build_client(&config.ingest)?;
    let api = NewsApiClient::new(client.clone(), &config.ingest.news_api_base_url, api_key);
    let importer = NewsImporter::new(
        ctx.storage.clone(),
        ctx.editorial.clone(),
        client,
        &config.ingest,
    );

    println!("{}", "Fetching articles from NewsAPI...".yellow());
    let report = importer.import(&api, category.as_deref(), limit.max(1)).await?;

    println!(
        "{} Total: {} articles saved ({} skipped, {} failed)",
        "✓".bold().green(),
        report.saved.to_string().green(),
        report.skipped,
        report.failed
    );
    Ok(())
}

pub async fn ingest_refresh(ctx: &StartupContext) -> Result<(), CliError> {
    let config = get_config();
    let client = build_client(&config.ingest)?;
    let limits = ExtractLimits::from_config(&config.ingest);

    println!("{}", "Re-scraping imported articles...".yellow());
    let report = refresh_articles(&ctx.storage, &client, &limits).await?;

    println!("{}", "Summary".bold());
    println!("  {}: {}", "Updated".green(), report.updated);
    println!("  {}: {}", "Not updated".red(), report.unchanged);
    println!("  {}: {}", "Without source link".dimmed(), report.without_source);
    println!("  {}: {}", "Total".cyan(), report.total);
    Ok(())
}
