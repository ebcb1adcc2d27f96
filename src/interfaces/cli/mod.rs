//! CLI interface module
//!
//! Batch commands run against the same storage and services as the server.

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands, IngestCommands};
use crate::errors::PortalError;
use crate::runtime::lifetime::startup::prepare_startup;
use commands::{
    cleanup, config_generate, create_staff, ingest_newsapi, ingest_refresh, report,
    run_ranking, seed_categories,
};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<PortalError> for CliError {
    fn from(err: PortalError) -> Self {
        match err {
            PortalError::DateParse(msg) => CliError::ParseError(msg),
            PortalError::DatabaseConfig(_)
            | PortalError::DatabaseConnection(_)
            | PortalError::DatabaseOperation(_) => CliError::StorageError(err.to_string()),
            other => CliError::CommandError(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::StorageError(format!("{:#}", err))
    }
}

/// Run a CLI command from clap-parsed input
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    // Generate doesn't need a database connection
    if let Commands::Config {
        action: ConfigCommands::Generate { output_path, force },
    } = cmd
    {
        return config_generate(output_path, force).await;
    }

    let ctx = prepare_startup().await?;

    match cmd {
        Commands::Ranking { date } => run_ranking(&ctx, date).await,
        Commands::Ingest { source } => match source {
            IngestCommands::Newsapi {
                api_key,
                category,
                limit,
            } => ingest_newsapi(&ctx, api_key, category, limit).await,
            IngestCommands::Refresh => ingest_refresh(&ctx).await,
        },
        Commands::SeedCategories => seed_categories(&ctx).await,
        Commands::Cleanup { yes } => cleanup(&ctx, yes).await,
        Commands::Report => report(&ctx).await,
        Commands::CreateStaff {
            name,
            email,
            password,
            stdin,
        } => create_staff(&ctx, name, email, password, stdin).await,
        Commands::Serve => unreachable!("serve handled in main"),
        Commands::Config { .. } => unreachable!("handled above"),
    }
}
