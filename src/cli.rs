//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// JCPE Portal - regional news portal
#[derive(Parser)]
#[command(name = "jcpe-portal")]
#[command(version)]
#[command(about = "Regional news portal server and maintenance commands", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Compute and store the daily ranking
    Ranking {
        /// Calendar day (YYYY-MM-DD), defaults to yesterday
        #[arg(long)]
        date: Option<String>,
    },

    /// Import or refresh articles from external sources
    Ingest {
        #[command(subcommand)]
        source: IngestCommands,
    },

    /// Create the fixed editorial category list
    SeedCategories,

    /// List articles without image or with truncated text
    Cleanup {
        /// Delete the listed articles
        #[arg(long)]
        yes: bool,
    },

    /// Show body sizes of the latest articles
    Report,

    /// Create a staff account for the admin API
    CreateStaff {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        /// Password (if not provided, will prompt interactively)
        #[arg(long)]
        password: Option<String>,

        /// Read password from stdin (for scripting)
        #[arg(long)]
        stdin: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum IngestCommands {
    /// Fetch recent articles from NewsAPI.org
    Newsapi {
        /// NewsAPI key (or ingest.news_api_key / NEWS_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Only this category
        #[arg(long)]
        category: Option<String>,

        /// Articles per category
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },

    /// Re-scrape imported articles and keep longer bodies
    Refresh,
}

/// Configuration management commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}
