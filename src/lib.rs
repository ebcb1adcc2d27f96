//! JCPE Portal - regional news portal for Recife and Pernambuco
//!
//! This library provides the core of the portal: article listings, unique-view
//! tracking and daily ranking, polls, reader accounts with saved articles and
//! preferences, the editorial admin API and the NewsAPI ingestion commands.
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: Batch commands (ranking, ingest, cleanup, ...)
//!
//! # Architecture
//! - `storage`: SeaORM persistence and migrations
//! - `analytics`: View tracking and daily ranking
//! - `services`: Business logic shared by the API and the commands
//! - `api`: HTTP services and middleware
//! - `ingest`: NewsAPI import, page scraping and maintenance
//! - `interfaces`: Command-line interface
//! - `config`: Configuration management
//! - `runtime`: Application lifecycle and execution modes
//! - `system`: Logging setup

pub mod analytics;
pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod ingest;
pub mod interfaces;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
