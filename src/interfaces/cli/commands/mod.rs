//! CLI command implementations

mod config_gen;
mod ingest;
mod maintenance;
mod ranking;
mod staff;

pub use config_gen::config_generate;
pub use ingest::{ingest_newsapi, ingest_refresh};
pub use maintenance::{cleanup, report, seed_categories};
pub use ranking::run_ranking;
pub use staff::create_staff;
