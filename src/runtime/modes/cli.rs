//! CLI mode

use crate::cli::Commands;
use crate::interfaces::cli::CliError;

/// Run a batch command
pub async fn run_cli(command: Commands) -> Result<(), CliError> {
    crate::interfaces::cli::run_cli_command(command).await
}
