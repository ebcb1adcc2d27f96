//! Mode routing
//!
//! - Server mode (HTTP server, the default and `serve`)
//! - CLI mode (batch commands)

#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "server")]
pub use server::run_server;

#[cfg(feature = "cli")]
pub use cli::run_cli;

use crate::cli::Commands;

/// Mode detection result
#[derive(Debug, PartialEq)]
pub enum Mode {
    #[cfg(feature = "server")]
    Server,
    #[cfg(feature = "cli")]
    Cli,
    Unknown,
}

/// 无子命令或 `serve` 时启动服务器，其余子命令走 CLI
pub fn detect_mode(command: Option<&Commands>) -> Mode {
    #[cfg(feature = "server")]
    if matches!(command, None | Some(Commands::Serve)) {
        return Mode::Server;
    }

    #[cfg(feature = "cli")]
    if command.is_some() {
        return Mode::Cli;
    }

    Mode::Unknown
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_mode() {
        assert_eq!(detect_mode(None), Mode::Server);
        assert_eq!(detect_mode(Some(&Commands::Serve)), Mode::Server);
        assert_eq!(detect_mode(Some(&Commands::Report)), Mode::Cli);
    }
}
