use clap::Parser;

use jcpe_portal::cli::Cli;
use jcpe_portal::config::{get_config, init_config};
use jcpe_portal::runtime::modes::{self, Mode};
use jcpe_portal::system::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_config();
    let config = get_config();
    // guard 必须存活到进程结束，否则文件日志不会刷新
    let _log_guard = init_logging(&config.logging)?;

    match modes::detect_mode(cli.command.as_ref()) {
        #[cfg(feature = "server")]
        Mode::Server => modes::run_server().await,

        #[cfg(feature = "cli")]
        Mode::Cli => {
            let Some(command) = cli.command else {
                return Ok(());
            };
            if let Err(e) = modes::run_cli(command).await {
                eprintln!("{}", e.format_colored());
                std::process::exit(1);
            }
            Ok(())
        }

        Mode::Unknown => {
            anyhow::bail!("No execution mode available; build with the `server` or `cli` feature")
        }
    }
}
