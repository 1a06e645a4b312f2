use clap::Parser;

use paylane_cli::{Cli, run};
use paylane_infra::config::GatewayConfig;

fn main() {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => GatewayConfig::load_from(Some(path)),
        None => GatewayConfig::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("paylane: {e}");
            std::process::exit(1);
        }
    };

    paylane_observability::init(cli.log_format.unwrap_or(config.log_format));
    tracing::debug!(ledger = %config.ledger_path.display(), "configuration loaded");

    let stdout = std::io::stdout();
    if let Err(e) = run(cli.command, &config, &mut stdout.lock()) {
        tracing::error!(error = %e, "command failed");
        eprintln!("paylane: {e:#}");
        std::process::exit(1);
    }
}
