//! Parley application binary - composition root.
//!
//! 1. Install tracing (stderr; stdout carries the conversation)
//! 2. Load configuration from TOML and apply command-line overrides
//! 3. Build the analyzer, reply backend and turn controller
//! 4. Run the interactive conversation or a one-shot analysis

mod cli;
mod repl;

use clap::Parser;
use parley_chat::{QueryAnalyzer, Session, TurnController};
use parley_core::ParleyConfig;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter};

use cli::{CliArgs, Command};

/// Filter fixed before the config file is read: `RUST_LOG`, then `--log-level`.
///
/// `None` leaves the level to the config file.
fn pinned_filter(cli_level: Option<&str>) -> Option<EnvFilter> {
    EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| cli_level.map(EnvFilter::new))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Tracing.
    let pinned = pinned_filter(args.log_level.as_deref());
    let follows_config = pinned.is_none();
    let (filter, filter_handle) =
        reload::Layer::new(pinned.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Parley v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = ParleyConfig::load_or_default(&config_file);
    args.apply_overrides(&mut config)?;
    if follows_config {
        filter_handle.reload(EnvFilter::new(&config.general.log_level))?;
    }

    match args.command() {
        Command::Analyze { query } => {
            let analyzer = QueryAnalyzer::from_config(&config.analysis)?;
            let result = analyzer.analyze(&query.join(" "), &[]);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Chat => {
            let controller = match TurnController::from_config(&config) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to build turn controller");
                    return Err(e.into());
                }
            };
            let mut session = Session::from_config(&config.session);
            tracing::info!(
                session_id = %session.id(),
                provider = controller.provider_name(),
                "Conversation started"
            );

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            repl::run(&controller, &mut session, stdin, &mut stdout).await?;

            tracing::info!(turns = session.turns().len(), "Conversation ended");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_level_pins_filter() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(pinned_filter(Some("debug")).is_some());
        assert!(pinned_filter(None).is_none());
    }
}
