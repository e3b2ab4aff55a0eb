//! CLI argument definitions for the Parley binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use parley_core::{ParleyConfig, ReplyProviderKind, Result};

/// Parley: a chat front-end that expands each question and tags its topic.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Reply provider: mock or gemini.
    #[arg(short = 'p', long = "provider", global = true)]
    pub provider: Option<String>,

    /// Remote model name.
    #[arg(short = 'm', long = "model", global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start an interactive conversation (default).
    Chat,
    /// Print the analysis of a standalone query as JSON.
    Analyze {
        /// The query text.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PARLEY_CONFIG env var > ~/.parley/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PARLEY_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// The subcommand to run, defaulting to `chat`.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_overrides(&self, config: &mut ParleyConfig) -> Result<()> {
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref provider) = self.provider {
            config.reply.provider = provider.parse::<ReplyProviderKind>()?;
        }
        if let Some(ref model) = self.model {
            config.reply.model = model.clone();
        }
        Ok(())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".parley").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".parley").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_command_is_chat() {
        let args = CliArgs::parse_from(["parley"]);
        assert_eq!(args.command(), Command::Chat);
    }

    #[test]
    fn test_analyze_collects_words() {
        let args = CliArgs::parse_from(["parley", "analyze", "what", "about", "that"]);
        assert_eq!(
            args.command(),
            Command::Analyze {
                query: vec!["what".into(), "about".into(), "that".into()]
            }
        );
    }

    #[test]
    fn test_analyze_requires_query() {
        assert!(CliArgs::try_parse_from(["parley", "analyze"]).is_err());
    }

    #[test]
    fn test_explicit_config_path_wins() {
        let args = CliArgs::parse_from(["parley", "--config", "/tmp/p.toml"]);
        assert_eq!(args.resolve_config_path(), PathBuf::from("/tmp/p.toml"));
    }

    #[test]
    fn test_overrides_applied() {
        let args = CliArgs::parse_from([
            "parley",
            "chat",
            "--provider",
            "gemini",
            "--model",
            "gemini-2.0-flash",
            "--log-level",
            "debug",
        ]);
        let mut config = ParleyConfig::default();
        args.apply_overrides(&mut config).unwrap();
        assert_eq!(config.reply.provider, ReplyProviderKind::Gemini);
        assert_eq!(config.reply.model, "gemini-2.0-flash");
        assert_eq!(config.general.log_level, "debug");
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let args = CliArgs::parse_from(["parley"]);
        let mut config = ParleyConfig::default();
        args.apply_overrides(&mut config).unwrap();
        assert_eq!(config.reply.provider, ReplyProviderKind::Mock);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let args = CliArgs::parse_from(["parley", "--provider", "telepathy"]);
        let mut config = ParleyConfig::default();
        assert!(args.apply_overrides(&mut config).is_err());
    }
}
