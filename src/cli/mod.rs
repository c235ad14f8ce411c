//! Command-line interface for the ShareX server.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

/// ShareX - password-protected, expiring file sharing
#[derive(Parser)]
#[command(name = "sharex")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default locations
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,

    /// Create default config file
    Init,

    /// Load and validate the configuration, then exit
    CheckConfig,
}

impl Cli {
    pub fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::load_from_path(path),
            None => Config::load(),
        }
    }
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["sharex"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["sharex", "check-config"]).unwrap();
        assert_eq!(cli.command, Some(Commands::CheckConfig));

        let cli = Cli::try_parse_from(["sharex", "init"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Init));
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["sharex", "serve", "--config", "/etc/sharex.toml"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Serve));
        assert_eq!(cli.config, Some(PathBuf::from("/etc/sharex.toml")));
    }

    #[test]
    fn test_load_config_from_explicit_path() {
        let path = std::env::temp_dir().join(format!("sharex-cli-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[server]\nport = 9191\n").unwrap();

        let cli = Cli::try_parse_from(["sharex", "--config", path.to_str().unwrap()]).unwrap();
        let config = cli.load_config().unwrap();
        assert_eq!(config.server.port, 9191);

        let _ = std::fs::remove_file(path);
    }
}
