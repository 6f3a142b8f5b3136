//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "scribed",
    version,
    about = "Long-form transcription job server with speaker attribution",
    long_about = "Runs an HTTP job server that transcribes long-form audio and video with \
                  speaker attribution. Jobs are queued and processed one at a time; results \
                  are written next to the source file or retrieved via the poll endpoint."
)]
pub struct Cli {
    /// Path to configuration file (default: ~/.config/scribed/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bind address override
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Listen port override
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Suppress job progress logging
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that required system tools are installed
    Check,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_server_flags() {
        let cli = Cli::try_parse_from(["scribed", "--host", "127.0.0.1", "-p", "8080", "-q"])
            .unwrap();
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(8080));
        assert!(cli.quiet);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_check_subcommand() {
        let cli = Cli::try_parse_from(["scribed", "check"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Check)));
    }

    #[test]
    fn test_parse_completions_subcommand() {
        let cli = Cli::try_parse_from(["scribed", "completions", "bash"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Completions { shell: Shell::Bash })
        ));
    }

    #[test]
    fn test_config_flag_is_global() {
        let cli = Cli::try_parse_from(["scribed", "check", "--config", "/tmp/s.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/s.toml")));
    }
}
