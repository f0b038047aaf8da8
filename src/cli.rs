//! Command line surface built on clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Advances the video generation queue: polls running tasks, admits queued jobs.
#[derive(Debug, Parser)]
#[command(name = "video-dispatch", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML config file (defaults to ./video-dispatch.toml if present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the concurrency cap.
    #[arg(long, global = true)]
    pub max_concurrent: Option<usize>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a single tick and print the trigger payload as JSON.
    Tick,

    /// Tick on an interval until interrupted.
    Watch {
        /// Seconds between ticks (overrides config).
        #[arg(long)]
        interval_secs: Option<u64>,

        /// Archive finished videos in background tasks.
        #[arg(long, default_value_t = false)]
        background_archive: bool,
    },

    /// Print job counts per status and free admission slots.
    Status,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_parses_tick() {
        let cli = Cli::parse_from(["video-dispatch", "tick"]);
        assert!(matches!(cli.command, Command::Tick));
        assert!(cli.config.is_none());
        assert!(!cli.log_json);
    }

    #[test]
    fn cli_parses_watch_options() {
        let cli = Cli::parse_from([
            "video-dispatch",
            "watch",
            "--interval-secs",
            "30",
            "--background-archive",
        ]);
        match cli.command {
            Command::Watch {
                interval_secs,
                background_archive,
            } => {
                assert_eq!(interval_secs, Some(30));
                assert!(background_archive);
            }
            _ => panic!("expected Watch command"),
        }
    }

    #[test]
    fn cli_parses_global_flags() {
        let cli = Cli::parse_from([
            "video-dispatch",
            "--config",
            "prod.toml",
            "--max-concurrent",
            "2",
            "--log-json",
            "status",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("prod.toml")));
        assert_eq!(cli.max_concurrent, Some(2));
        assert!(cli.log_json);
        assert!(matches!(cli.command, Command::Status));
    }

    #[test]
    fn cli_verify() {
        Cli::command().debug_assert();
    }
}
