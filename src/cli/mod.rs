pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gleaner")]
#[command(about = "Collects reviews from dynamically loaded pages and forwards them to a webhook", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/gleaner/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Harvest all targets, repeating on the configured interval
    Run(RunArgs),
    /// List configured targets and the URLs they resolve to
    Targets,
    /// Send a single marked test record to the sink
    Ping,
}

#[derive(clap::Args, Debug, Default, Clone)]
pub struct RunArgs {
    /// Run every target once and exit
    #[arg(long)]
    pub once: bool,

    /// Time between runs (e.g., "30m", "6h", "7d"), overrides schedule.interval
    #[arg(short, long, conflicts_with = "once")]
    pub interval: Option<String>,

    /// Wait one interval before the first run
    #[arg(long, conflicts_with = "once")]
    pub no_initial_run: bool,

    /// Stop collecting a target after this many reviews
    #[arg(long)]
    pub max_records: Option<usize>,

    /// Collect without sending anything to the sink
    #[arg(long)]
    pub no_dispatch: bool,

    /// Also write a JSON snapshot of every run into this directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Scroll the reviews yourself in a visible browser, pressing Enter after each scroll
    #[arg(long)]
    pub manual: bool,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "gleaner",
            "--config",
            "/tmp/g.toml",
            "run",
            "--once",
            "--max-records",
            "50",
            "--no-dispatch",
            "--output",
            "out",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/g.toml")));
        match cli.command {
            Commands::Run(args) => {
                assert!(args.once);
                assert_eq!(args.max_records, Some(50));
                assert!(args.no_dispatch);
                assert_eq!(args.output, Some(PathBuf::from("out")));
                assert!(!args.manual);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_once_conflicts_with_interval() {
        assert!(Cli::try_parse_from(["gleaner", "run", "--once", "--interval", "1h"]).is_err());
    }

    #[test]
    fn test_subcommands() {
        assert!(matches!(
            Cli::parse_from(["gleaner", "targets"]).command,
            Commands::Targets
        ));
        assert!(matches!(Cli::parse_from(["gleaner", "ping"]).command, Commands::Ping));
    }
}
