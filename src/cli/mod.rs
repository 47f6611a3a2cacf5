//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "recall",
    version,
    author = "neur0map",
    about = "Query routing and adaptive retrieval for a personal knowledge base",
    long_about = "Recall classifies natural-language queries over notes and schedules, resolves \
                  relative and absolute time expressions, and picks the retrieval strategy that \
                  fits each query."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/recall/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show how a query would be routed
    Route {
        /// Query text
        query: String,

        /// Show the decision in JSON format
        #[arg(long)]
        json: bool,

        /// Reference time in RFC 3339 (defaults to now)
        #[arg(long, value_name = "TIMESTAMP")]
        at: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Show only a specific section
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Print the configuration file path
    Path,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_route() {
        let cli = Cli::try_parse_from(["recall", "-v", "route", "明天下午", "--json"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Route { query, json, at } => {
                assert_eq!(query, "明天下午");
                assert!(json);
                assert!(at.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
