//! Command-line argument parsing for Chabunhae
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Chabunhae - fault ratio lookup for traffic accidents
#[derive(Parser, Debug)]
#[command(name = "chabunhae")]
#[command(version)]
#[command(about = "사고 상황을 설명하면 유사 판례와 과실 비율을 찾아드립니다", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Case store JSON file (overrides config and CHABUNHAE_STORE)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand; interactive mode when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Answer one accident description and exit
    Ask {
        /// Accident description
        #[arg(value_name = "DESCRIPTION")]
        query: String,

        /// Number of similar cases to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Print the retrieved cases before the answer
        #[arg(long)]
        show_context: bool,
    },

    /// Start interactive REPL mode
    Start,

    /// Crawl accident chart pages into the case store
    Crawl {
        /// Output file (defaults to the configured store path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// First chart page
        #[arg(long)]
        first_page: Option<u32>,

        /// Last chart page (inclusive)
        #[arg(long)]
        last_page: Option<u32>,
    },

    /// Summarize the case store, or show one case
    Cases {
        /// Case code such as 차1-1
        #[arg(value_name = "CODE")]
        code: Option<String>,
    },

    /// Display current configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Subcommand to run, defaulting to the REPL
    pub fn command_or_default(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Start)
    }
}

impl Verbosity {
    /// Log level for this verbosity; `Normal` keeps the configured level
    pub fn log_level<'a>(&self, configured: &'a str) -> &'a str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => configured,
            Verbosity::Verbose => "debug",
            Verbosity::VeryVerbose => "trace",
        }
    }

    /// Check if should show progress bars
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
