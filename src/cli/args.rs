//! CLI argument definitions using clap
//!
//! Commands:
//! - pushdown-verify run [--config <path>] [--seed N] [--rows N] [--workers N]
//!   [--fault MODE] [--accumulate]
//! - pushdown-verify cases [--config <path>] [--seed N]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Randomized correctness oracle for secondary-index lookup pushdown
#[derive(Parser, Debug)]
#[command(name = "pushdown-verify")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Seed, split, and verify; prints the JSON run report
    Run {
        /// Path to configuration file; defaults apply without one
        #[arg(long)]
        config: Option<PathBuf>,

        /// Master seed, overriding the config
        #[arg(long)]
        seed: Option<u64>,

        /// Row count, overriding K * F
        #[arg(long)]
        rows: Option<u64>,

        /// Seeding workers
        #[arg(long)]
        workers: Option<usize>,

        /// Fault to inject into the in-process engine
        #[arg(long, value_name = "MODE")]
        fault: Option<String>,

        /// Keep verifying after the first violation
        #[arg(long)]
        accumulate: bool,
    },

    /// Print the case batch and its SQL without connecting
    Cases {
        /// Path to configuration file; defaults apply without one
        #[arg(long)]
        config: Option<PathBuf>,

        /// Master seed, overriding the config
        #[arg(long)]
        seed: Option<u64>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
