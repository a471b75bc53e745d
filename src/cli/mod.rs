//! CLI module
//!
//! Provides command-line interface for:
//! - run: seed, split, verify, and print the run report
//! - cases: print the synthesized case batch without connecting

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{apply_overrides, cases, load_config, run, run_command, verify, RunOverrides};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_json;
