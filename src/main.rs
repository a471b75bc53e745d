//! pushdown-verify entry point
//!
//! Parses arguments and dispatches through `cli::run`. Errors, including a
//! run that found defects, are printed to stderr and exit non-zero.

use pushdown_verify::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
