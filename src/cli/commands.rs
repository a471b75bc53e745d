//! CLI commands
//!
//! - run: full verification run against the configured backend
//! - cases: dry run printing the case batch and its SQL

use std::path::Path;

use serde::Serialize;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::write_json;
use crate::cases::Case;
use crate::config::{BackendConfig, FailurePolicy, HarnessConfig};
use crate::engine::FaultMode;
use crate::executor::QueryBuilder;
use crate::observability::Logger;
use crate::orchestrator::{open_backend, synthesize_cases, Orchestrator};

/// Flag overrides for `run`
#[derive(Debug, Default, Clone)]
pub struct RunOverrides {
    pub seed: Option<u64>,
    pub rows: Option<u64>,
    pub workers: Option<usize>,
    pub fault: Option<String>,
    pub accumulate: bool,
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Run {
            config,
            seed,
            rows,
            workers,
            fault,
            accumulate,
        } => {
            let overrides = RunOverrides {
                seed,
                rows,
                workers,
                fault,
                accumulate,
            };
            verify(config.as_deref(), overrides)
        }
        Command::Cases { config, seed } => cases(config.as_deref(), seed),
    }
}

/// Loads the config file, or defaults without one
pub fn load_config(path: Option<&Path>) -> CliResult<HarnessConfig> {
    match path {
        Some(path) => Ok(HarnessConfig::load(path)?),
        None => Ok(HarnessConfig::default()),
    }
}

/// Applies flag overrides and revalidates
pub fn apply_overrides(
    mut config: HarnessConfig,
    overrides: &RunOverrides,
) -> CliResult<HarnessConfig> {
    if let Some(seed) = overrides.seed {
        config.seed = Some(seed);
    }
    if let Some(rows) = overrides.rows {
        config.rows = Some(rows);
    }
    if let Some(workers) = overrides.workers {
        config.workers = workers;
    }
    if overrides.accumulate {
        config.failure_policy = FailurePolicy::Accumulate;
    }
    if let Some(name) = &overrides.fault {
        let fault = FaultMode::parse(name)
            .ok_or_else(|| CliError::config_error(format!("unknown fault mode: {}", name)))?;
        match &mut config.backend {
            BackendConfig::Memory { fault: current } => *current = fault,
            BackendConfig::Mysql { .. } => {
                return Err(CliError::config_error(
                    "--fault only applies to the memory backend",
                ))
            }
        }
    }
    config.validate()?;
    Ok(config)
}

/// Full run; the report goes to stdout, then a failed run becomes an error
pub fn verify(config_path: Option<&Path>, overrides: RunOverrides) -> CliResult<()> {
    let config = apply_overrides(load_config(config_path)?, &overrides)?;
    let connector = open_backend(&config.backend).map_err(crate::errors::HarnessError::from)?;
    let orchestrator = Orchestrator::new(config, connector.as_ref());
    let report = orchestrator.run()?;

    write_json(&report)?;

    if !report.passed {
        return Err(CliError::run_failed(
            report.violations().count(),
            report.divergences.len(),
        ));
    }
    Ok(())
}

#[derive(Serialize)]
struct PlannedCase<'a> {
    #[serde(flatten)]
    case: &'a Case,
    sql: String,
}

#[derive(Serialize)]
struct CasePlan<'a> {
    seed: u64,
    table: &'a str,
    cases: Vec<PlannedCase<'a>>,
}

/// Prints the case batch for the resolved seed
pub fn cases(config_path: Option<&Path>, seed: Option<u64>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let seed = seed.or(config.seed).unwrap_or_else(rand::random);
    let seed_field = seed.to_string();
    Logger::info("CASES_PLANNED", &[("seed", seed_field.as_str())]);

    let batch = synthesize_cases(&config, seed);
    let plan = CasePlan {
        seed,
        table: &config.table,
        cases: batch
            .iter()
            .map(|case| PlannedCase {
                case,
                sql: QueryBuilder::select(&config.table, case),
            })
            .collect(),
    };
    write_json(&plan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_apply() {
        let overrides = RunOverrides {
            seed: Some(9),
            rows: Some(300),
            workers: Some(2),
            fault: Some("drop_first_region".to_string()),
            accumulate: true,
        };
        let config = apply_overrides(HarnessConfig::default(), &overrides).unwrap();
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.rows(), 300);
        assert_eq!(config.workers, 2);
        assert_eq!(config.failure_policy, FailurePolicy::Accumulate);
        assert_eq!(
            config.backend,
            BackendConfig::Memory {
                fault: FaultMode::DropFirstRegion
            }
        );
    }

    #[test]
    fn test_unknown_fault_rejected() {
        let overrides = RunOverrides {
            fault: Some("melt".to_string()),
            ..Default::default()
        };
        let err = apply_overrides(HarnessConfig::default(), &overrides).unwrap_err();
        assert_eq!(err.code_str(), "PUSHDOWN_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_fault_needs_memory_backend() {
        let config = HarnessConfig {
            backend: BackendConfig::Mysql {
                url: "mysql://root@127.0.0.1:4000/test".to_string(),
            },
            ..Default::default()
        };
        let overrides = RunOverrides {
            fault: Some("none".to_string()),
            ..Default::default()
        };
        assert!(apply_overrides(config, &overrides).is_err());
    }

    #[test]
    fn test_zero_workers_override_rejected() {
        let overrides = RunOverrides {
            workers: Some(0),
            ..Default::default()
        };
        let err = apply_overrides(HarnessConfig::default(), &overrides).unwrap_err();
        assert_eq!(err.code_str(), "PUSHDOWN_CONFIG_INVALID");
    }
}
