//! Drives one verification run through its phases

use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::compare::compare_layouts;
use super::phase::Phase;
use super::report::{LayoutDivergence, PhaseReport, RunReport};
use crate::cases::{Case, CaseSynthesizer, SynthesisBounds};
use crate::config::{FailurePolicy, HarnessConfig, LayoutConfig};
use crate::dataset::DatasetGenerator;
use crate::errors::{HarnessError, HarnessResult};
use crate::executor::QueryExecutor;
use crate::index::GroundTruthIndex;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry, ObservationScope};
use crate::sql::{statements, Connector, SqlConnection};
use crate::verifier::{verify, Verdict};

// Keeps the case stream independent of the row stream under one seed.
const CASE_STREAM: u64 = 0xC2B2_AE3D_27D4_EB4F;

/// The fixed case batch for `config` under `seed`
pub fn synthesize_cases(config: &HarnessConfig, seed: u64) -> Vec<Case> {
    let mut rng = StdRng::seed_from_u64(seed ^ CASE_STREAM);
    CaseSynthesizer::new(SynthesisBounds::new(config.key_cardinality))
        .synthesize(&mut rng, config.case_rounds)
}

/// Logs `INFRASTRUCTURE_FAILURE` for `phase` and hands the error back
fn infrastructure_failure(phase: Phase, e: HarnessError) -> HarnessError {
    let phase_name = phase.to_string();
    let message = e.to_string();
    log_event_with_fields(
        Event::InfrastructureFailure,
        &[
            ("phase", phase_name.as_str()),
            ("code", e.code()),
            ("error", message.as_str()),
        ],
    );
    e
}

struct RunState {
    truth: GroundTruthIndex,
    cases: Vec<Case>,
    phases: Vec<PhaseReport>,
    verdicts: Vec<(String, Vec<Verdict>)>,
    divergences: Vec<LayoutDivergence>,
    halted: bool,
}

/// Runs the seed, split, and verify cycle against one system under test
pub struct Orchestrator<'a> {
    config: HarnessConfig,
    connector: &'a dyn Connector,
    seed: u64,
    metrics: MetricsRegistry,
}

impl<'a> Orchestrator<'a> {
    /// Resolves the master seed; a random one is drawn when none is configured.
    pub fn new(config: HarnessConfig, connector: &'a dyn Connector) -> Self {
        let seed = config.seed.unwrap_or_else(rand::random);
        Self {
            config,
            connector,
            seed,
            metrics: MetricsRegistry::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    pub fn cases(&self) -> Vec<Case> {
        synthesize_cases(&self.config, self.seed)
    }

    /// Runs every phase and reports the outcome.
    ///
    /// `Err` means the harness itself could not finish. Defects found in the
    /// system under test come back as `Ok` with `passed == false`.
    pub fn run(&self) -> HarnessResult<RunReport> {
        self.config.validate()?;
        let started_at = Utc::now();
        let seed = self.seed.to_string();
        let rows = self.config.rows().to_string();
        let layouts = self.config.layouts.len().to_string();
        log_event_with_fields(
            Event::RunBegin,
            &[
                ("seed", seed.as_str()),
                ("rows", rows.as_str()),
                ("backend", self.connector.name()),
                ("layouts", layouts.as_str()),
            ],
        );

        let mut state = RunState {
            truth: GroundTruthIndex::new(),
            cases: self.cases(),
            phases: Vec::new(),
            verdicts: Vec::new(),
            divergences: Vec::new(),
            halted: false,
        };

        // The control session is first needed by the seed phase
        let mut control = match self.connector.connect() {
            Ok(control) => control,
            Err(e) => return Err(infrastructure_failure(Phase::Seed, e.into())),
        };
        let mut phase = Phase::Seed;
        while phase != Phase::Done {
            if let Err(e) = self.step(phase, control.as_mut(), &mut state) {
                return Err(infrastructure_failure(phase, e));
            }
            phase = if state.halted {
                Phase::Done
            } else {
                phase.next(self.config.layouts.len())
            };
        }

        let passed = state.phases.iter().all(PhaseReport::passed) && state.divergences.is_empty();
        let report = RunReport {
            seed: self.seed,
            rows: self.config.rows(),
            key_cardinality: self.config.key_cardinality,
            primary_key: self.config.primary_key,
            backend: self.connector.name().to_string(),
            cases: state.cases.len(),
            started_at,
            finished_at: Utc::now(),
            phases: state.phases,
            divergences: state.divergences,
            metrics: self.metrics.snapshot(),
            passed,
        };

        let violations = report.violations().count().to_string();
        let divergences = report.divergences.len().to_string();
        let fields = [
            ("seed", seed.as_str()),
            ("violations", violations.as_str()),
            ("divergences", divergences.as_str()),
        ];
        if passed {
            log_event_with_fields(Event::RunComplete, &fields);
        } else {
            log_event_with_fields(Event::RunFailed, &fields);
        }
        Ok(report)
    }

    fn step(
        &self,
        phase: Phase,
        control: &mut dyn SqlConnection,
        state: &mut RunState,
    ) -> HarnessResult<()> {
        match phase {
            Phase::Seed => state.truth = self.seed_dataset(control)?,
            Phase::Split(i) => self.split(control, &self.config.layouts[i])?,
            Phase::Settle(i) => self.settle(&self.config.layouts[i]),
            Phase::Verify(i) => self.verify_layout(&self.config.layouts[i], state)?,
            Phase::Compare => self.compare(state),
            Phase::Done => {}
        }
        Ok(())
    }

    fn seed_dataset(&self, control: &mut dyn SqlConnection) -> HarnessResult<GroundTruthIndex> {
        let table = &self.config.table;
        if self.config.reset_schema {
            control.execute(&statements::drop_table(table), &[])?;
            control.execute(&statements::create_table(table, self.config.primary_key), &[])?;
            self.metrics.increment_statements();
            self.metrics.increment_statements();
            log_event_with_fields(
                Event::SchemaReset,
                &[
                    ("table", table.as_str()),
                    ("primary_key", self.config.primary_key.as_str()),
                ],
            );
        }

        let plan = self.config.dataset_plan(self.seed);
        let rows = plan.rows.to_string();
        let workers = plan.workers.to_string();
        let scope = ObservationScope::with_fields(
            "SEED",
            &[("rows", rows.as_str()), ("workers", workers.as_str())],
        );
        let truth = match DatasetGenerator::new(&plan, &self.metrics).seed(self.connector) {
            Ok(truth) => truth,
            Err(e) => {
                scope.fail(&e.to_string());
                return Err(e.into());
            }
        };
        scope.complete();

        let actual = truth.row_count() as u64;
        if actual != plan.rows {
            return Err(HarnessError::TruthMismatch {
                expected: plan.rows,
                actual,
            });
        }
        let buckets = truth.bucket_count().to_string();
        log_event_with_fields(
            Event::GroundTruthReady,
            &[("rows", rows.as_str()), ("buckets", buckets.as_str())],
        );
        Ok(truth)
    }

    fn split(&self, control: &mut dyn SqlConnection, layout: &LayoutConfig) -> HarnessResult<()> {
        let upper_id = i64::try_from(self.config.rows()).unwrap_or(i64::MAX);
        let sql = statements::split_table(
            &self.config.table,
            self.config.primary_key,
            (0, layout.lower_id2.as_str()),
            (upper_id, layout.upper_id2.as_str()),
            layout.regions,
        );
        control.execute(&sql, &[])?;
        self.metrics.increment_splits();

        let regions = layout.regions.to_string();
        log_event_with_fields(
            Event::SplitApplied,
            &[("layout", layout.name.as_str()), ("regions", regions.as_str())],
        );
        Ok(())
    }

    fn settle(&self, layout: &LayoutConfig) {
        if self.config.settle_delay_ms == 0 {
            return;
        }
        let delay = self.config.settle_delay_ms.to_string();
        log_event_with_fields(
            Event::SettleWait,
            &[("layout", layout.name.as_str()), ("delay_ms", delay.as_str())],
        );
        thread::sleep(Duration::from_millis(self.config.settle_delay_ms));
    }

    fn verify_layout(&self, layout: &LayoutConfig, state: &mut RunState) -> HarnessResult<()> {
        let regions = layout.regions.to_string();
        let scope = ObservationScope::with_fields(
            "VERIFY",
            &[("layout", layout.name.as_str()), ("regions", regions.as_str())],
        );
        let started = Instant::now();
        let mut executor = QueryExecutor::connect(
            self.connector,
            &self.config.table,
            self.config.session_alias.as_deref(),
            &self.metrics,
        )?;

        let mut verdicts = Vec::with_capacity(state.cases.len());
        let mut violations = Vec::new();
        for case in &state.cases {
            let rows = executor.run(case)?;
            let verdict = verify(case, &rows, &state.truth);
            match &verdict.violation {
                None => self.metrics.increment_cases_passed(),
                Some(violation) => {
                    self.metrics.increment_cases_failed();
                    let expected = violation.expected_count.to_string();
                    let actual = violation.actual_count.to_string();
                    let described = case.to_string();
                    log_event_with_fields(
                        Event::CaseViolation,
                        &[
                            ("layout", layout.name.as_str()),
                            ("case", described.as_str()),
                            ("kind", violation.kind.as_str()),
                            ("expected", expected.as_str()),
                            ("actual", actual.as_str()),
                            ("detail", violation.detail.as_str()),
                        ],
                    );
                    violations.push(violation.clone());
                }
            }
            let failed = !verdict.passed();
            verdicts.push(verdict);
            if failed && self.config.failure_policy == FailurePolicy::FailFast {
                state.halted = true;
                break;
            }
        }

        let cases_run = verdicts.len();
        let report = PhaseReport {
            layout: layout.name.clone(),
            regions: layout.regions,
            cases_run,
            cases_passed: cases_run - violations.len(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            violations,
        };
        let run = cases_run.to_string();
        let failed = report.violations.len().to_string();
        scope.complete_with_fields(&[("cases_run", run.as_str()), ("violations", failed.as_str())]);

        state.phases.push(report);
        state.verdicts.push((layout.name.clone(), verdicts));
        Ok(())
    }

    fn compare(&self, state: &mut RunState) {
        state.divergences = compare_layouts(&state.cases, &state.verdicts);
        for divergence in &state.divergences {
            self.metrics.increment_divergences();
            let baseline = divergence.baseline_count.to_string();
            let count = divergence.count.to_string();
            log_event_with_fields(
                Event::LayoutDivergence,
                &[
                    ("case", divergence.case.id.as_str()),
                    ("baseline", divergence.baseline.as_str()),
                    ("layout", divergence.layout.as_str()),
                    ("baseline_count", baseline.as_str()),
                    ("count", count.as_str()),
                ],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use crate::engine::{FaultMode, MemoryEngine};
    use crate::sql::statements::PrimaryKey;

    fn small_config() -> HarnessConfig {
        HarnessConfig {
            backend: BackendConfig::Memory {
                fault: FaultMode::None,
            },
            key_cardinality: 64,
            rows: Some(2_000),
            batch_size: 100,
            workers: 4,
            seed: Some(11),
            case_rounds: 3,
            settle_delay_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_cases_are_seed_deterministic() {
        let config = small_config();
        assert_eq!(synthesize_cases(&config, 5), synthesize_cases(&config, 5));
        assert_eq!(synthesize_cases(&config, 5).len(), 27);
    }

    #[test]
    fn test_clean_engine_passes_both_layouts() {
        let engine = MemoryEngine::new(FaultMode::None).unwrap();
        let orchestrator = Orchestrator::new(small_config(), &engine);
        let report = orchestrator.run().unwrap();

        assert!(report.passed, "{:?}", report.violations().collect::<Vec<_>>());
        assert_eq!(report.seed, 11);
        assert_eq!(report.phases.len(), 2);
        assert!(report.phases.iter().all(|p| p.cases_run == 27));
        assert!(report.divergences.is_empty());
        assert_eq!(report.metrics.rows_written, 2_000);
        assert_eq!(report.metrics.splits_applied, 2);
        assert_eq!(report.metrics.cases_passed, 54);
        assert_eq!(engine.row_count(&report_table()).unwrap(), Some(2_000));
        // coarse and fine boundaries share the multiples of 200
        assert_eq!(engine.region_count(&report_table()).unwrap(), Some(202));
    }

    fn report_table() -> String {
        HarnessConfig::default().table
    }

    #[test]
    fn test_single_column_key_run() {
        let engine = MemoryEngine::new(FaultMode::None).unwrap();
        let config = HarnessConfig {
            primary_key: PrimaryKey::Single,
            ..small_config()
        };
        let report = Orchestrator::new(config, &engine).run().unwrap();

        assert!(report.passed, "{:?}", report.violations().collect::<Vec<_>>());
        assert_eq!(report.primary_key, PrimaryKey::Single);
        let table = report_table();
        assert_eq!(engine.primary_key(&table).unwrap(), Some(PrimaryKey::Single));
        // Bounds carry no id2, so the fine layout contains every coarse boundary
        assert_eq!(engine.region_count(&table).unwrap(), Some(201));
    }

    #[test]
    fn test_fail_fast_stops_at_first_violation() {
        let engine = MemoryEngine::new(FaultMode::DropFirstRegion).unwrap();
        let orchestrator = Orchestrator::new(small_config(), &engine);
        let report = orchestrator.run().unwrap();

        assert!(!report.passed);
        assert_eq!(report.phases.len(), 1);
        assert_eq!(report.phases[0].violations.len(), 1);
        assert_eq!(report.metrics.cases_failed, 1);
    }

    #[test]
    fn test_infrastructure_failure_is_an_error() {
        let engine = MemoryEngine::new(FaultMode::None).unwrap();
        let config = HarnessConfig {
            reset_schema: false,
            ..small_config()
        };
        let err = Orchestrator::new(config, &engine).run().unwrap_err();
        assert!(matches!(err, HarnessError::Generate(_)));
    }

    struct Unreachable;

    impl Connector for Unreachable {
        fn connect(&self) -> crate::sql::SqlResult<Box<dyn SqlConnection>> {
            Err(crate::sql::SqlError::Connection("connection refused".into()))
        }

        fn name(&self) -> &str {
            "unreachable"
        }
    }

    #[test]
    fn test_control_session_failure_is_an_error() {
        let orchestrator = Orchestrator::new(small_config(), &Unreachable);
        let err = orchestrator.run().unwrap_err();
        assert!(matches!(err, HarnessError::Sql(_)));
        assert_eq!(err.code(), "PUSHDOWN_SQL_CONNECTION");
        assert_eq!(orchestrator.metrics().snapshot().statements_executed, 0);
    }
}
