//! End-to-end Runs Against the In-process Engine
//!
//! Tests for:
//! - A correct engine passes every case under both layouts
//! - Every injected pushdown defect is caught
//! - The concrete equality / membership / range scenario
//! - Config files drive the same run as in-code configs

use std::io::Write;

use pushdown_verify::cases::{Case, Pagination, Predicate, SortOrder};
use pushdown_verify::config::{BackendConfig, FailurePolicy, HarnessConfig};
use pushdown_verify::dataset::{DatasetGenerator, DatasetPlan, KeyCoverage};
use pushdown_verify::engine::{FaultMode, MemoryEngine};
use pushdown_verify::executor::QueryExecutor;
use pushdown_verify::observability::MetricsRegistry;
use pushdown_verify::orchestrator::{Orchestrator, RunReport};
use pushdown_verify::sql::statements::PrimaryKey;
use pushdown_verify::sql::{statements, Connector};
use pushdown_verify::verifier::{verify, ViolationKind};

// =============================================================================
// Helper Functions
// =============================================================================

/// Dense buckets (~250 rows per k) so every predicate spans many regions.
fn dense_config(fault: FaultMode, policy: FailurePolicy) -> HarnessConfig {
    HarnessConfig {
        backend: BackendConfig::Memory { fault },
        key_cardinality: 16,
        rows: Some(4_000),
        batch_size: 128,
        workers: 4,
        seed: Some(20240611),
        case_rounds: 12,
        settle_delay_ms: 0,
        failure_policy: policy,
        ..Default::default()
    }
}

fn run_with_fault(fault: FaultMode) -> RunReport {
    let config = dense_config(fault, FailurePolicy::Accumulate);
    let engine = MemoryEngine::new(fault).unwrap();
    Orchestrator::new(config, &engine).run().unwrap()
}

fn kinds(report: &RunReport) -> Vec<ViolationKind> {
    report.violations().map(|v| v.kind).collect()
}

// =============================================================================
// Full Runs
// =============================================================================

/// A correct engine passes all cases under coarse and fine splits.
#[test]
fn test_correct_engine_passes() {
    let report = run_with_fault(FaultMode::None);

    assert!(report.passed, "{:#?}", kinds(&report));
    assert_eq!(report.phases.len(), 2);
    assert_eq!(report.phases[0].layout, "coarse");
    assert_eq!(report.phases[1].layout, "fine");
    for phase in &report.phases {
        assert_eq!(phase.cases_run, report.cases);
        assert_eq!(phase.cases_passed, report.cases);
    }
    assert!(report.divergences.is_empty());
    assert_eq!(report.metrics.rows_written, 4_000);
    assert_eq!(report.metrics.queries_executed as usize, 2 * report.cases);
}

/// Ascending cases are answered sorted, so only unsorted engines fail them.
#[test]
fn test_ascending_cases_pass_on_correct_engine() {
    let report = run_with_fault(FaultMode::None);
    let config = dense_config(FaultMode::None, FailurePolicy::Accumulate);
    let cases = Orchestrator::new(config, &MemoryEngine::new(FaultMode::None).unwrap()).cases();
    assert!(cases.iter().any(|c| c.sort == Some(SortOrder::Ascending)));
    assert!(!kinds(&report).contains(&ViolationKind::OrderBroken));
}

/// The single-column primary key goes through the same checks.
#[test]
fn test_single_column_key() {
    for (fault, clean) in [(FaultMode::None, true), (FaultMode::UnmergedSort, false)] {
        let config = HarnessConfig {
            primary_key: PrimaryKey::Single,
            ..dense_config(fault, FailurePolicy::Accumulate)
        };
        let engine = MemoryEngine::new(fault).unwrap();
        let report = Orchestrator::new(config, &engine).run().unwrap();
        assert_eq!(report.passed, clean, "{:?}: {:#?}", fault, kinds(&report));
        assert_eq!(report.primary_key, PrimaryKey::Single);
    }
}

/// Same seed, same report content.
#[test]
fn test_runs_are_reproducible() {
    let a = run_with_fault(FaultMode::None);
    let b = run_with_fault(FaultMode::None);
    assert_eq!(a.seed, b.seed);
    assert_eq!(a.metrics.rows_returned, b.metrics.rows_returned);
}

/// Rows emitted twice at region boundaries are reported as duplicates.
#[test]
fn test_detects_duplicate_region_boundary() {
    let report = run_with_fault(FaultMode::DuplicateRegionBoundary);
    assert!(!report.passed);
    assert!(kinds(&report).contains(&ViolationKind::Duplicate));
}

/// Lost regions show up as a count mismatch, not as unsound rows.
#[test]
fn test_detects_dropped_region() {
    let report = run_with_fault(FaultMode::DropFirstRegion);
    assert!(!report.passed);
    let kinds = kinds(&report);
    assert!(kinds.contains(&ViolationKind::CountMismatch));
    assert!(!kinds.contains(&ViolationKind::Unsound));
}

/// A limit that is only applied per region returns too many rows.
#[test]
fn test_detects_limit_per_region() {
    let report = run_with_fault(FaultMode::LimitPerRegion);
    assert!(!report.passed);
    let violations: Vec<_> = report.violations().collect();
    assert!(violations
        .iter()
        .any(|v| v.kind == ViolationKind::CountMismatch && v.actual_count > v.expected_count));
    // only paginated cases can be affected
    assert!(violations.iter().all(|v| v.case.pagination.is_paginated()));
}

/// Per-region sorting without a merge breaks monotonicity.
#[test]
fn test_detects_unmerged_sort() {
    let report = run_with_fault(FaultMode::UnmergedSort);
    assert!(!report.passed);
    let violations: Vec<_> = report.violations().collect();
    assert!(violations.iter().any(|v| v.kind == ViolationKind::OrderBroken));
    assert!(violations.iter().all(|v| v.case.sort.is_some()));
}

/// Fail-fast stops inside the first layout.
#[test]
fn test_fail_fast_reports_single_violation() {
    let fault = FaultMode::DropFirstRegion;
    let config = dense_config(fault, FailurePolicy::FailFast);
    let engine = MemoryEngine::new(fault).unwrap();
    let report = Orchestrator::new(config, &engine).run().unwrap();

    assert!(!report.passed);
    assert_eq!(report.phases.len(), 1);
    assert_eq!(report.violations().count(), 1);
    assert!(report.phases[0].cases_run <= report.cases);
    let violation = report.violations().next().unwrap();
    assert_eq!(violation.keys.len(), violation.actual_count);
}

// =============================================================================
// Concrete Scenario
// =============================================================================

/// 1024 buckets, ~256 rows scattered among them.
#[test]
fn test_concrete_scenario() {
    let engine = MemoryEngine::new(FaultMode::None).unwrap();
    let mut control = engine.connect().unwrap();
    control
        .execute(&statements::create_table("t", PrimaryKey::Composite), &[])
        .unwrap();

    let plan = DatasetPlan {
        table: "t".to_string(),
        rows: 256,
        key_cardinality: 1024,
        batch_size: 64,
        workers: 2,
        id2_len: 16,
        coverage: KeyCoverage::Uniform,
        seed: 8,
    };
    let metrics = MetricsRegistry::new();
    let truth = DatasetGenerator::new(&plan, &metrics).seed(&engine).unwrap();
    assert_eq!(truth.row_count(), 256);

    let split = statements::split_table("t", PrimaryKey::Composite, (0, "a"), (256, "Z"), 10);
    control.execute(&split, &[]).unwrap();

    // every bucket, empty ones included, matches the live table
    for k in 1..=1024 {
        let rows = control
            .query(&format!("select id from t where k = {}", k), &[])
            .unwrap();
        assert_eq!(rows.len(), truth.count_eq(k), "k = {}", k);
    }

    let mut executor = QueryExecutor::connect(&engine, "t", Some("test"), &metrics).unwrap();

    let equality = Case::new(0, Predicate::Equality(5), None, Pagination::None);
    let rows = executor.run(&equality).unwrap();
    assert_eq!(rows.len(), truth.lookup_eq(5).len());
    assert!(verify(&equality, &rows, &truth).passed());

    let membership = Case::new(
        1,
        Predicate::Membership(vec![3, 4, 7]),
        Some(SortOrder::Ascending),
        Pagination::None,
    );
    let rows = executor.run(&membership).unwrap();
    assert_eq!(
        rows.len(),
        truth.count_eq(3) + truth.count_eq(4) + truth.count_eq(7)
    );
    assert!(rows.windows(2).all(|w| w[0].k <= w[1].k));
    assert!(verify(&membership, &rows, &truth).passed());

    let range = Case::new(
        2,
        Predicate::Range { low: 100, high: 104 },
        None,
        Pagination::Limit(10),
    );
    let rows = executor.run(&range).unwrap();
    let matched: usize = (100..104).map(|k| truth.count_eq(k)).sum();
    assert_eq!(rows.len(), matched.min(10));
    assert!(rows.iter().all(|r| (100..104).contains(&r.k)));
    assert!(verify(&range, &rows, &truth).passed());
}

// =============================================================================
// Config Files
// =============================================================================

/// A JSON config file drives a complete run.
#[test]
fn test_run_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{
            "backend": {{"kind": "memory"}},
            "table": "from_file",
            "key_cardinality": 32,
            "rows": 1000,
            "workers": 3,
            "seed": 5,
            "case_rounds": 2,
            "settle_delay_ms": 0,
            "primary_key": "composite",
            "layouts": [
                {{"name": "few", "regions": 4}},
                {{"name": "many", "regions": 50, "lower_id2": "A", "upper_id2": "z"}}
            ]
        }}"#
    )
    .unwrap();

    let config = HarnessConfig::load(file.path()).unwrap();
    assert_eq!(config.failure_policy, FailurePolicy::FailFast);

    let engine = MemoryEngine::new(FaultMode::None).unwrap();
    let report = Orchestrator::new(config, &engine).run().unwrap();
    assert!(report.passed);
    assert_eq!(report.seed, 5);
    assert_eq!(report.cases, 18);
    assert_eq!(engine.row_count("from_file").unwrap(), Some(1000));
}

/// Missing files are read errors, not panics.
#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = HarnessConfig::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().starts_with("PUSHDOWN_CONFIG_READ"));
}
