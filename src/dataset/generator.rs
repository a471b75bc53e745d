//! Parallel dataset generator
//!
//! Rows are built, recorded in a worker-local ground-truth shard, and only
//! then flushed to the system under test in fixed-size batches. Shards are
//! merged after the join barrier.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use uuid::Builder;

use super::errors::{GenerateError, GenerateErrorCode, GenerateResult};
use super::row::{random_id2, Row};
use crate::index::GroundTruthIndex;
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::sql::{statements, Connector, SqlConnection, SqlValue};

const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

/// How `k` values are assigned to rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyCoverage {
    /// Every row draws `k` uniformly from `[1, K]`; buckets may be empty
    Uniform,
    /// Rows `1..=K` take a random permutation of `[1, K]`, the rest are
    /// uniform. Falls back to uniform when there are fewer rows than keys.
    #[default]
    Complete,
}

/// Everything the generator needs to know
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPlan {
    pub table: String,
    /// `N`
    pub rows: u64,
    /// `K`
    pub key_cardinality: i64,
    pub batch_size: usize,
    pub workers: usize,
    pub id2_len: usize,
    pub coverage: KeyCoverage,
    pub seed: u64,
}

impl DatasetPlan {
    fn validate(&self) -> GenerateResult<()> {
        if self.rows == 0 {
            return Err(GenerateError::invalid_plan("rows must be > 0"));
        }
        if self.key_cardinality < 1 {
            return Err(GenerateError::invalid_plan("key_cardinality must be >= 1"));
        }
        if self.batch_size == 0 {
            return Err(GenerateError::invalid_plan("batch_size must be > 0"));
        }
        if self.workers == 0 {
            return Err(GenerateError::invalid_plan("workers must be > 0"));
        }
        if i64::try_from(self.rows).is_err() {
            return Err(GenerateError::invalid_plan("rows exceeds the id domain"));
        }
        Ok(())
    }
}

/// Splits ids `1..=rows` into at most `workers` contiguous, disjoint,
/// non-empty slices that together cover every id exactly once.
pub fn worker_ranges(rows: u64, workers: usize) -> Vec<RangeInclusive<i64>> {
    let rows = rows as i64;
    let workers = (workers.max(1) as i64).min(rows.max(1));
    let base = rows / workers;
    let extra = rows % workers;

    let mut ranges = Vec::with_capacity(workers as usize);
    let mut start = 1;
    for w in 0..workers {
        let len = base + i64::from(w < extra);
        if len == 0 {
            continue;
        }
        ranges.push(start..=start + len - 1);
        start += len;
    }
    ranges
}

/// Seeds the system under test and builds the matching ground truth
pub struct DatasetGenerator<'a> {
    plan: &'a DatasetPlan,
    metrics: &'a MetricsRegistry,
}

impl<'a> DatasetGenerator<'a> {
    pub fn new(plan: &'a DatasetPlan, metrics: &'a MetricsRegistry) -> Self {
        Self { plan, metrics }
    }

    /// Writes all rows and returns the ground truth describing them.
    ///
    /// Fails fast: the first failing worker raises a shared abort flag,
    /// the others stop before their next flush, and the call returns the
    /// failing worker's error.
    pub fn seed(&self, connector: &dyn Connector) -> GenerateResult<GroundTruthIndex> {
        self.plan.validate()?;

        let permutation = self.coverage_permutation();
        let ranges = worker_ranges(self.plan.rows, self.plan.workers);
        let progress: Vec<AtomicU64> = ranges.iter().map(|_| AtomicU64::new(0)).collect();
        let abort = AtomicBool::new(false);

        let results: Vec<GenerateResult<GroundTruthIndex>> = thread::scope(|scope| {
            let handles: Vec<_> = ranges
                .iter()
                .cloned()
                .enumerate()
                .map(|(worker, ids)| {
                    let permutation = &permutation;
                    let counter = &progress[worker];
                    let abort = &abort;
                    scope.spawn(move || {
                        let result =
                            self.run_worker(worker, ids, connector, permutation, counter, abort);
                        if result.is_err() {
                            abort.store(true, Ordering::Release);
                        }
                        result
                    })
                })
                .collect();

            let mut reported = 0;
            while !handles.iter().all(|h| h.is_finished()) {
                thread::sleep(PROGRESS_INTERVAL);
                let written: u64 = progress.iter().map(|p| p.load(Ordering::Relaxed)).sum();
                if written != reported {
                    reported = written;
                    self.log_progress(written);
                }
            }

            handles
                .into_iter()
                .enumerate()
                .map(|(worker, h)| {
                    h.join()
                        .unwrap_or_else(|_| Err(GenerateError::worker_panicked(worker)))
                })
                .collect()
        });

        // Report the worker that failed, not one that stopped because of it
        let mut shards = Vec::with_capacity(results.len());
        let mut aborted = None;
        for result in results {
            match result {
                Ok(shard) => shards.push(shard),
                Err(e) if e.code() == GenerateErrorCode::Aborted => {
                    aborted.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }
        if let Some(e) = aborted {
            return Err(e);
        }

        let mut truth = GroundTruthIndex::new();
        for shard in shards {
            truth.merge(shard)?;
        }
        Ok(truth)
    }

    fn log_progress(&self, written: u64) {
        let percent = written as f64 / self.plan.rows as f64 * 100.0;
        let rows_written = written.to_string();
        let progress = format!("{:.0}%", percent);
        log_event_with_fields(
            Event::SeedProgress,
            &[
                ("rows_written", rows_written.as_str()),
                ("progress", progress.as_str()),
            ],
        );
    }

    fn coverage_permutation(&self) -> Vec<i64> {
        let plan = self.plan;
        match plan.coverage {
            KeyCoverage::Complete if plan.rows >= plan.key_cardinality as u64 => {
                let mut rng = StdRng::seed_from_u64(plan.seed);
                let mut keys: Vec<i64> = (1..=plan.key_cardinality).collect();
                keys.shuffle(&mut rng);
                keys
            }
            _ => Vec::new(),
        }
    }

    fn worker_rng(&self, worker: usize) -> StdRng {
        let salt = (worker as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        StdRng::seed_from_u64(self.plan.seed ^ salt)
    }

    fn build_row(&self, id: i64, rng: &mut StdRng, permutation: &[i64]) -> Row {
        let id2 = random_id2(rng, self.plan.id2_len);
        let k = match usize::try_from(id - 1).ok().and_then(|i| permutation.get(i)) {
            Some(k) => *k,
            None => rng.gen_range(1..=self.plan.key_cardinality),
        };
        Row {
            id,
            id2,
            k,
            uk: rng.gen_range(0..i64::MAX),
            v1: rng.gen_range(0..i64::MAX),
            v2: Builder::from_random_bytes(rng.gen()).into_uuid().to_string(),
        }
    }

    fn run_worker(
        &self,
        worker: usize,
        ids: RangeInclusive<i64>,
        connector: &dyn Connector,
        permutation: &[i64],
        progress: &AtomicU64,
        abort: &AtomicBool,
    ) -> GenerateResult<GroundTruthIndex> {
        let mut conn = connector
            .connect()
            .map_err(|e| GenerateError::write_failed(worker, e))?;
        let mut rng = self.worker_rng(worker);
        let mut shard = GroundTruthIndex::new();
        let mut args: Vec<SqlValue> = Vec::with_capacity(self.plan.batch_size * 6);
        let mut pending = 0;

        for id in ids {
            let row = self.build_row(id, &mut rng, permutation);
            shard.insert(row.key(), row.k)?;
            row.push_args(&mut args);
            pending += 1;

            if pending == self.plan.batch_size {
                self.flush(worker, conn.as_mut(), &mut args, pending, progress, abort)?;
                pending = 0;
            }
        }
        if pending > 0 {
            self.flush(worker, conn.as_mut(), &mut args, pending, progress, abort)?;
        }

        Ok(shard)
    }

    fn flush(
        &self,
        worker: usize,
        conn: &mut dyn SqlConnection,
        args: &mut Vec<SqlValue>,
        rows: usize,
        progress: &AtomicU64,
        abort: &AtomicBool,
    ) -> GenerateResult<()> {
        if abort.load(Ordering::Acquire) {
            return Err(GenerateError::aborted(worker));
        }
        let statement = statements::insert_batch(&self.plan.table, rows);
        conn.execute(&statement, &args[..])
            .map_err(|e| GenerateError::write_failed(worker, e))?;
        args.clear();

        self.metrics.add_rows_written(rows as u64);
        self.metrics.increment_batches_written();
        progress.fetch_add(rows as u64, Ordering::Relaxed);
        Ok(())
    }
}
