//! Harness configuration file
//!
//! A JSON document; every field is optional and `{}` is a valid config.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigResult};
use crate::dataset::{DatasetPlan, KeyCoverage};
use crate::engine::FaultMode;
use crate::sql::statements::PrimaryKey;

/// Where the system under test lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// In-process reference engine
    Memory {
        #[serde(default)]
        fault: FaultMode,
    },
    /// MySQL-protocol server, e.g. `mysql://root@127.0.0.1:4000/test`
    Mysql { url: String },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Memory {
            fault: FaultMode::None,
        }
    }
}

/// What to do after the first failing case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run at the first violation
    #[default]
    FailFast,
    /// Verify every case and report all violations
    Accumulate,
}

/// One physical layout: `SPLIT TABLE .. BETWEEN (0, lower_id2) AND (N, upper_id2) REGIONS n`.
/// The `id2` bounds are ignored under a single-column primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub name: String,
    pub regions: u32,
    #[serde(default = "default_lower_id2")]
    pub lower_id2: String,
    #[serde(default = "default_upper_id2")]
    pub upper_id2: String,
}

impl LayoutConfig {
    pub fn new(name: &str, regions: u32, lower_id2: &str, upper_id2: &str) -> Self {
        Self {
            name: name.to_string(),
            regions,
            lower_id2: lower_id2.to_string(),
            upper_id2: upper_id2.to_string(),
        }
    }
}

fn default_lower_id2() -> String {
    "a".to_string()
}

fn default_upper_id2() -> String {
    "Z".to_string()
}

fn default_table() -> String {
    "test_index_lookup_push_down".to_string()
}

fn default_key_cardinality() -> i64 {
    1024
}

fn default_fanout() -> u64 {
    256
}

fn default_batch_size() -> usize {
    256
}

fn default_workers() -> usize {
    8
}

fn default_case_rounds() -> usize {
    10
}

fn default_id2_len() -> usize {
    16
}

fn default_settle_delay_ms() -> u64 {
    2000
}

fn default_layouts() -> Vec<LayoutConfig> {
    vec![
        LayoutConfig::new("coarse", 10, "a", "Z"),
        LayoutConfig::new("fine", 200, "A", "z"),
    ]
}

fn default_session_alias() -> Option<String> {
    Some("test".to_string())
}

fn default_reset_schema() -> bool {
    true
}

/// Everything a run needs, passed explicitly to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default = "default_table")]
    pub table: String,

    /// `K`: distinct values of the indexed column
    #[serde(default = "default_key_cardinality")]
    pub key_cardinality: i64,

    /// `F`: average rows per key
    #[serde(default = "default_fanout")]
    pub fanout: u64,

    /// Overrides `K * F` when set
    #[serde(default)]
    pub rows: Option<u64>,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Master seed; drawn at random when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Each round synthesizes nine cases
    #[serde(default = "default_case_rounds")]
    pub case_rounds: usize,

    #[serde(default = "default_id2_len")]
    pub id2_len: usize,

    /// Pause after each split before querying
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    #[serde(default = "default_layouts")]
    pub layouts: Vec<LayoutConfig>,

    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub key_coverage: KeyCoverage,

    /// Clustered key: `(id, id2)` or `id` alone
    #[serde(default)]
    pub primary_key: PrimaryKey,

    #[serde(default = "default_session_alias")]
    pub session_alias: Option<String>,

    /// Drop and recreate the table before seeding
    #[serde(default = "default_reset_schema")]
    pub reset_schema: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            table: default_table(),
            key_cardinality: default_key_cardinality(),
            fanout: default_fanout(),
            rows: None,
            batch_size: default_batch_size(),
            workers: default_workers(),
            seed: None,
            case_rounds: default_case_rounds(),
            id2_len: default_id2_len(),
            settle_delay_ms: default_settle_delay_ms(),
            layouts: default_layouts(),
            failure_policy: FailurePolicy::default(),
            key_coverage: KeyCoverage::default(),
            primary_key: PrimaryKey::default(),
            session_alias: default_session_alias(),
            reset_schema: default_reset_schema(),
        }
    }
}

impl HarnessConfig {
    /// Loads and validates a config file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::read(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: HarnessConfig = serde_json::from_str(content)
            .map_err(|e| ConfigError::parse(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// `N`: the explicit row count, or `K * F`
    pub fn rows(&self) -> u64 {
        self.rows
            .unwrap_or_else(|| (self.key_cardinality.max(0) as u64).saturating_mul(self.fanout))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.table.is_empty()
            || !self
                .table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(ConfigError::invalid(format!(
                "table must be a plain identifier, got {:?}",
                self.table
            )));
        }
        if self.key_cardinality < 1 {
            return Err(ConfigError::invalid("key_cardinality must be >= 1"));
        }
        if self.rows() == 0 {
            return Err(ConfigError::invalid("rows must be > 0"));
        }
        if i64::try_from(self.rows()).is_err() {
            return Err(ConfigError::invalid("rows exceeds the id domain"));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid("batch_size must be > 0"));
        }
        if self.workers == 0 {
            return Err(ConfigError::invalid("workers must be > 0"));
        }
        if self.case_rounds == 0 {
            return Err(ConfigError::invalid("case_rounds must be > 0"));
        }
        if self.id2_len == 0 {
            return Err(ConfigError::invalid("id2_len must be > 0"));
        }
        if self.layouts.is_empty() {
            return Err(ConfigError::invalid("at least one layout is required"));
        }
        for layout in &self.layouts {
            if layout.regions == 0 {
                return Err(ConfigError::invalid(format!(
                    "layout {} must have at least one region",
                    layout.name
                )));
            }
            if layout.lower_id2.contains('\'') || layout.upper_id2.contains('\'') {
                return Err(ConfigError::invalid(format!(
                    "layout {} bounds may not contain quotes",
                    layout.name
                )));
            }
        }
        if let BackendConfig::Mysql { url } = &self.backend {
            if url.is_empty() {
                return Err(ConfigError::invalid("mysql backend needs a url"));
            }
        }
        Ok(())
    }

    /// Generator plan for this config under `seed`
    pub fn dataset_plan(&self, seed: u64) -> DatasetPlan {
        DatasetPlan {
            table: self.table.clone(),
            rows: self.rows(),
            key_cardinality: self.key_cardinality,
            batch_size: self.batch_size,
            workers: self.workers,
            id2_len: self.id2_len,
            coverage: self.key_coverage,
            seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = HarnessConfig::default();
        config.validate().unwrap();
        assert_eq!(config.rows(), 1024 * 256);
        assert_eq!(config.layouts.len(), 2);
        assert_eq!(config.layouts[1].regions, 200);
        assert_eq!(config.session_alias.as_deref(), Some("test"));
    }

    #[test]
    fn test_empty_document_matches_default() {
        assert_eq!(HarnessConfig::from_json("{}").unwrap(), HarnessConfig::default());
    }

    #[test]
    fn test_backend_tagging() {
        let config = HarnessConfig::from_json(
            r#"{"backend": {"kind": "memory", "fault": "unmerged_sort"}, "rows": 500}"#,
        )
        .unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Memory {
                fault: FaultMode::UnmergedSort
            }
        );
        assert_eq!(config.rows(), 500);

        let config = HarnessConfig::from_json(
            r#"{"backend": {"kind": "mysql", "url": "mysql://root@127.0.0.1:4000/test"}}"#,
        )
        .unwrap();
        assert!(matches!(config.backend, BackendConfig::Mysql { .. }));
    }

    #[test]
    fn test_primary_key_shape() {
        assert_eq!(HarnessConfig::default().primary_key, PrimaryKey::Composite);
        let config = HarnessConfig::from_json(r#"{"primary_key": "single"}"#).unwrap();
        assert_eq!(config.primary_key, PrimaryKey::Single);
        let err = HarnessConfig::from_json(r#"{"primary_key": "triple"}"#).unwrap_err();
        assert_eq!(err.code(), super::super::ConfigErrorCode::Parse);
    }

    #[test]
    fn test_layout_bounds_default() {
        let config =
            HarnessConfig::from_json(r#"{"layouts": [{"name": "one", "regions": 3}]}"#).unwrap();
        assert_eq!(config.layouts[0], LayoutConfig::new("one", 3, "a", "Z"));
    }

    #[test]
    fn test_rejects_unusable_values() {
        for doc in [
            r#"{"rows": 0}"#,
            r#"{"key_cardinality": 0}"#,
            r#"{"batch_size": 0}"#,
            r#"{"workers": 0}"#,
            r#"{"case_rounds": 0}"#,
            r#"{"layouts": []}"#,
            r#"{"layouts": [{"name": "x", "regions": 0}]}"#,
            r#"{"table": "t; drop"}"#,
        ] {
            let err = HarnessConfig::from_json(doc).unwrap_err();
            assert_eq!(err.code(), super::super::ConfigErrorCode::Invalid, "{}", doc);
        }
    }

    #[test]
    fn test_malformed_json() {
        let err = HarnessConfig::from_json("{").unwrap_err();
        assert!(err.to_string().starts_with("PUSHDOWN_CONFIG_PARSE"));
    }

    #[test]
    fn test_plan_carries_seed() {
        let config = HarnessConfig {
            rows: Some(10),
            ..Default::default()
        };
        let plan = config.dataset_plan(7);
        assert_eq!(plan.seed, 7);
        assert_eq!(plan.rows, 10);
        assert_eq!(plan.table, config.table);
    }
}
