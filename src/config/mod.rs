//! Harness configuration
//!
//! Loaded once from JSON, validated, then passed by value into the
//! orchestrator. Nothing reads configuration from global state.

mod errors;
mod harness;

pub use errors::{ConfigError, ConfigErrorCode, ConfigResult};
pub use harness::{BackendConfig, FailurePolicy, HarnessConfig, LayoutConfig};
