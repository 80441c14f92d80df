//! Schema-change orchestration.
//!
//! A [`Controller`] sources pending SQL from an external change-tracking
//! system and receives lifecycle callbacks; an [`Executor`] applies SQL
//! against the distributed query-routing layer, one keyspace at a time,
//! and reports per-shard outcomes. [`pipeline::run_schema_changes`] walks
//! the two through a fixed, non-retrying sequence.

pub mod pipeline;

use async_trait::async_trait;
use crate::config::OpsConfig;
use crate::error::{OpsError, ResourceType};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

/// One shard that failed to apply a statement, with the failure text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardError {
    pub shard: String,
    pub error: String,
}

/// One shard that applied every statement. `rows_affected` holds one count
/// per statement, in statement order. `position` is an opaque replication
/// marker callers use to wait for replica convergence; its format belongs
/// to the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardSuccess {
    pub shard: String,
    pub rows_affected: Vec<u64>,
    pub position: String,
}

/// Structured outcome of one execution pass.
///
/// Always produced in full, even under partial failure: executors let
/// every shard attempt every statement instead of stopping at the first
/// shard failure, so the completion hook observes both full success and
/// partial failure uniformly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaChangeResult {
    /// The statements of this run, in execution order.
    pub sqls: Vec<String>,
    /// Index of the statement the run progressed to.
    pub cur_sql_index: usize,
    pub failed_shards: Vec<ShardError>,
    pub successful_shards: Vec<ShardSuccess>,
    /// Whole-run executor failure, independent of per-shard outcomes.
    pub executor_err: Option<String>,
    pub elapsed: Duration,
}

impl SchemaChangeResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Any failed shard or whole-run executor error marks the run failed,
    /// even when other shards succeeded. No silent partial success.
    pub fn is_failed(&self) -> bool {
        self.executor_err.is_some() || !self.failed_shards.is_empty()
    }

    /// Serialized snapshot embedded in the terminal run error, so
    /// operators see exactly which statements and shards failed without
    /// re-querying.
    pub fn to_json_pretty(&self) -> Result<String, OpsError> {
        serde_json::to_string_pretty(self).map_err(|e| OpsError::Backend(e.to_string()))
    }
}

/// Supplies pending schema changes and observes the run lifecycle.
///
/// `open` is scoped: the pipeline guarantees `close` on every exit path.
/// Hook errors from `on_read_fail` are logged and discarded (the read
/// failure itself is what the run returns); hook errors from every other
/// callback abort the run.
#[async_trait]
pub trait Controller: Send + Sync {
    async fn open(&mut self) -> Result<(), OpsError>;

    /// Produces the ordered pending statements. Empty means nothing to do;
    /// the run ends as a successful no-op without opening an executor.
    async fn read(&mut self) -> Result<Vec<String>, OpsError>;

    async fn close(&mut self);

    /// Keyspace the changes target, handed to [`Executor::open`].
    fn keyspace(&self) -> &str;

    async fn on_read_success(&mut self) -> Result<(), OpsError>;

    async fn on_read_fail(&mut self, err: &OpsError) -> Result<(), OpsError>;

    async fn on_validation_success(&mut self) -> Result<(), OpsError>;

    async fn on_validation_fail(&mut self, err: &OpsError) -> Result<(), OpsError>;

    /// Observes the full execution result, success or partial failure.
    async fn on_executor_complete(
        &mut self,
        result: &SchemaChangeResult,
    ) -> Result<(), OpsError>;
}

/// Applies schema changes against the distributed system.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn open(&mut self, keyspace: &str) -> Result<(), OpsError>;

    /// Checks the statements without applying them.
    async fn validate(&mut self, sqls: &[String]) -> Result<(), OpsError>;

    /// Applies the statements to every shard. Always returns a structured
    /// result, never a bare failure; shard failures and whole-run errors
    /// travel inside it.
    async fn execute(&mut self, sqls: &[String]) -> SchemaChangeResult;

    async fn close(&mut self);
}

/// Builds a controller from config. Factories capture their own source
/// parameters (file path, queue address, ticket endpoint).
pub type ControllerFactory =
    Box<dyn Fn(&OpsConfig) -> Result<Box<dyn Controller>, OpsError> + Send + Sync>;

/// Name-keyed controller factories, write-once per name like the backup
/// storage registry.
#[derive(Default)]
pub struct ControllerRegistry {
    factories: RwLock<HashMap<String, ControllerFactory>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        name: impl Into<String>,
        factory: ControllerFactory,
    ) -> Result<(), OpsError> {
        let name = name.into();
        let mut factories = self.factories.write();
        if factories.contains_key(&name) {
            return Err(OpsError::AlreadyExists {
                resource_type: ResourceType::Controller,
                resource_id: name,
            });
        }
        info!(controller = %name, "registered schema change controller");
        factories.insert(name, factory);
        Ok(())
    }

    /// Instantiates the controller selected by
    /// [`OpsConfig::schema_change_controller`].
    pub fn resolve(&self, config: &OpsConfig) -> Result<Box<dyn Controller>, OpsError> {
        let selected = &config.schema_change_controller;
        if selected.is_empty() {
            return Err(OpsError::InvalidConfig {
                message: "no schema change controller configured".into(),
            });
        }
        let factories = self.factories.read();
        let factory = factories.get(selected).ok_or_else(|| {
            let mut names = factories.keys().cloned().collect::<Vec<_>>();
            names.sort();
            OpsError::InvalidConfig {
                message: format!(
                    "unknown schema change controller '{selected}', registered: [{}]",
                    names.join(", ")
                ),
            }
        })?;
        factory(config)
    }
}
