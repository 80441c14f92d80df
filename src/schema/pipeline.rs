//! The sequential schema-change pipeline.
//!
//! One run walks a fixed transition table; the hooks are the actions on
//! the edges:
//!
//! ```text
//! Open ──read──▶ Read ──err──▶ on_read_fail (hook error discarded) ──▶ run fails
//!                 │
//!                 ├─empty──▶ on_read_success ──▶ done (no-op, executor never opened)
//!                 │
//!                 └─sqls───▶ on_read_success ──▶ ExecutorOpen ──▶ Validate
//!                              Validate ──err──▶ on_validation_fail (hook error
//!                              │                 propagates) ──▶ run fails
//!                              └─ok──▶ on_validation_success ──▶ Execute
//!                                        Execute ──result──▶ on_executor_complete
//!                                        └─▶ failed result ⇒ SchemaChangeFailed
//! ```
//!
//! Read and validation failures are "could not attempt": they abort
//! immediately, before the executor ever runs. Execution failures are
//! "attempted, partially failed": they travel inside the result, reach the
//! completion hook in full, and only then become the run's error.
//!
//! The read edge discards the failure hook's own error while the
//! validation edge propagates it. That asymmetry is deliberate: on the
//! read edge the interesting error is the read failure itself, and the
//! hook is best-effort status reporting.

use crate::error::OpsError;
use crate::schema::{Controller, Executor, SchemaChangeResult};
use tracing::{info, warn};

/// Pipeline stages in execution order. Failures and the empty-read no-op
/// are outcomes on the edges between these states, not states themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Open,
    Read,
    ExecutorOpen,
    Validate,
    Execute,
    Complete,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Open => write!(f, "open"),
            PipelineState::Read => write!(f, "read"),
            PipelineState::ExecutorOpen => write!(f, "executor-open"),
            PipelineState::Validate => write!(f, "validate"),
            PipelineState::Execute => write!(f, "execute"),
            PipelineState::Complete => write!(f, "complete"),
        }
    }
}

fn enter(state: PipelineState) {
    info!(state = %state, "schema change pipeline");
}

/// Runs one schema change end to end: a single sequential, non-retrying
/// pass. Returns the execution result on success (empty for a no-op run);
/// the terminal error for a failed run embeds the serialized result.
pub async fn run_schema_changes(
    controller: &mut dyn Controller,
    executor: &mut dyn Executor,
) -> Result<SchemaChangeResult, OpsError> {
    enter(PipelineState::Open);
    controller.open().await?;
    let outcome = read_stage(controller, executor).await;
    controller.close().await;
    match &outcome {
        Ok(_) => enter(PipelineState::Complete),
        Err(err) => warn!(error = %err, "schema change run failed"),
    }
    outcome
}

async fn read_stage(
    controller: &mut dyn Controller,
    executor: &mut dyn Executor,
) -> Result<SchemaChangeResult, OpsError> {
    enter(PipelineState::Read);
    let sqls = match controller.read().await {
        Ok(sqls) => sqls,
        Err(err) => {
            // Hook error intentionally discarded on this edge; the read
            // failure is the run's outcome.
            if let Err(hook_err) = controller.on_read_fail(&err).await {
                warn!(error = %hook_err, "read-failure hook failed");
            }
            return Err(err);
        }
    };
    controller.on_read_success().await?;
    if sqls.is_empty() {
        info!("no pending schema changes");
        return Ok(SchemaChangeResult::empty());
    }

    enter(PipelineState::ExecutorOpen);
    executor.open(controller.keyspace()).await?;
    let outcome = validate_and_execute(controller, executor, &sqls).await;
    executor.close().await;
    outcome
}

async fn validate_and_execute(
    controller: &mut dyn Controller,
    executor: &mut dyn Executor,
    sqls: &[String],
) -> Result<SchemaChangeResult, OpsError> {
    enter(PipelineState::Validate);
    if let Err(err) = executor.validate(sqls).await {
        // Unlike the read edge, a failing hook here takes precedence over
        // the validation error.
        controller.on_validation_fail(&err).await?;
        return Err(err);
    }
    controller.on_validation_success().await?;

    enter(PipelineState::Execute);
    let result = executor.execute(sqls).await;
    controller.on_executor_complete(&result).await?;
    if result.is_failed() {
        let result_json = result.to_json_pretty()?;
        return Err(OpsError::SchemaChangeFailed { result_json });
    }
    Ok(result)
}
