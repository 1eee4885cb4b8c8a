//! Sequential step runner.
//!
//! Steps execute one at a time in [`execution_plan`] order. A failed step
//! keeps whatever it already added to Job State, and every step that depends
//! on it (directly or transitively) is skipped. Disabled steps are not
//! invoked, but their dependents still run.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use tracing::{Instrument, error, info, info_span, instrument, warn};

use cloudgraph_client::AzureClient;
use cloudgraph_shared::{CloudGraphError, IntegrationConfig, Result, StepRecord};

use crate::job_state::JobState;
use crate::registry::{Step, StepContext, dependency_closure, execution_plan};
use crate::steps::active_directory::{STEP_AD_ACCOUNT, is_directory_step};

/// How a single step ended.
#[derive(Debug, Clone, PartialEq)]
pub enum StepStatus {
    Success {
        entities: usize,
        relationships: usize,
        duration: Duration,
    },
    Failed {
        error: String,
        entities: usize,
        relationships: usize,
    },
    Skipped {
        failed_dependency: &'static str,
    },
    Disabled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub step_id: &'static str,
    pub status: StepStatus,
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, StepStatus::Success { .. })
    }

    /// Persistable form of this outcome.
    pub fn to_record(&self) -> StepRecord {
        let (status, entities, relationships, duration_ms, detail) = match &self.status {
            StepStatus::Success {
                entities,
                relationships,
                duration,
            } => (
                "success",
                *entities,
                *relationships,
                Some(duration.as_millis() as u64),
                None,
            ),
            StepStatus::Failed {
                error,
                entities,
                relationships,
            } => ("failed", *entities, *relationships, None, Some(error.clone())),
            StepStatus::Skipped { failed_dependency } => {
                ("skipped", 0, 0, None, Some(failed_dependency.to_string()))
            }
            StepStatus::Disabled => ("disabled", 0, 0, None, None),
        };

        StepRecord {
            step_id: self.step_id.to_string(),
            status: status.to_string(),
            entities,
            relationships,
            duration_ms,
            detail,
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug)]
pub struct RunSummary {
    /// One outcome per step, in execution order.
    pub outcomes: Vec<StepOutcome>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn failed(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, StepStatus::Failed { .. }))
    }

    pub fn outcome(&self, step_id: &str) -> Option<&StepOutcome> {
        self.outcomes.iter().find(|o| o.step_id == step_id)
    }
}

/// Progress callback for reporting run status.
pub trait ProgressReporter {
    /// Called before a step's handler is invoked.
    fn step_started(&self, step: &Step, position: usize, total: usize);
    /// Called once per step, including skipped and disabled ones.
    fn step_finished(&self, outcome: &StepOutcome);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn step_started(&self, _step: &Step, _position: usize, _total: usize) {}
    fn step_finished(&self, _outcome: &StepOutcome) {}
    fn done(&self, _summary: &RunSummary) {}
}

// ---------------------------------------------------------------------------
// Start states
// ---------------------------------------------------------------------------

/// Which steps are enabled for a run.
#[derive(Debug, Clone, Default)]
pub struct StartStates {
    disabled: HashSet<&'static str>,
}

impl StartStates {
    /// Enable everything.
    pub fn all_enabled() -> Self {
        Self::default()
    }

    /// Derive start states from configuration and an optional step filter.
    ///
    /// With `ingest_active_directory` off, every directory step except the
    /// account step is disabled. A non-empty `only` restricts the run to the
    /// listed steps plus their dependency closure.
    pub fn from_config(steps: &[Step], config: &IntegrationConfig, only: &[String]) -> Result<Self> {
        let selected = if only.is_empty() {
            None
        } else {
            Some(dependency_closure(steps, only)?)
        };

        let disabled = steps
            .iter()
            .filter(|step| {
                let directory_off = !config.ingest_active_directory
                    && is_directory_step(step.id)
                    && step.id != STEP_AD_ACCOUNT;
                let filtered_out = selected.as_ref().is_some_and(|s| !s.contains(step.id));
                directory_off || filtered_out
            })
            .map(|step| step.id)
            .collect();

        Ok(Self { disabled })
    }

    pub fn disable(&mut self, step_id: &'static str) {
        self.disabled.insert(step_id);
    }

    pub fn is_enabled(&self, step_id: &str) -> bool {
        !self.disabled.contains(step_id)
    }
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Run `steps` against `job_state`.
///
/// Returns an error only when the step graph itself is invalid; step
/// failures are reported in the summary.
#[instrument(skip_all, fields(instance = %config.instance.id, steps = steps.len()))]
pub async fn run_steps(
    steps: &[Step],
    start_states: &StartStates,
    config: &IntegrationConfig,
    client: &AzureClient,
    job_state: &mut JobState,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let plan = execution_plan(steps)?;
    let total = plan.len();

    info!(total, "starting run");

    // Steps that did not complete, mapped to the step that caused it.
    let mut broken: HashMap<&'static str, &'static str> = HashMap::new();
    let mut outcomes = Vec::with_capacity(total);

    for (position, step) in plan.into_iter().enumerate() {
        let status = if let Some(cause) = step.depends_on.iter().find_map(|d| broken.get(d).copied()) {
            info!(step = step.id, failed_dependency = cause, "skipping step");
            broken.insert(step.id, cause);
            StepStatus::Skipped {
                failed_dependency: cause,
            }
        } else if !start_states.is_enabled(step.id) {
            info!(step = step.id, "step disabled");
            StepStatus::Disabled
        } else {
            progress.step_started(step, position, total);
            let status = execute_step(step, config, client, job_state).await;
            if matches!(status, StepStatus::Failed { .. }) {
                broken.insert(step.id, step.id);
            }
            status
        };

        let outcome = StepOutcome {
            step_id: step.id,
            status,
        };
        progress.step_finished(&outcome);
        outcomes.push(outcome);
    }

    let summary = RunSummary {
        outcomes,
        elapsed: start.elapsed(),
    };

    info!(
        failed = summary.failed().count(),
        entities = job_state.entities().len(),
        relationships = job_state.relationships().len(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "run complete"
    );

    progress.done(&summary);
    Ok(summary)
}

async fn execute_step(
    step: &Step,
    config: &IntegrationConfig,
    client: &AzureClient,
    job_state: &mut JobState,
) -> StepStatus {
    let started = Instant::now();
    let before = job_state.snapshot();
    let span = info_span!("step", id = step.id);

    let result = {
        let mut ctx = StepContext {
            config,
            client,
            job_state: &mut *job_state,
        };
        (step.handler)(&mut ctx).instrument(span).await
    };

    let result = result.and_then(|()| check_declared_output(step, job_state, before));

    let added = job_state.snapshot();
    let entities = added.entities - before.entities;
    let relationships = added.relationships - before.relationships;

    match result {
        Ok(()) => {
            let duration = started.elapsed();
            info!(
                step = step.id,
                entities,
                relationships,
                duration_ms = duration.as_millis() as u64,
                "step complete"
            );
            StepStatus::Success {
                entities,
                relationships,
                duration,
            }
        }
        Err(e) => {
            let error = CloudGraphError::step(step.id, e.to_string());
            error!(step = step.id, error = %e, "step failed");
            StepStatus::Failed {
                error: error.to_string(),
                entities,
                relationships,
            }
        }
    }
}

/// Fail a step that produced entity or relationship types it never declared.
fn check_declared_output(
    step: &Step,
    job_state: &JobState,
    before: crate::job_state::Snapshot,
) -> Result<()> {
    if let Some(entity) = job_state
        .entities_since(before)
        .iter()
        .find(|e| !step.declares_entity_type(&e.entity_type))
    {
        warn!(step = step.id, entity_type = %entity.entity_type, "undeclared entity type");
        return Err(CloudGraphError::validation(format!(
            "produced undeclared entity type {} ({})",
            entity.entity_type, entity.key
        )));
    }

    if let Some(rel) = job_state
        .relationships_since(before)
        .iter()
        .find(|r| !step.declares_relationship_type(&r.rel_type))
    {
        warn!(step = step.id, rel_type = %rel.rel_type, "undeclared relationship type");
        return Err(CloudGraphError::validation(format!(
            "produced undeclared relationship type {} ({})",
            rel.rel_type, rel.key
        )));
    }

    Ok(())
}
