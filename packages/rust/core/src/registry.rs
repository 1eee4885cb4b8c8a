//! Step descriptors, the static step registry and dependency ordering.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;

use cloudgraph_client::AzureClient;
use cloudgraph_shared::{
    CloudGraphError, EntitySchema, IntegrationConfig, RelationshipSchema, Result,
};

use crate::job_state::JobState;
use crate::steps;

/// Boxed, non-`Send` future; steps run one at a time on the current task.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Execution handler of a step.
pub type StepHandler = for<'a, 'b> fn(&'a mut StepContext<'b>) -> BoxFuture<'a, Result<()>>;

/// Everything a step handler may touch.
pub struct StepContext<'a> {
    pub config: &'a IntegrationConfig,
    pub client: &'a AzureClient,
    pub job_state: &'a mut JobState,
}

/// Static description of one fetch-convert-persist unit.
#[derive(Clone, Copy)]
pub struct Step {
    pub id: &'static str,
    pub name: &'static str,
    /// Entity shapes this step may produce.
    pub entities: &'static [EntitySchema],
    /// Relationship shapes this step may produce.
    pub relationships: &'static [RelationshipSchema],
    pub depends_on: &'static [&'static str],
    pub handler: StepHandler,
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step")
            .field("id", &self.id)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

impl Step {
    pub fn declares_entity_type(&self, entity_type: &str) -> bool {
        self.entities.iter().any(|s| s.entity_type == entity_type)
    }

    pub fn declares_relationship_type(&self, rel_type: &str) -> bool {
        self.relationships.iter().any(|s| s.rel_type == rel_type)
    }
}

static STEPS: LazyLock<Vec<Step>> = LazyLock::new(|| {
    let mut all = Vec::new();
    all.extend(steps::active_directory::steps());
    all.extend(steps::resources::steps());
    all.extend(steps::network::steps());
    all.extend(steps::storage::steps());
    all.extend(steps::key_vault::steps());
    all.extend(steps::event_grid::steps());
    all.extend(steps::management_groups::steps());
    all.extend(steps::advisor::steps());
    all
});

/// Every step, in declaration order.
pub fn all_steps() -> &'static [Step] {
    &STEPS
}

/// Look up a step by ID.
pub fn find_step(id: &str) -> Option<&'static Step> {
    STEPS.iter().find(|s| s.id == id)
}

// ---------------------------------------------------------------------------
// Dependency graph
// ---------------------------------------------------------------------------

/// Reject duplicate IDs, unknown dependencies and cycles.
pub fn validate_steps(steps: &[Step]) -> Result<()> {
    execution_plan(steps).map(|_| ())
}

/// Topological order of `steps` (Kahn's algorithm).
///
/// Among steps that are ready at the same time, the one declared first runs
/// first, so the plan is deterministic.
pub fn execution_plan(steps: &[Step]) -> Result<Vec<&Step>> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        if index.insert(step.id, i).is_some() {
            return Err(CloudGraphError::validation(format!(
                "duplicate step id: {}",
                step.id
            )));
        }
    }

    let mut in_degree = vec![0usize; steps.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); steps.len()];
    for (i, step) in steps.iter().enumerate() {
        let mut seen = HashSet::new();
        for dep in step.depends_on {
            let &d = index.get(dep).ok_or_else(|| {
                CloudGraphError::validation(format!(
                    "step {} depends on unknown step {dep}",
                    step.id
                ))
            })?;
            if seen.insert(d) {
                in_degree[i] += 1;
                dependents[d].push(i);
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..steps.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut plan = Vec::with_capacity(steps.len());

    while let Some(i) = ready.pop_first() {
        plan.push(&steps[i]);
        for &next in &dependents[i] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if plan.len() != steps.len() {
        let stuck: Vec<&str> = steps
            .iter()
            .enumerate()
            .filter(|(i, _)| in_degree[*i] > 0)
            .map(|(_, s)| s.id)
            .collect();
        return Err(CloudGraphError::validation(format!(
            "dependency cycle among steps: {}",
            stuck.join(", ")
        )));
    }

    Ok(plan)
}

/// `ids` plus everything they transitively depend on.
pub fn dependency_closure(steps: &[Step], ids: &[String]) -> Result<HashSet<&'static str>> {
    let by_id: HashMap<&str, &Step> = steps.iter().map(|s| (s.id, s)).collect();
    let mut closure = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();

    for id in ids {
        let step = by_id
            .get(id.as_str())
            .ok_or_else(|| CloudGraphError::validation(format!("unknown step: {id}")))?;
        stack.push(step.id);
    }

    while let Some(id) = stack.pop() {
        let Some(step) = by_id.get(id) else { continue };
        if closure.insert(step.id) {
            stack.extend(step.depends_on.iter().copied());
        }
    }

    Ok(closure)
}
