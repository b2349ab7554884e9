//! Execution planner - turns an observed state into an ordered list of steps

use crate::diff::FieldPatch;
use crate::resource::Resource;
use crate::types::{Action, ApplyResult};
use anyhow::Result;

/// One mutating call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<P> {
    Create,
    Patch(P),
    Delete,
}

impl<P: FieldPatch> Step<P> {
    /// Name reported for this step: `create`, `delete`, or the patched field
    pub fn name(&self) -> String {
        match self {
            Step::Create => "create".to_string(),
            Step::Patch(patch) => patch.field().to_string(),
            Step::Delete => "delete".to_string(),
        }
    }
}

/// What reconciling one resource will do
#[derive(Debug)]
pub struct ExecutionPlan<P> {
    pub resource_id: String,
    pub action: Action,
    /// Steps in the order they are issued
    pub steps: Vec<Step<P>>,
}

impl<P: FieldPatch> ExecutionPlan<P> {
    /// Build the plan for a resource from its single observed snapshot
    ///
    /// The diff only runs for updates. A create carries any follow-up
    /// patches the resource asks for after the create step.
    pub fn build<R>(resource: &R, observed: Option<&R::Observed>, checked: &R::Checked) -> Result<Self>
    where
        R: Resource<Patch = P>,
    {
        let action = resource.plan(observed);
        let steps = match (&action, observed) {
            (Action::Create, _) => {
                let mut steps = vec![Step::Create];
                steps.extend(resource.after_create(checked).into_iter().map(Step::Patch));
                steps
            }
            (Action::Update, Some(current)) => resource
                .diff(current, checked)?
                .into_iter()
                .map(Step::Patch)
                .collect(),
            (Action::Delete, Some(_)) => vec![Step::Delete],
            (Action::Update | Action::Delete, None) => {
                anyhow::bail!(
                    "cannot {} {}: it does not exist",
                    action,
                    resource.description()
                )
            }
            (Action::NoOp | Action::Unsupported { .. }, _) => Vec::new(),
        };

        Ok(Self {
            resource_id: resource.id(),
            action,
            steps,
        })
    }

    /// Check if the plan issues no mutating call
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(Step::name).collect()
    }

    /// Result reported once every step has been applied
    pub fn expected_result(&self) -> ApplyResult {
        if self.is_noop() {
            return match &self.action {
                Action::Unsupported { reason } => ApplyResult::Skipped {
                    reason: reason.clone(),
                },
                _ => ApplyResult::NoChange,
            };
        }
        match self.action {
            Action::Create => ApplyResult::Created,
            Action::Delete => ApplyResult::Removed,
            _ => ApplyResult::Modified,
        }
    }
}
