//! Execution engine - reconciles one resource against its remote state
//!
//! The resource is located once, validated in full, planned from that
//! single snapshot and then mutated step by step. The first failing step
//! stops the run; earlier steps are not rolled back.

use crate::context::{ApplyContext, ProgressCallback};
use crate::error::{Error, Result};
use crate::planner::{ExecutionPlan, Step};
use crate::resource::Resource;
use crate::types::{Action, ExecuteOptions, ExecuteSummary};
use crate::validation::ValidationReport;
use log::{debug, info, warn};

/// Reconcile `resource` with the remote system
///
/// In check mode every read, validation and diff runs, but no mutating call
/// is issued; the summary reports what would change.
pub fn execute<R, P>(resource: &R, opts: &ExecuteOptions, progress: &mut P) -> Result<ExecuteSummary>
where
    R: Resource,
    P: ProgressCallback,
{
    let id = resource.id();
    let lookup = resource
        .locate()
        .map_err(|e| Error::from_read(&resource.description(), e))?;
    let observed = lookup.as_found();
    debug!(
        "{} is {}",
        id,
        if observed.is_some() { "present" } else { "absent" }
    );

    let mut report = ValidationReport::new();
    let checked = resource
        .validate(observed, &mut report)
        .map_err(|e| Error::from_read(&resource.description(), e))?;
    if !report.is_empty() {
        return Err(Error::Validation(report));
    }

    let plan = ExecutionPlan::build(resource, observed, &checked)
        .map_err(|e| Error::from_read(&resource.description(), e))?;
    let planned = plan.step_names();
    progress.on_plan(&id, &plan.action, &planned);

    let mut summary = ExecuteSummary::new(id.clone(), plan.action.clone(), opts.check_mode);
    summary.planned = planned;

    if let Action::Unsupported { reason } = &plan.action {
        let message = format!("{}: {}", resource.description(), reason);
        warn!("{}", message);
        progress.on_warning(&message);
        summary.warnings.push(message);
        summary.result = plan.expected_result();
        return Ok(summary);
    }

    if plan.is_noop() {
        debug!("{} is up to date", id);
        return Ok(summary);
    }

    if opts.check_mode {
        info!("check mode: would {} {}", plan.action, id);
        summary.result = plan.expected_result();
        return Ok(summary);
    }

    let mut ctx = ApplyContext::new();
    for step in &plan.steps {
        let name = step.name();
        progress.on_step_start(&id, &name);

        let outcome = match step {
            Step::Create => resource.create(&checked, &mut ctx),
            Step::Patch(patch) => resource.apply_patch(patch, &mut ctx),
            Step::Delete => resource.delete(&mut ctx),
        };

        for message in ctx.take_warnings() {
            progress.on_warning(&message);
            summary.warnings.push(message);
        }
        progress.on_step_complete(&id, &name, outcome.is_ok());

        if let Err(cause) = outcome {
            return Err(Error::Step {
                step: name,
                applied: summary.applied,
                cause,
            });
        }
        summary.applied.push(name);
    }

    summary.result = plan.expected_result();
    Ok(summary)
}
