//! Resource trait for reconciling remote state
//!
//! A Resource pairs a desired spec with the remote object it describes. The
//! engine drives it through locate, validate, plan, diff and the mutating
//! calls; the resource only knows how to talk to its own API.

use crate::context::ApplyContext;
use crate::diff::FieldPatch;
use crate::types::{Action, Intent, Lookup};
use crate::validation::ValidationReport;
use anyhow::Result;
use std::fmt;

/// Core trait for reconciled resources
///
/// # Example
///
/// ```ignore
/// use declarative::{Action, ApplyContext, Intent, Lookup, Resource, ValidationReport};
///
/// impl Resource for VolumeSpec {
///     type Observed = Volume;
///     type Checked = SizeLimit;
///     type Patch = VolumeChange;
///
///     fn id(&self) -> String { self.id.to_string() }
///     fn description(&self) -> String { format!("volume {}", self.id) }
///     fn intent(&self) -> Intent { self.state }
///
///     fn locate(&self) -> anyhow::Result<Lookup<Volume>> {
///         Ok(self.session.api().get_volume(&self.id)?.into())
///     }
///     // validate, diff, create, apply_patch, delete ...
/// }
/// ```
pub trait Resource: fmt::Debug {
    /// Remote representation returned by [`Resource::locate`]
    type Observed: fmt::Debug;

    /// Facts established during validation and needed later, such as a
    /// size ceiling read from a referenced resource
    type Checked;

    /// One field-level change
    type Patch: FieldPatch;

    /// Stable identifier, e.g. `tenant/space/name`
    fn id(&self) -> String;

    /// Human-readable description
    fn description(&self) -> String;

    /// Requested end state
    fn intent(&self) -> Intent;

    /// Fetch the current remote representation
    ///
    /// Absence is `Ok(Lookup::NotFound)`. Any other failure is an error and
    /// must never be reported as absence.
    fn locate(&self) -> Result<Lookup<Self::Observed>>;

    /// Check the desired spec against the remote system
    ///
    /// Every check runs; defects are pushed onto `report` rather than
    /// returned. An `Err` is reserved for failures to reach the remote side.
    fn validate(
        &self,
        observed: Option<&Self::Observed>,
        report: &mut ValidationReport,
    ) -> Result<Self::Checked>;

    /// Choose the transition for the observed state
    fn plan(&self, observed: Option<&Self::Observed>) -> Action {
        Action::for_state(self.intent(), observed.is_some())
    }

    /// Field-level patches that bring `observed` to the desired spec, in
    /// the order they must be applied
    fn diff(&self, observed: &Self::Observed, checked: &Self::Checked) -> Result<Vec<Self::Patch>>;

    /// Patches to apply once a freshly created resource exists
    fn after_create(&self, _checked: &Self::Checked) -> Vec<Self::Patch> {
        Vec::new()
    }

    /// Create the resource and wait for the remote operation to finish
    fn create(&self, checked: &Self::Checked, ctx: &mut ApplyContext) -> Result<()>;

    /// Apply one patch and wait for the remote operation to finish
    fn apply_patch(&self, patch: &Self::Patch, ctx: &mut ApplyContext) -> Result<()>;

    /// Delete the resource and wait for the remote operation to finish
    fn delete(&self, ctx: &mut ApplyContext) -> Result<()>;
}
