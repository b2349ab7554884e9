//! Core types for declarative resource reconciliation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of looking a resource up
///
/// Absence is a normal answer, not an error. Failures to reach the remote
/// system travel separately as errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Resource exists, with its current representation
    Found(T),
    /// Resource does not exist
    NotFound,
}

impl<T> Lookup<T> {
    /// Borrow the found value
    pub fn as_found(&self) -> Option<&T> {
        match self {
            Self::Found(value) => Some(value),
            Self::NotFound => None,
        }
    }

    /// Check if the resource was found
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Found(v),
            None => Self::NotFound,
        }
    }
}

/// Requested end state of a resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Resource should exist and match the desired spec
    #[default]
    Present,
    /// Resource should not exist
    Absent,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Present => write!(f, "present"),
            Intent::Absent => write!(f, "absent"),
        }
    }
}

/// What reconciliation will do to a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Resource is missing and should exist
    Create,
    /// Resource exists and may need field-level patches
    Update,
    /// Resource exists and should not
    Delete,
    /// Nothing to do
    NoOp,
    /// The transition exists but cannot be carried out; reported as a warning
    Unsupported { reason: String },
}

impl Action {
    /// Default transition for an intent and the observed presence
    pub fn for_state(intent: Intent, present: bool) -> Self {
        match (present, intent) {
            (false, Intent::Present) => Self::Create,
            (true, Intent::Present) => Self::Update,
            (true, Intent::Absent) => Self::Delete,
            (false, Intent::Absent) => Self::NoOp,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
            Action::NoOp => write!(f, "no-op"),
            Action::Unsupported { reason } => write!(f, "unsupported ({})", reason),
        }
    }
}

/// Result of reconciling a resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyResult {
    /// No changes needed
    NoChange,
    /// Resource was created
    Created,
    /// Resource was patched
    Modified,
    /// Resource was removed
    Removed,
    /// Reconciliation was skipped
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents a change
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Created | Self::Modified | Self::Removed)
    }
}

/// Summary of one reconciliation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteSummary {
    /// Resource that was reconciled
    pub resource_id: String,
    /// Planned action
    pub action: Action,
    /// What happened
    pub result: ApplyResult,
    /// Steps the plan called for (`create`, patched field names, `delete`)
    pub planned: Vec<String>,
    /// Steps carried out, in order
    pub applied: Vec<String>,
    /// Warnings raised along the way
    pub warnings: Vec<String>,
    /// Whether this was a check-mode run (no mutating call issued)
    pub check_mode: bool,
}

impl ExecuteSummary {
    pub(crate) fn new(resource_id: String, action: Action, check_mode: bool) -> Self {
        Self {
            resource_id,
            action,
            result: ApplyResult::NoChange,
            planned: Vec::new(),
            applied: Vec::new(),
            warnings: Vec::new(),
            check_mode,
        }
    }

    /// Whether the resource changed (or would change, in check mode)
    pub fn changed(&self) -> bool {
        self.result.is_change()
    }
}

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Run reads, validation and diffing but issue no mutating call
    pub check_mode: bool,
}
