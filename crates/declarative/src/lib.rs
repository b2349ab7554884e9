//! # Declarative
//!
//! A framework for reconciling remote resources with a declared state.
//!
//! ## Core Concepts
//!
//! - **Resource**: a desired spec paired with the remote object it describes
//! - **Lookup**: the observed state, or its absence
//! - **Action**: create, update, delete, no-op, or an unsupported transition
//! - **FieldRule**: one entry of a per-field comparison table; the table
//!   order is the order of the update calls
//! - **ExecutionPlan**: the ordered steps for one resource
//! - **Executor**: locates once, validates everything, then mutates step by
//!   step and stops at the first failure
//!
//! ## Example
//!
//! ```ignore
//! use declarative::{ExecuteOptions, NoProgress, execute};
//!
//! let summary = execute(&volume_spec, &ExecuteOptions::default(), &mut NoProgress)?;
//! println!("changed: {}", summary.changed());
//! ```
//!
//! Validation is exhaustive: every defect of the desired spec is collected
//! into one [`ValidationReport`] before any mutating call is issued.

pub mod context;
pub mod diff;
pub mod error;
pub mod executor;
pub mod planner;
pub mod resource;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use context::{ApplyContext, NoProgress, ProgressCallback};
pub use diff::{FieldPatch, FieldRule, SetOp, diff_fields, resolve_set, scalar_change, set_change};
pub use error::{Error, Result};
pub use executor::execute;
pub use planner::{ExecutionPlan, Step};
pub use resource::Resource;
pub use types::{Action, ApplyResult, ExecuteOptions, ExecuteSummary, Intent, Lookup};
pub use validation::{Defect, ValidationReport, missing_references};
