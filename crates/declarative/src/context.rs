//! Apply context and progress reporting
//!
//! These traits let the engine report progress without depending on a
//! particular terminal UI.

use crate::types::Action;
use log::warn;

/// Progress callback for reconciliation
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback {
    /// Called once the action and its steps are known
    fn on_plan(&mut self, id: &str, action: &Action, steps: &[String]);

    /// Called before a mutating step is issued
    fn on_step_start(&mut self, id: &str, step: &str);

    /// Called when a step finishes, successfully or not
    fn on_step_complete(&mut self, id: &str, step: &str, ok: bool);

    /// Called for each warning raised during the run
    fn on_warning(&mut self, message: &str);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_plan(&mut self, _id: &str, _action: &Action, _steps: &[String]) {}
    fn on_step_start(&mut self, _id: &str, _step: &str) {}
    fn on_step_complete(&mut self, _id: &str, _step: &str, _ok: bool) {}
    fn on_warning(&mut self, _message: &str) {}
}

/// Context passed to resource mutations
#[derive(Debug, Default)]
pub struct ApplyContext {
    warnings: Vec<String>,
}

impl ApplyContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning for the run summary
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.warnings.push(message);
    }

    /// Hand over warnings recorded since the last call
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}
