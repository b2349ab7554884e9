//! Progress reporting for reconciliation runs
//!
//! [`Spinner`] shows one spinner per mutating step and is fed by the
//! operation poller. [`Reporter`] prints plan and step lines around it.

use crate::ui;
use declarative::{Action, ProgressCallback};
use fusionkit::{Operation, PollCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::time::Duration;

/// Spinner shown while a remote operation is outstanding
pub struct Spinner {
    enabled: bool,
    bar: RefCell<Option<ProgressBar>>,
}

impl Spinner {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            bar: RefCell::new(None),
        }
    }

    /// Start spinning with `message`, replacing any running spinner
    pub fn start(&self, message: &str) {
        if !self.enabled {
            return;
        }
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let bar = ProgressBar::new_spinner();
        bar.set_style(style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        if let Some(old) = self.bar.replace(Some(bar)) {
            old.finish_and_clear();
        }
    }

    pub fn stop(&self) {
        if let Some(bar) = self.bar.borrow_mut().take() {
            bar.finish_and_clear();
        }
    }
}

impl PollCallback for Spinner {
    fn on_poll(&self, operation: &Operation, attempt: u32) {
        if let Some(bar) = self.bar.borrow().as_ref() {
            bar.set_message(format!(
                "{} {} ({}, check {})",
                operation.request_type,
                operation.id,
                operation.status,
                attempt + 1
            ));
        }
    }
}

/// Prints plan and step outcomes
pub struct Reporter<'a> {
    spinner: &'a Spinner,
    show: bool,
}

impl<'a> Reporter<'a> {
    pub fn new(spinner: &'a Spinner, show: bool) -> Self {
        Self { spinner, show }
    }
}

impl ProgressCallback for Reporter<'_> {
    fn on_plan(&mut self, id: &str, action: &Action, steps: &[String]) {
        log::info!("{}: {} [{}]", id, action, steps.join(", "));
        if self.show && !steps.is_empty() {
            ui::plan(id, &action.to_string(), steps);
        }
    }

    fn on_step_start(&mut self, id: &str, step: &str) {
        self.spinner.start(&format!("{} {}", step, id));
    }

    fn on_step_complete(&mut self, _id: &str, step: &str, ok: bool) {
        self.spinner.stop();
        if self.show {
            if ok {
                ui::step_done(step);
            } else {
                ui::error(&format!("{} failed", step));
            }
        }
    }

    fn on_warning(&mut self, message: &str) {
        if self.show {
            ui::warn(message);
        }
    }
}
