//! Polling of asynchronous remote operations.
//!
//! Every mutating call hands back an [`Operation`]. The change is only done
//! once the operation reaches a terminal state, so callers block in
//! [`await_operation`] until it does. The poll interval grows with
//! exponential backoff up to a cap; an overall timeout bounds the wait.

use crate::backend::FusionApi;
use crate::error::{Error, Result};
use crate::types::{Operation, OperationStatus};
use log::debug;
use std::thread;
use std::time::{Duration, Instant};

/// Polling schedule for [`await_operation`].
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Delay before the first re-check.
    pub interval: Duration,
    /// Multiplier applied to the delay after each check.
    pub backoff_factor: f64,
    /// Maximum delay between checks.
    pub max_interval: Duration,
    /// Give up after waiting this long.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(500),
            backoff_factor: 1.5,
            max_interval: Duration::from_secs(10),
            timeout: Duration::from_secs(600),
        }
    }
}

impl PollConfig {
    /// Calculate the delay after a given check (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.interval.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let capped = delay.min(self.max_interval.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Schedule that never sleeps. Useful with in-memory backends.
    pub fn immediate() -> Self {
        Self {
            interval: Duration::ZERO,
            backoff_factor: 1.0,
            max_interval: Duration::ZERO,
            timeout: Duration::from_secs(600),
        }
    }
}

/// Callback trait for poll progress notifications.
pub trait PollCallback {
    /// Called each time a non-terminal status is observed.
    fn on_poll(&self, operation: &Operation, attempt: u32);
}

/// Block until `operation` reaches a terminal state.
///
/// Returns the final operation on success. A `Failed` or `Cancelled`
/// operation becomes [`Error::OperationFailed`]; running out of time becomes
/// [`Error::OperationTimedOut`]. Errors fetching the operation are returned
/// as-is, there is no retry.
pub fn await_operation(
    api: &dyn FusionApi,
    operation: Operation,
    config: &PollConfig,
    callback: Option<&dyn PollCallback>,
) -> Result<Operation> {
    let started = Instant::now();
    let mut current = operation;
    let mut attempt: u32 = 0;

    loop {
        match current.status {
            OperationStatus::Succeeded => {
                debug!("operation {} succeeded", current.id);
                return Ok(current);
            }
            OperationStatus::Failed | OperationStatus::Cancelled => {
                return Err(Error::OperationFailed {
                    id: current.id.clone(),
                    reason: current.failure_reason(),
                });
            }
            OperationStatus::Pending | OperationStatus::Running | OperationStatus::Aborting => {}
        }

        if started.elapsed() >= config.timeout {
            return Err(Error::OperationTimedOut {
                id: current.id.clone(),
                waited_secs: started.elapsed().as_secs(),
            });
        }

        if let Some(cb) = callback {
            cb.on_poll(&current, attempt);
        }
        debug!(
            "operation {} is {} (check {})",
            current.id, current.status, attempt
        );

        let delay = config.delay_for_attempt(attempt);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        attempt = attempt.saturating_add(1);

        current = api.get_operation(&current.id)?;
    }
}
