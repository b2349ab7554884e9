//! Fusion resources reconciled by the declarative engine
//!
//! Each resource pairs a desired spec with the session it reads and
//! mutates through. Mutating calls block until the returned operation
//! reaches a terminal state.

pub mod storage_endpoint;
pub mod volume;

pub use storage_endpoint::{StorageEndpointResource, StorageEndpointSpec};
pub use volume::{VolumeResource, VolumeSpec};

use anyhow::{Context, Result};
use fusionkit::{FusionApi, Operation, PollCallback, Session};
use std::fmt;

/// Session handle shared by the resource implementations
#[derive(Clone, Copy)]
pub struct Remote<'a> {
    session: &'a Session,
    poll: Option<&'a dyn PollCallback>,
}

impl<'a> Remote<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            poll: None,
        }
    }

    /// Report every poll of an outstanding operation to `poll`
    pub fn with_poll(mut self, poll: &'a dyn PollCallback) -> Self {
        self.poll = Some(poll);
        self
    }

    pub fn api(&self) -> &'a dyn FusionApi {
        self.session.api()
    }

    /// Issue a mutating call and wait for its operation to finish
    pub fn mutate<F>(&self, what: &str, call: F) -> Result<Operation>
    where
        F: FnOnce(&dyn FusionApi) -> fusionkit::Result<Operation>,
    {
        let operation = call(self.api()).with_context(|| format!("{} was rejected", what))?;
        log::debug!("{} started as operation {}", what, operation.id);
        self.session
            .await_operation(operation, self.poll)
            .with_context(|| format!("{} did not complete", what))
    }
}

impl fmt::Debug for Remote<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remote")
            .field("session", self.session)
            .field("poll", &self.poll.is_some())
            .finish()
    }
}
