//! Session: the API client for one invocation.
//!
//! A session is opened once, handed by reference to every component that
//! talks to Fusion, and dropped when the invocation ends. There is no global
//! client.

use crate::backend::FusionApi;
use crate::backend::http::HttpBackend;
use crate::error::{Error, Result};
use crate::operation::{PollCallback, PollConfig, await_operation};
use crate::types::Operation;
use log::debug;
use std::fmt;

/// What is needed to reach the API.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// API host, e.g. `https://api.pure1.purestorage.com/fusion`.
    pub api_host: String,
    /// Bearer access token.
    pub access_token: String,
}

impl Credentials {
    pub fn new(api_host: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            api_host: api_host.into(),
            access_token: access_token.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        let host = self.api_host.trim();
        if !(host.starts_with("https://") || host.starts_with("http://")) {
            return Err(Error::Session(format!(
                "API host '{}' must start with http:// or https://",
                self.api_host
            )));
        }
        if self.access_token.trim().is_empty() {
            return Err(Error::Session("access token is empty".to_string()));
        }
        Ok(())
    }
}

// Keep the token out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_host", &self.api_host)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// An open connection to the Fusion API.
pub struct Session {
    api: Box<dyn FusionApi>,
    poll: PollConfig,
}

impl Session {
    /// Open a session against the REST API.
    ///
    /// Fails before any request is made if the credentials are unusable.
    pub fn open(credentials: &Credentials) -> Result<Self> {
        credentials.validate()?;
        debug!("opening session against {}", credentials.api_host);
        let backend = HttpBackend::new(credentials.api_host.trim(), credentials.access_token.trim())?;
        Ok(Self::with_api(backend, PollConfig::default()))
    }

    /// Build a session around any API implementation.
    pub fn with_api(api: impl FusionApi + 'static, poll: PollConfig) -> Self {
        Self {
            api: Box::new(api),
            poll,
        }
    }

    /// Replace the polling schedule.
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn api(&self) -> &dyn FusionApi {
        self.api.as_ref()
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Block until `operation` finishes, using this session's schedule.
    pub fn await_operation(
        &self,
        operation: Operation,
        callback: Option<&dyn PollCallback>,
    ) -> Result<Operation> {
        await_operation(self.api(), operation, &self.poll, callback)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("poll", &self.poll).finish()
    }
}
