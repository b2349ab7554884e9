pub mod storage_endpoint;
pub mod volume;

use crate::Context;
use crate::progress::{Reporter, Spinner};
use declarative::{ExecuteOptions, ExecuteSummary, Resource};
use fusionkit::{ErrorCategory, Session};
use serde::Serialize;

/// Result of one command, as printed to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub changed: bool,
    pub failed: bool,
    pub msg: String,
}

impl Outcome {
    pub fn failure(msg: impl Into<String>) -> Self {
        Self {
            changed: false,
            failed: true,
            msg: msg.into(),
        }
    }

    /// Build the outcome of reconciling `description`
    ///
    /// A failed step still reports `changed` when earlier steps went through.
    pub fn from_result(
        description: &str,
        check: bool,
        result: declarative::Result<ExecuteSummary>,
    ) -> Self {
        match result {
            Ok(summary) => {
                let changed = summary.changed();
                let mut msg = if !changed && !summary.warnings.is_empty() {
                    String::new()
                } else if !changed {
                    format!("{} is up to date", description)
                } else if check {
                    format!("{} would {}: {}", description, summary.action, summary.planned.join(", "))
                } else {
                    format!("{}: {}", description, summary.applied.join(", "))
                };
                for warning in &summary.warnings {
                    if !msg.is_empty() {
                        msg.push_str("; ");
                    }
                    msg.push_str(warning);
                }
                Self {
                    changed,
                    failed: false,
                    msg,
                }
            }
            Err(e) => {
                let mut msg = format!("{}: {}", description, e);
                if e.changed() {
                    msg.push_str(&format!(" (already applied: {})", e.applied().join(", ")));
                }
                if let Some(category) = api_error_category(&e) {
                    log::debug!("{} failed: {}", description, category);
                    msg.push_str(&format!(". {}", category.advice()));
                }
                Self {
                    changed: e.changed(),
                    failed: true,
                    msg,
                }
            }
        }
    }
}

/// Category of the Fusion API error behind a failed read or step
fn api_error_category(err: &declarative::Error) -> Option<ErrorCategory> {
    err.cause()?
        .chain()
        .find_map(|source| source.downcast_ref::<fusionkit::Error>())
        .map(fusionkit::Error::category)
}

impl Context {
    /// Open an API session from flags, environment and the config file
    pub fn open_session(&self) -> anyhow::Result<Session> {
        let config = crate::config::Config::load(self.config.as_deref())?;
        let credentials =
            config.credentials(self.api_host.as_deref(), self.access_token.as_deref())?;
        log::debug!("connecting to {}", credentials.api_host);
        Ok(Session::open(&credentials)?.with_poll_config(config.poll_config()))
    }

    pub fn execute_options(&self) -> ExecuteOptions {
        ExecuteOptions {
            check_mode: self.check,
        }
    }

    /// Whether progress lines go to the terminal
    pub fn interactive(&self) -> bool {
        !self.quiet && self.output == crate::cli::OutputFormat::Text
    }
}

/// Reconcile one resource and turn the result into an [`Outcome`]
///
/// `spinner` must be the one the resource's remote handle reports polls to.
pub fn reconcile<R: Resource>(ctx: &Context, resource: &R, spinner: &Spinner) -> Outcome {
    let description = resource.description();
    let mut reporter = Reporter::new(spinner, ctx.interactive());
    let result = declarative::execute(resource, &ctx.execute_options(), &mut reporter);
    spinner.stop();

    Outcome::from_result(&description, ctx.check, result)
}
