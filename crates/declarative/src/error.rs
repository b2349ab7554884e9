//! Engine errors

use crate::validation::ValidationReport;

/// Why a reconciliation stopped
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The desired spec has defects; nothing was changed
    #[error("{0}")]
    Validation(ValidationReport),

    /// Reading the current state failed for a reason other than absence
    #[error("failed to read {resource}: {cause:#}")]
    Lookup {
        resource: String,
        cause: anyhow::Error,
    },

    /// A mutating step failed; steps in `applied` stay applied
    #[error("{step} failed: {cause:#}")]
    Step {
        step: String,
        applied: Vec<String>,
        cause: anyhow::Error,
    },
}

impl Error {
    /// Steps that completed before the failure
    pub fn applied(&self) -> &[String] {
        match self {
            Error::Step { applied, .. } => applied,
            _ => &[],
        }
    }

    /// Whether anything changed remotely before the error
    pub fn changed(&self) -> bool {
        !self.applied().is_empty()
    }

    /// Underlying failure of a read or a step
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Error::Validation(_) => None,
            Error::Lookup { cause, .. } | Error::Step { cause, .. } => Some(cause),
        }
    }

    /// Map an error raised while reading or validating a resource
    ///
    /// A [`ValidationReport`] carried through `anyhow` stays a validation
    /// error; everything else is a lookup failure.
    pub(crate) fn from_read(resource: &str, err: anyhow::Error) -> Self {
        match err.downcast::<ValidationReport>() {
            Ok(report) => Error::Validation(report),
            Err(cause) => Error::Lookup {
                resource: resource.to_string(),
                cause,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
