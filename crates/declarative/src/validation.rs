//! Validation report collected before any mutation
//!
//! Validation is exhaustive: every check runs and every defect is recorded,
//! so a single run reports all problems at once.

use anyhow::Result;
use std::fmt;

/// A single problem with the desired spec
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Defect {
    /// A field required for this transition was not supplied
    #[error("{field} is required {reason}")]
    MissingField { field: &'static str, reason: String },

    /// A supplied value is malformed
    #[error("invalid {field} '{value}': {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// Referenced resources that do not exist
    #[error("{kind} not found: {}", .names.join(", "))]
    MissingReferences { kind: &'static str, names: Vec<String> },

    /// A value is above the limit the remote side allows
    #[error("{field} {requested} exceeds the limit of {limit}")]
    ExceedsLimit {
        field: &'static str,
        requested: String,
        limit: String,
    },

    /// A target name is already taken
    #[error("{field} target '{name}' already exists")]
    Collision { field: &'static str, name: String },
}

/// All defects found for one resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    defects: Vec<Defect>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report holding one defect
    pub fn single(defect: Defect) -> Self {
        Self {
            defects: vec![defect],
        }
    }

    pub fn push(&mut self, defect: Defect) {
        self.defects.push(defect);
    }

    pub fn extend(&mut self, defects: impl IntoIterator<Item = Defect>) {
        self.defects.extend(defects);
    }

    pub fn is_empty(&self) -> bool {
        self.defects.is_empty()
    }

    pub fn defects(&self) -> &[Defect] {
        &self.defects
    }

    /// `Ok(())` when clean, the report itself otherwise
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.defects.as_slice() {
            [] => write!(f, "no defects"),
            [only] => write!(f, "{}", only),
            many => {
                write!(f, "{} problems found", many.len())?;
                for defect in many {
                    write!(f, "\n  - {}", defect)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationReport {}

/// Check that every referenced name of one kind exists
///
/// All names are checked, even after the first miss. Returns the
/// `MissingReferences` defect listing the unresolved names, or `None` when
/// all resolved. Errors from `exists` are fatal and returned as-is.
pub fn missing_references<'a, I, F>(
    kind: &'static str,
    names: I,
    mut exists: F,
) -> Result<Option<Defect>>
where
    I: IntoIterator<Item = &'a str>,
    F: FnMut(&str) -> Result<bool>,
{
    let mut missing: Vec<String> = Vec::new();
    for name in names {
        if !exists(name)? && !missing.iter().any(|m| m == name) {
            missing.push(name.to_string());
        }
    }

    if missing.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Defect::MissingReferences {
            kind,
            names: missing,
        }))
    }
}
