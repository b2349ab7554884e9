//! Field-level diffing
//!
//! A resource describes its mutable fields as a table of [`FieldRule`]s.
//! [`diff_fields`] walks the table in order and collects one patch per
//! differing field, so the order of the table is the order of the calls.

use anyhow::Result;
use std::fmt;

/// A change to exactly one field
pub trait FieldPatch: fmt::Debug {
    /// Name of the field this patch sets
    fn field(&self) -> &'static str;

    /// One-line description for plans and logs
    fn describe(&self) -> String {
        format!("set {}", self.field())
    }
}

/// One entry of a per-field comparison table
///
/// `compare` returns the patch for this field, or `None` when desired and
/// observed already agree.
pub struct FieldRule<D: ?Sized, O, P> {
    pub field: &'static str,
    pub compare: fn(&D, &O) -> Result<Option<P>>,
}

impl<D: ?Sized, O, P> FieldRule<D, O, P> {
    pub const fn new(field: &'static str, compare: fn(&D, &O) -> Result<Option<P>>) -> Self {
        Self { field, compare }
    }
}

/// Run every rule and collect the patches in table order
pub fn diff_fields<D: ?Sized, O, P>(
    rules: &[FieldRule<D, O, P>],
    desired: &D,
    observed: &O,
) -> Result<Vec<P>> {
    let mut patches = Vec::new();
    for rule in rules {
        if let Some(patch) = (rule.compare)(desired, observed)? {
            log::trace!("field {} differs", rule.field);
            patches.push(patch);
        }
    }
    Ok(patches)
}

/// Compare an optional desired scalar with the observed one
///
/// Unset desired values never produce a change.
pub fn scalar_change<T>(desired: Option<&T>, observed: Option<&T>) -> Option<T::Owned>
where
    T: PartialEq + ToOwned + ?Sized,
{
    match desired {
        Some(want) if Some(want) != observed => Some(T::to_owned(want)),
        _ => None,
    }
}

/// How requested names combine with the observed set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Add,
    Remove,
}

/// Union or difference of two name lists
///
/// The result keeps the observed order, appends new names in request order,
/// and holds no duplicates.
pub fn resolve_set(observed: &[String], requested: &[String], op: SetOp) -> Vec<String> {
    let mut result: Vec<String> = Vec::with_capacity(observed.len() + requested.len());
    for name in observed {
        if !result.contains(name) {
            result.push(name.clone());
        }
    }
    match op {
        SetOp::Add => {
            for name in requested {
                if !result.contains(name) {
                    result.push(name.clone());
                }
            }
        }
        SetOp::Remove => result.retain(|name| !requested.contains(name)),
    }
    result
}

/// The new set when it differs from `observed`, `None` otherwise
pub fn set_change(observed: &[String], requested: &[String], op: SetOp) -> Option<Vec<String>> {
    if requested.is_empty() {
        return None;
    }
    let resolved = resolve_set(observed, requested, op);
    if resolved.as_slice() == observed {
        None
    } else {
        Some(resolved)
    }
}
