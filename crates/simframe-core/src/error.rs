//! Error types for the reactive data model.

use thiserror::Error;

use crate::id::{FieldId, GroupId, IntVarId};

/// Errors arising from the frame hierarchy, its fields, and the callbacks
/// attached to them.
///
/// User-supplied updaters return `Result<_, FrameError>`;
/// [`FrameError::callback`] wraps an arbitrary message.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum FrameError {
    /// An invalid configuration was supplied.
    #[error("configuration error: {reason}")]
    Configuration {
        /// What was wrong.
        reason: String,
    },
    /// A committed value's shape differs from the field's established shape.
    #[error("shape mismatch on field '{field}': expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        /// Field name.
        field: String,
        /// The field's shape.
        expected: Vec<usize>,
        /// The offending value's shape.
        found: Vec<usize>,
    },
    /// A write was attempted on a constant field.
    #[error("cannot write to constant field '{field}'")]
    ConstantViolation {
        /// Field name.
        field: String,
    },
    /// A shape whose element count does not match the supplied data.
    #[error("shape {shape:?} cannot hold {len} elements")]
    InvalidShape {
        /// Requested shape.
        shape: Vec<usize>,
        /// Number of elements supplied.
        len: usize,
    },
    /// The field handle does not belong to this frame.
    #[error("unknown field {0}")]
    UnknownField(FieldId),
    /// The group handle does not belong to this frame.
    #[error("unknown group {0}")]
    UnknownGroup(GroupId),
    /// The integration variable handle does not belong to this frame.
    #[error("unknown integration variable {0}")]
    UnknownIntVar(IntVarId),
    /// A child with this name is already registered in the group.
    #[error("group '{group}' already has a child named '{name}'")]
    DuplicateChild {
        /// Group name.
        group: String,
        /// The conflicting child name.
        name: String,
    },
    /// Child names must be non-empty and must not contain `.`.
    #[error("invalid child name '{name}'")]
    InvalidName {
        /// The rejected name.
        name: String,
    },
    /// The snapshot sequence is not strictly increasing.
    #[error("invalid snapshots: {reason}")]
    InvalidSnapshots {
        /// What was wrong.
        reason: String,
    },
    /// The integration variable has an empty snapshot sequence.
    #[error("integration variable '{var}' has no snapshots")]
    NoSnapshots {
        /// Integration variable name.
        var: String,
    },
    /// No snapshot lies ahead of the current control value.
    #[error("no snapshot ahead of {value} on '{var}'")]
    SnapshotsExhausted {
        /// Integration variable name.
        var: String,
        /// Current control value.
        value: f64,
    },
    /// `suggested` was read before anything was suggested.
    #[error("no step size has been suggested for '{var}'")]
    NoSuggestion {
        /// Integration variable name.
        var: String,
    },
    /// A suggested step size was not strictly positive.
    #[error("suggested step size must be positive, got {value}")]
    InvalidSuggestion {
        /// The rejected suggestion.
        value: f64,
    },
    /// The step size updater produced a non-positive or non-finite value.
    #[error("step size must be positive and finite, got {value}")]
    InvalidStepsize {
        /// The rejected step size.
        value: f64,
    },
    /// The integration variable has no step size updater.
    #[error("integration variable '{var}' has no step size updater")]
    MissingStepsizeUpdater {
        /// Integration variable name.
        var: String,
    },
    /// A scheme needed a Jacobian but the field has no jacobinator.
    #[error("field '{field}' has no jacobian")]
    MissingJacobian {
        /// Field name.
        field: String,
    },
    /// A jacobinator returned a matrix of the wrong dimensions.
    #[error("jacobian of field '{field}' is {rows}x{cols}, expected {expected}x{expected}")]
    JacobianShape {
        /// Field name.
        field: String,
        /// Rows returned.
        rows: usize,
        /// Columns returned.
        cols: usize,
        /// Number of elements in the field.
        expected: usize,
    },
    /// A direct linear solve hit a singular matrix.
    #[error("singular matrix while solving for field '{field}'")]
    SingularMatrix {
        /// Field name.
        field: String,
    },
    /// An error raised by a user callback.
    #[error("{reason}")]
    Callback {
        /// Callback-supplied message.
        reason: String,
    },
}

impl FrameError {
    /// Wraps a message from a user callback.
    pub fn callback(reason: impl Into<String>) -> Self {
        Self::Callback {
            reason: reason.into(),
        }
    }

    /// Builds a [`FrameError::Configuration`].
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}
