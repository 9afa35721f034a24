//! The output collaborator.
//!
//! A [`Writer`] persists snapshots of a [`Frame`]. File formats are the
//! writer's business; the engine only decides *when* to write.

use thiserror::Error;

use crate::frame::Frame;

/// A writer failed to persist output.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("output failed: {reason}")]
pub struct OutputError {
    /// Human-readable failure description.
    pub reason: String,
}

impl OutputError {
    /// Wraps a failure description.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Persists frame state.
pub trait Writer {
    /// Writes output for snapshot `index`.
    ///
    /// `force_overwrite` is set for writes requested through a listener,
    /// which may target an index that already has output. `filename`
    /// overrides the writer's own naming when present.
    fn write(
        &mut self,
        frame: &Frame,
        index: usize,
        force_overwrite: bool,
        filename: Option<&str>,
    ) -> Result<(), OutputError>;

    /// Dumps the complete frame so a run can be inspected or resumed.
    /// Does nothing by default.
    fn dump(&mut self, frame: &Frame, filename: Option<&str>) -> Result<(), OutputError> {
        let _ = (frame, filename);
        Ok(())
    }
}
