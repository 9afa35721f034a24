//! The run loop: integrate from the current control value through the
//! snapshot schedule.

use std::time::Instant;

use simframe_core::FrameError;
use thiserror::Error;
use tracing::{debug, info};

use crate::frame::Frame;
use crate::integrator::IntegrationError;
use crate::listener::ControlSignal;
use crate::metrics::RunSummary;
use crate::output::OutputError;

/// Errors from [`Frame::run`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum RunError {
    /// No integrator is installed.
    #[error("frame has no integrator")]
    NoIntegrator,
    /// The control variable has already reached the last snapshot.
    #[error("control value {value} is at or past the last snapshot {last}")]
    PastLastSnapshot {
        /// Current control value.
        value: f64,
        /// Last snapshot in the schedule.
        last: f64,
    },
    /// An integration step failed.
    #[error(transparent)]
    Integration(#[from] IntegrationError),
    /// A data-model or callback error.
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// The writer failed.
    #[error(transparent)]
    Output(#[from] OutputError),
}

impl Frame {
    /// Integrates through every remaining snapshot.
    ///
    /// Output for snapshot 0 is written first when the control value sits
    /// exactly on it. Before each step the listener is polled; after each
    /// accepted step the control variable advances by the accepted step
    /// and the whole hierarchy is updated. Output is written on reaching
    /// each snapshot.
    pub fn run(&mut self) -> Result<RunSummary, RunError> {
        let start = Instant::now();
        let var = self
            .integration_variable()
            .filter(|_| self.integrator().is_some())
            .ok_or(RunError::NoIntegrator)?;

        let snapshots = self.intvar(var)?.snapshots().to_vec();
        let Some(&last) = snapshots.last() else {
            return Err(FrameError::NoSnapshots {
                var: self.intvar(var)?.name().to_string(),
            }
            .into());
        };
        let x = self.control_value(var)?;
        if x >= last {
            return Err(RunError::PastLastSnapshot { value: x, last });
        }

        info!(start = x, end = last, snapshots = snapshots.len(), "run started");
        let mut summary = RunSummary::default();

        if x == snapshots[0] {
            self.write_output(0, false, None)?;
            summary.snapshots_written += 1;
        }

        let first = snapshots.iter().position(|&s| x < s).unwrap_or(snapshots.len());
        for (index, &snapshot) in snapshots.iter().enumerate().skip(first) {
            while self.control_value(var)? < snapshot {
                match self.poll_listener() {
                    Some(ControlSignal::Stop) => {
                        info!(at = self.control_value(var)?, "run stopped by listener");
                        summary.stopped = true;
                        summary.elapsed_us = start.elapsed().as_micros() as u64;
                        return Ok(summary);
                    }
                    Some(ControlSignal::Write { filename }) => {
                        self.write_output(index, true, filename.as_deref())?;
                    }
                    Some(ControlSignal::Dump { filename }) => {
                        self.dump(filename.as_deref())?;
                    }
                    None => {}
                }

                let metrics = self.integrate()?;
                summary.record(&metrics);
                self.advance(var, metrics.stepsize, snapshot)?;
                self.update()?;
            }
            debug!(index, snapshot, "snapshot reached");
            self.write_output(index, false, None)?;
            summary.snapshots_written += 1;
        }

        summary.elapsed_us = start.elapsed().as_micros() as u64;
        info!(
            steps = summary.steps,
            rejected = summary.rejected_attempts,
            elapsed_us = summary.elapsed_us,
            "run finished"
        );
        Ok(summary)
    }
}
