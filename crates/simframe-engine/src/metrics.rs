//! Per-step and per-run metrics.
//!
//! [`IntegrationMetrics`] captures one call to
//! [`Integrator::integrate`](crate::Integrator::integrate);
//! [`RunSummary`] aggregates a whole [`Frame::run`](crate::Frame::run).

/// Timing and retry data for a single integration step.
///
/// All durations are in microseconds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntegrationMetrics {
    /// Attempts made, including the accepted one.
    pub attempts: u32,
    /// Attempts rejected before acceptance.
    pub rejected_attempts: u32,
    /// The accepted step size.
    pub stepsize: f64,
    /// Wall-clock time for the entire step, in microseconds.
    pub total_us: u64,
    /// Per-instruction execution times in the accepted attempt:
    /// `(scheme name, microseconds)`.
    pub instruction_us: Vec<(String, u64)>,
}

/// Aggregate data for a run over the snapshot schedule.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    /// Accepted integration steps.
    pub steps: u64,
    /// Attempts made, including rejected ones.
    pub attempts: u64,
    /// Rejected attempts.
    pub rejected_attempts: u64,
    /// Snapshots handed to the writer.
    pub snapshots_written: usize,
    /// Whether a listener stopped the run early.
    pub stopped: bool,
    /// Wall-clock time for the run, in microseconds.
    pub elapsed_us: u64,
}

impl RunSummary {
    pub(crate) fn record(&mut self, metrics: &IntegrationMetrics) {
        self.steps += 1;
        self.attempts += u64::from(metrics.attempts);
        self.rejected_attempts += u64::from(metrics.rejected_attempts);
    }
}
