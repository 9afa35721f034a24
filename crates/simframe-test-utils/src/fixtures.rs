//! Reusable scheme test fixtures.
//!
//! - [`ForwardScheme`]: a first-order explicit step, always staged.
//! - [`AcceptingScheme`]: accepts without staging an increment.
//! - [`RejectingScheme`]: rejects every attempt.
//! - [`FlakyScheme`]: rejects the first N attempts, then steps forward.
//! - [`FixedDeltaScheme`]: stages a constant increment of any shape.

use std::sync::atomic::{AtomicUsize, Ordering};

use simframe_core::{FrameError, Value};
use simframe_engine::{Scheme, SchemeContext, SchemeOutcome};

/// `Y1 = Y0 + dx · f(x0, Y0)`.
pub struct ForwardScheme;

impl Scheme for ForwardScheme {
    fn name(&self) -> &str {
        "forward"
    }

    fn step(&self, ctx: &mut SchemeContext<'_>, dx: f64) -> Result<SchemeOutcome, FrameError> {
        let k = ctx.initial_derivative()?;
        Ok(SchemeOutcome::Delta(&k * dx))
    }
}

/// Accepts every attempt and leaves the target unchanged.
pub struct AcceptingScheme;

impl Scheme for AcceptingScheme {
    fn name(&self) -> &str {
        "accepting"
    }

    fn step(&self, _ctx: &mut SchemeContext<'_>, _dx: f64) -> Result<SchemeOutcome, FrameError> {
        Ok(SchemeOutcome::Accepted)
    }
}

/// Rejects every attempt, counting calls.
pub struct RejectingScheme {
    calls: AtomicUsize,
}

impl RejectingScheme {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Default for RejectingScheme {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheme for RejectingScheme {
    fn name(&self) -> &str {
        "rejecting"
    }

    fn step(&self, _ctx: &mut SchemeContext<'_>, _dx: f64) -> Result<SchemeOutcome, FrameError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(SchemeOutcome::Rejected)
    }
}

/// Rejects the first `reject_count` attempts, suggesting half the step
/// each time, then behaves like [`ForwardScheme`].
pub struct FlakyScheme {
    reject_count: usize,
    calls: AtomicUsize,
}

impl FlakyScheme {
    pub fn new(reject_count: usize) -> Self {
        Self {
            reject_count,
            calls: AtomicUsize::new(0),
        }
    }
}

impl Scheme for FlakyScheme {
    fn name(&self) -> &str {
        "flaky"
    }

    fn step(&self, ctx: &mut SchemeContext<'_>, dx: f64) -> Result<SchemeOutcome, FrameError> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        if n < self.reject_count {
            ctx.suggest(dx / 2.0)?;
            return Ok(SchemeOutcome::Rejected);
        }
        let k = ctx.initial_derivative()?;
        Ok(SchemeOutcome::Delta(&k * dx))
    }
}

/// Stages the same increment every attempt, regardless of the target's
/// shape.
pub struct FixedDeltaScheme {
    pub delta: Value,
}

impl FixedDeltaScheme {
    pub fn new(delta: impl Into<Value>) -> Self {
        Self {
            delta: delta.into(),
        }
    }
}

impl Scheme for FixedDeltaScheme {
    fn name(&self) -> &str {
        "fixed-delta"
    }

    fn step(&self, _ctx: &mut SchemeContext<'_>, _dx: f64) -> Result<SchemeOutcome, FrameError> {
        Ok(SchemeOutcome::Delta(self.delta.clone()))
    }
}
