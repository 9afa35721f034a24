//! The scheme protocol: one numerical formula advancing one field.

use simframe_core::{FieldId, FrameError, IntVarId, Jacobian, Value};

use crate::frame::Frame;

/// Result of one scheme evaluation.
#[derive(Clone, Debug, PartialEq)]
pub enum SchemeOutcome {
    /// The step succeeded; stage this increment of the target's value.
    Delta(Value),
    /// The step succeeded without changing the target.
    Accepted,
    /// The step was rejected (error estimate too large, or an iterative
    /// solver did not converge). The integrator retries the round.
    Rejected,
}

/// A numerical integration formula.
///
/// Schemes are stateless: per-instance options live in the scheme value,
/// per-step state lives in the [`SchemeContext`].
///
/// # Contract
///
/// - `step` must not write field values; it only evaluates derivatives
///   and Jacobians through the context and returns an outcome.
/// - Adaptive schemes report their preferred next step with
///   [`SchemeContext::suggest`], on acceptance and on rejection.
pub trait Scheme {
    /// Human-readable name, used in logs and metrics.
    fn name(&self) -> &str;

    /// Longer description, empty by default.
    fn description(&self) -> &str {
        ""
    }

    /// Advances the target by `dx` from the context's starting state.
    fn step(&self, ctx: &mut SchemeContext<'_>, dx: f64) -> Result<SchemeOutcome, FrameError>;
}

/// Everything a scheme sees during one evaluation.
///
/// The starting state `(x0, y0)` is captured when the context is built and
/// reflects only committed values.
pub struct SchemeContext<'a> {
    frame: &'a mut Frame,
    var: IntVarId,
    target: FieldId,
    x0: f64,
    y0: Value,
}

impl<'a> SchemeContext<'a> {
    /// Captures the current control value and target value.
    pub fn new(frame: &'a mut Frame, var: IntVarId, target: FieldId) -> Result<Self, FrameError> {
        let x0 = frame.control_value(var)?;
        let y0 = frame.value(target)?.clone();
        Ok(Self {
            frame,
            var,
            target,
            x0,
            y0,
        })
    }

    /// Control value at the start of the step.
    pub fn x0(&self) -> f64 {
        self.x0
    }

    /// Target value at the start of the step.
    pub fn y0(&self) -> &Value {
        &self.y0
    }

    /// The field being advanced.
    pub fn target(&self) -> FieldId {
        self.target
    }

    /// The control variable.
    pub fn var(&self) -> IntVarId {
        self.var
    }

    /// Read access to the whole frame.
    pub fn frame(&self) -> &Frame {
        &*self.frame
    }

    /// The target field's name, for error reporting.
    pub fn target_name(&self) -> String {
        self.frame
            .field(self.target)
            .map(|f| f.name().to_string())
            .unwrap_or_else(|_| self.target.to_string())
    }

    /// Derivative of the target at `x` for state `y`.
    pub fn derivative(&mut self, x: f64, y: &Value) -> Result<Value, FrameError> {
        self.frame.derivative(self.target, x, y)
    }

    /// Derivative of the target at the starting state.
    pub fn initial_derivative(&mut self) -> Result<Value, FrameError> {
        self.frame.derivative(self.target, self.x0, &self.y0)
    }

    /// Jacobian of the target at `x`. Fails with
    /// [`FrameError::MissingJacobian`] when no jacobinator is set.
    pub fn jacobian(&mut self, x: f64) -> Result<Jacobian, FrameError> {
        match self.frame.jacobian(self.target, x)? {
            Some(jac) => Ok(jac),
            None => Err(FrameError::MissingJacobian {
                field: self.target_name(),
            }),
        }
    }

    /// Proposes a step size for the next attempt.
    pub fn suggest(&mut self, dx: f64) -> Result<(), FrameError> {
        self.frame.suggest(self.var, dx, false)
    }
}
