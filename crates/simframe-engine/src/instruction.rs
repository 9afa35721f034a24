//! Instructions: one scheme bound to one target field.

use std::fmt;

use simframe_core::{FieldId, FrameError, IntVarId, Value};
use tracing::warn;

use crate::frame::Frame;
use crate::scheme::{Scheme, SchemeContext, SchemeOutcome};

/// Status of one instruction within an attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InstructionStatus {
    /// An increment was staged in the buffer.
    Staged,
    /// The scheme accepted the step without an increment.
    Accepted,
    /// The scheme rejected the step.
    Rejected,
}

impl InstructionStatus {
    /// Whether the instruction succeeded.
    pub fn is_success(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Binds a [`Scheme`] to a target field and a step fraction.
///
/// The scheme is invoked with `fstep · dx`. Results are staged in the
/// instruction's own buffer and only committed by the integrator once every
/// instruction of the round has succeeded.
pub struct Instruction {
    scheme: Box<dyn Scheme>,
    target: FieldId,
    fstep: f64,
    description: String,
    buffer: Option<Value>,
}

impl Instruction {
    /// Binds `scheme` to `target` with a step fraction of 1.
    pub fn new(scheme: impl Scheme + 'static, target: FieldId) -> Self {
        Self::from_boxed(Box::new(scheme), target)
    }

    /// Binds an already boxed scheme.
    pub fn from_boxed(scheme: Box<dyn Scheme>, target: FieldId) -> Self {
        Self {
            scheme,
            target,
            fstep: 1.0,
            description: String::new(),
            buffer: None,
        }
    }

    /// Sets the step fraction. Values outside `(0, 1]` are accepted with a
    /// warning.
    pub fn with_fstep(mut self, fstep: f64) -> Self {
        if !(fstep > 0.0 && fstep <= 1.0) {
            warn!(
                scheme = self.scheme.name(),
                fstep, "fstep should lie in (0, 1]"
            );
        }
        self.fstep = fstep;
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The bound scheme.
    pub fn scheme(&self) -> &dyn Scheme {
        self.scheme.as_ref()
    }

    /// The scheme's name.
    pub fn name(&self) -> &str {
        self.scheme.name()
    }

    /// The field this instruction advances.
    pub fn target(&self) -> FieldId {
        self.target
    }

    /// Fraction of the integrator's step this instruction takes.
    pub fn fstep(&self) -> f64 {
        self.fstep
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The staged increment, if any.
    pub fn buffer(&self) -> Option<&Value> {
        self.buffer.as_ref()
    }

    pub(crate) fn clear_buffer(&mut self) {
        self.buffer = None;
    }

    pub(crate) fn take_buffer(&mut self) -> Option<Value> {
        self.buffer.take()
    }

    /// Evaluates the scheme for a step of `fstep · dx` and stages the
    /// result.
    pub fn execute(
        &mut self,
        frame: &mut Frame,
        var: IntVarId,
        dx: f64,
    ) -> Result<InstructionStatus, FrameError> {
        let mut ctx = SchemeContext::new(frame, var, self.target)?;
        match self.scheme.step(&mut ctx, self.fstep * dx)? {
            SchemeOutcome::Rejected => Ok(InstructionStatus::Rejected),
            SchemeOutcome::Accepted => Ok(InstructionStatus::Accepted),
            SchemeOutcome::Delta(delta) => {
                if !delta.same_shape(ctx.y0()) {
                    return Err(FrameError::ShapeMismatch {
                        field: ctx.target_name(),
                        expected: ctx.y0().shape().to_vec(),
                        found: delta.shape().to_vec(),
                    });
                }
                self.buffer = Some(delta);
                Ok(InstructionStatus::Staged)
            }
        }
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instruction")
            .field("scheme", &self.scheme.name())
            .field("target", &self.target)
            .field("fstep", &self.fstep)
            .field("staged", &self.buffer.is_some())
            .finish()
    }
}
