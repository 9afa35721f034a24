//! Integrator configuration and validation.
//!
//! [`IntegratorConfig`] is the builder-input for an
//! [`Integrator`](crate::Integrator). [`validate()`](IntegratorConfig::validate)
//! checks structural invariants; handles are checked against a frame by
//! [`Frame::set_integrator`](crate::Frame::set_integrator).

use simframe_core::{FrameError, IntVarId};

use crate::instruction::Instruction;
use crate::updater::{HookFn, UpdateRule};

/// Everything needed to build an integrator.
#[derive(Debug)]
pub struct IntegratorConfig {
    /// The control variable advanced by each step.
    pub var: IntVarId,
    /// Instructions run in order within every attempt.
    pub instructions: Vec<Instruction>,
    /// Runs once before the first attempt of each step.
    pub preparator: UpdateRule<HookFn>,
    /// Runs once after a step has been committed.
    pub finalizer: UpdateRule<HookFn>,
    /// Runs after every rejected attempt.
    pub failop: UpdateRule<HookFn>,
    /// Maximum number of rejected attempts per step. Default: 500.
    pub maxit: u32,
    /// Free-form description.
    pub description: String,
}

impl IntegratorConfig {
    /// Default retry budget per step.
    pub const DEFAULT_MAXIT: u32 = 500;

    /// A configuration for `var` with no instructions and no-op hooks.
    pub fn new(var: IntVarId) -> Self {
        Self {
            var,
            instructions: Vec::new(),
            preparator: UpdateRule::NoOp,
            finalizer: UpdateRule::NoOp,
            failop: UpdateRule::NoOp,
            maxit: Self::DEFAULT_MAXIT,
            description: String::new(),
        }
    }

    /// Appends an instruction.
    pub fn with_instruction(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    /// Sets the retry budget.
    pub fn with_maxit(mut self, maxit: u32) -> Self {
        self.maxit = maxit;
        self
    }

    /// Sets the preparator hook.
    pub fn with_preparator(mut self, rule: impl Into<UpdateRule<HookFn>>) -> Self {
        self.preparator = rule.into();
        self
    }

    /// Sets the finalizer hook.
    pub fn with_finalizer(mut self, rule: impl Into<UpdateRule<HookFn>>) -> Self {
        self.finalizer = rule.into();
        self
    }

    /// Sets the failure hook.
    pub fn with_failop(mut self, rule: impl Into<UpdateRule<HookFn>>) -> Self {
        self.failop = rule.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check structural invariants.
    ///
    /// Returns `Ok(())` if the retry budget is positive.
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.maxit == 0 {
            return Err(FrameError::configuration("maxit must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = IntegratorConfig::new(IntVarId(0));
        assert_eq!(config.maxit, 500);
        assert!(config.instructions.is_empty());
        assert!(config.preparator.is_noop());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_maxit_is_rejected() {
        let config = IntegratorConfig::new(IntVarId(0)).with_maxit(0);
        assert!(matches!(
            config.validate(),
            Err(FrameError::Configuration { .. })
        ));
    }
}
