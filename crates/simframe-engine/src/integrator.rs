//! The integrator: one control-variable advance with retry and atomic
//! commit.
//!
//! Each call to [`Integrator::integrate`] moves through
//! `Preparing → Attempting → (Retrying ↔ Attempting) → Committing →
//! Finalized`:
//!
//! 1. The preparator fires.
//! 2. An attempt fixes the trial step from the control variable, clears
//!    `suggested` and every instruction buffer, then runs every
//!    instruction in order.
//! 3. If any instruction rejected, the failop fires and a new attempt
//!    starts, up to `maxit` rejected attempts.
//! 4. Otherwise all staged increments are validated, then applied
//!    together, and the step is recorded as `prev_stepsize`.
//! 5. The finalizer fires.

use std::time::Instant;

use indexmap::map::Entry;
use indexmap::IndexMap;
use simframe_core::{FieldId, FrameError, IntVarId, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::IntegratorConfig;
use crate::frame::Frame;
use crate::instruction::{Instruction, InstructionStatus};
use crate::metrics::IntegrationMetrics;
use crate::updater::{HookFn, UpdateRule};

// ── Errors ──────────────────────────────────────────────────────

/// Errors from an integration step.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum IntegrationError {
    /// Every attempt in the retry budget was rejected. Nothing was
    /// committed.
    #[error("integration gave up after {attempts} rejected attempts")]
    Exhausted {
        /// Rejected attempts made.
        attempts: u32,
    },
    /// The frame has no integrator installed.
    #[error("frame has no integrator")]
    NoIntegrator,
    /// A data-model or callback error, propagated unchanged.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

// ── Integrator ──────────────────────────────────────────────────

/// Drives one advance of the control variable across all instructions.
#[derive(Debug)]
pub struct Integrator {
    var: IntVarId,
    instructions: Vec<Instruction>,
    preparator: UpdateRule<HookFn>,
    finalizer: UpdateRule<HookFn>,
    failop: UpdateRule<HookFn>,
    maxit: u32,
    description: String,
    last_metrics: IntegrationMetrics,
}

impl Integrator {
    /// Builds an integrator from a validated configuration.
    pub fn new(config: IntegratorConfig) -> Result<Self, FrameError> {
        config.validate()?;
        Ok(Self {
            var: config.var,
            instructions: config.instructions,
            preparator: config.preparator,
            finalizer: config.finalizer,
            failop: config.failop,
            maxit: config.maxit,
            description: config.description,
            last_metrics: IntegrationMetrics::default(),
        })
    }

    /// The control variable.
    pub fn var(&self) -> IntVarId {
        self.var
    }

    /// Instructions in execution order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Retry budget per step.
    pub fn maxit(&self) -> u32 {
        self.maxit
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Metrics from the most recent successful step.
    pub fn last_metrics(&self) -> &IntegrationMetrics {
        &self.last_metrics
    }

    /// Advances every instruction's target by one accepted step.
    ///
    /// Rejected attempts are retried; any other error propagates
    /// immediately. On [`IntegrationError::Exhausted`] no field has been
    /// modified by this step.
    pub fn integrate(&mut self, frame: &mut Frame) -> Result<IntegrationMetrics, IntegrationError> {
        let step_start = Instant::now();

        // 1. Prepare.
        self.preparator.beat(frame)?;

        let mut rejected = 0u32;
        loop {
            // 2. Attempt: fix the trial step, then reset negotiation state.
            let stepsize = frame.stepsize(self.var)?;
            frame.intvar_mut(self.var)?.clear_suggested();
            for instruction in &mut self.instructions {
                instruction.clear_buffer();
            }

            let mut accepted = true;
            let mut instruction_us = Vec::with_capacity(self.instructions.len());
            for instruction in &mut self.instructions {
                let inst_start = Instant::now();
                let status = instruction.execute(frame, self.var, stepsize)?;
                instruction_us.push((
                    instruction.name().to_string(),
                    inst_start.elapsed().as_micros() as u64,
                ));
                if status == InstructionStatus::Rejected {
                    accepted = false;
                }
            }

            if accepted {
                // 4. Commit.
                self.commit(frame)?;
                frame.intvar_mut(self.var)?.prev_stepsize = Some(stepsize);

                // 5. Finalize.
                self.finalizer.beat(frame)?;

                let metrics = IntegrationMetrics {
                    attempts: rejected + 1,
                    rejected_attempts: rejected,
                    stepsize,
                    total_us: step_start.elapsed().as_micros() as u64,
                    instruction_us,
                };
                self.last_metrics = metrics.clone();
                return Ok(metrics);
            }

            // 3. Retry.
            debug!(attempt = rejected + 1, stepsize, "integration attempt rejected");
            self.failop.beat(frame)?;
            rejected += 1;
            if rejected >= self.maxit {
                return Err(IntegrationError::Exhausted { attempts: rejected });
            }
        }
    }

    /// Applies every staged increment, or none of them.
    fn commit(&mut self, frame: &mut Frame) -> Result<(), FrameError> {
        let mut staged: IndexMap<FieldId, Value> = IndexMap::new();
        for instruction in &mut self.instructions {
            let Some(delta) = instruction.take_buffer() else {
                continue;
            };
            match staged.entry(instruction.target()) {
                Entry::Occupied(mut entry) => *entry.get_mut() += &delta,
                Entry::Vacant(entry) => {
                    let updated = frame.value(instruction.target())? + &delta;
                    entry.insert(updated);
                }
            }
        }

        for (&id, value) in &staged {
            frame.field(id)?.check_write(value)?;
        }
        for (id, value) in staged {
            frame.field_mut(id)?.value = value;
        }
        debug!("integration step committed");
        Ok(())
    }
}
