//! Implicit schemes for stiff problems.
//!
//! These schemes linearize around the start state using the target's
//! Jacobian `J`, so they are exact for linear systems `dY/dx = J·Y` and
//! require a jacobinator on the target field.

use nalgebra::DMatrix;
use simframe_core::{FrameError, Value};
use simframe_engine::{Scheme, SchemeContext, SchemeOutcome};
use tracing::debug;

use crate::gmres::{self, GmresOptions};

/// How the linear system of an implicit step is solved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LinearSolver {
    /// LU decomposition. A singular matrix is an error.
    Direct,
    /// Restarted GMRES. Nonconvergence rejects the step.
    Gmres(GmresOptions),
}

/// Backward Euler: `(I − dx·J(x0 + dx))·Y1 = Y0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImplicitEuler {
    solver: LinearSolver,
}

impl ImplicitEuler {
    /// Backward Euler solved by LU decomposition.
    pub fn direct() -> Self {
        Self {
            solver: LinearSolver::Direct,
        }
    }

    /// Backward Euler solved by GMRES.
    pub fn gmres(options: GmresOptions) -> Result<Self, FrameError> {
        options.validate()?;
        Ok(Self {
            solver: LinearSolver::Gmres(options),
        })
    }

    /// Backward Euler solved by GMRES with [`GmresOptions::default`].
    pub fn default_gmres() -> Self {
        Self {
            solver: LinearSolver::Gmres(GmresOptions::default()),
        }
    }

    /// The linear solver in use.
    pub fn solver(&self) -> &LinearSolver {
        &self.solver
    }
}

impl Scheme for ImplicitEuler {
    fn name(&self) -> &str {
        match self.solver {
            LinearSolver::Direct => "implicit-euler",
            LinearSolver::Gmres(_) => "implicit-euler-gmres",
        }
    }

    fn description(&self) -> &str {
        match self.solver {
            LinearSolver::Direct => "Implicit 1st-order Euler method with direct solver",
            LinearSolver::Gmres(_) => "Implicit 1st-order Euler method with GMRES solver",
        }
    }

    fn step(&self, ctx: &mut SchemeContext<'_>, dx: f64) -> Result<SchemeOutcome, FrameError> {
        let jac = ctx.jacobian(ctx.x0() + dx)?;
        let y0 = ctx.y0().to_dvector();
        let a = system_matrix(&jac, dx);

        let y1 = match self.solver {
            LinearSolver::Direct => a.lu().solve(&y0).ok_or_else(|| {
                FrameError::SingularMatrix {
                    field: ctx.target_name(),
                }
            })?,
            LinearSolver::Gmres(options) => match gmres::solve(&a, &y0, &y0, &options) {
                Ok(solution) => solution.x,
                Err(err) => {
                    debug!(field = %ctx.target_name(), dx, %err, "implicit step rejected");
                    return Ok(SchemeOutcome::Rejected);
                }
            },
        };
        let delta = Value::from_dvector(ctx.y0().shape(), &(y1 - y0))?;
        Ok(SchemeOutcome::Delta(delta))
    }
}

/// Implicit midpoint, linearized:
/// `k = (I − dx/2·J(x0 + dx/2))⁻¹·J·Y0`, `ΔY = dx·k`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ImplicitMidpoint;

impl ImplicitMidpoint {
    /// Implicit midpoint solved by LU decomposition.
    pub fn direct() -> Self {
        Self
    }
}

impl Scheme for ImplicitMidpoint {
    fn name(&self) -> &str {
        "implicit-midpoint"
    }

    fn description(&self) -> &str {
        "Implicit 2nd-order midpoint method with direct solver"
    }

    fn step(&self, ctx: &mut SchemeContext<'_>, dx: f64) -> Result<SchemeOutcome, FrameError> {
        let jac = ctx.jacobian(ctx.x0() + 0.5 * dx)?;
        let y0 = ctx.y0().to_dvector();
        let a = system_matrix(&jac, 0.5 * dx);
        let rhs = &jac * &y0;
        let k = a.lu().solve(&rhs).ok_or_else(|| FrameError::SingularMatrix {
            field: ctx.target_name(),
        })?;
        let delta = Value::from_dvector(ctx.y0().shape(), &(k * dx))?;
        Ok(SchemeOutcome::Delta(delta))
    }
}

/// `I − h·J`.
fn system_matrix(jac: &DMatrix<f64>, h: f64) -> DMatrix<f64> {
    let n = jac.nrows();
    DMatrix::identity(n, n) - jac * h
}
