//! Restarted GMRES for dense linear systems.
//!
//! Solves `A·x = b` by building an orthonormal Krylov basis with modified
//! Gram–Schmidt and minimizing the residual through Givens rotations.
//! After `restart` inner iterations the basis is discarded and the solve
//! restarts from the current iterate, at most `max_restarts` times.

use nalgebra::{DMatrix, DVector};
use simframe_core::FrameError;
use thiserror::Error;

/// Errors from [`solve`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum GmresError {
    /// The residual stayed above tolerance within the iteration budget.
    #[error("GMRES did not converge: residual {residual} above tolerance {tolerance}")]
    NotConverged {
        /// Final residual norm.
        residual: f64,
        /// Required residual norm.
        tolerance: f64,
    },
    /// `A`, `b`, and the initial guess disagree in dimension.
    #[error("dimension mismatch: matrix is {rows}x{cols}, vectors have length {len}")]
    DimensionMismatch {
        /// Matrix rows.
        rows: usize,
        /// Matrix columns.
        cols: usize,
        /// Length of `b` (or the initial guess when `b` matches).
        len: usize,
    },
}

/// Solver tolerances and iteration budget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GmresOptions {
    /// Relative tolerance on `‖b − A·x‖ / ‖b‖`. Default: 1e-5.
    pub rtol: f64,
    /// Absolute tolerance on `‖b − A·x‖`. Default: 0.
    pub atol: f64,
    /// Inner iterations between restarts. Default: 20.
    pub restart: usize,
    /// Maximum number of restart cycles. Default: 10.
    pub max_restarts: usize,
}

impl Default for GmresOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 0.0,
            restart: 20,
            max_restarts: 10,
        }
    }
}

impl GmresOptions {
    /// Sets the relative tolerance.
    pub fn with_rtol(mut self, rtol: f64) -> Self {
        self.rtol = rtol;
        self
    }

    /// Sets the absolute tolerance.
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// Sets the restart length.
    pub fn with_restart(mut self, restart: usize) -> Self {
        self.restart = restart;
        self
    }

    /// Sets the number of restart cycles.
    pub fn with_max_restarts(mut self, max_restarts: usize) -> Self {
        self.max_restarts = max_restarts;
        self
    }

    /// Check the options.
    ///
    /// Returns `Ok(())` if both tolerances are non-negative, at least one
    /// is positive, and both iteration counts are at least 1.
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.rtol < 0.0 || self.atol < 0.0 || self.rtol.is_nan() || self.atol.is_nan() {
            return Err(FrameError::configuration(
                "GMRES tolerances must be non-negative",
            ));
        }
        if self.rtol == 0.0 && self.atol == 0.0 {
            return Err(FrameError::configuration(
                "GMRES needs a positive rtol or atol",
            ));
        }
        if self.restart == 0 || self.max_restarts == 0 {
            return Err(FrameError::configuration(
                "GMRES restart and max_restarts must be at least 1",
            ));
        }
        Ok(())
    }
}

/// A converged solve.
#[derive(Clone, Debug, PartialEq)]
pub struct GmresSolution {
    /// The solution vector.
    pub x: DVector<f64>,
    /// Total inner iterations.
    pub iterations: usize,
    /// Final residual norm.
    pub residual: f64,
}

/// Solves `a·x = b` starting from `x0`.
pub fn solve(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    x0: &DVector<f64>,
    options: &GmresOptions,
) -> Result<GmresSolution, GmresError> {
    let n = b.len();
    if a.nrows() != n || a.ncols() != n || x0.len() != n {
        return Err(GmresError::DimensionMismatch {
            rows: a.nrows(),
            cols: a.ncols(),
            len: if b.len() == a.nrows() { x0.len() } else { b.len() },
        });
    }

    let tolerance = (options.rtol * b.norm()).max(options.atol);
    let m = options.restart.clamp(1, n.max(1));
    let mut x = x0.clone();
    let mut iterations = 0;

    for _ in 0..options.max_restarts {
        let r = b - a * &x;
        let beta = r.norm();
        if beta <= tolerance {
            return Ok(GmresSolution {
                x,
                iterations,
                residual: beta,
            });
        }

        let mut basis: Vec<DVector<f64>> = Vec::with_capacity(m + 1);
        basis.push(r / beta);
        let mut h = DMatrix::<f64>::zeros(m + 1, m);
        let mut cs = vec![0.0; m];
        let mut sn = vec![0.0; m];
        let mut g = DVector::<f64>::zeros(m + 1);
        g[0] = beta;

        let mut k = 0;
        for j in 0..m {
            let mut w = a * &basis[j];
            for (i, v) in basis.iter().enumerate() {
                let hij = w.dot(v);
                h[(i, j)] = hij;
                w -= v * hij;
            }
            let wnorm = w.norm();
            h[(j + 1, j)] = wnorm;

            for i in 0..j {
                let upper = cs[i] * h[(i, j)] + sn[i] * h[(i + 1, j)];
                h[(i + 1, j)] = -sn[i] * h[(i, j)] + cs[i] * h[(i + 1, j)];
                h[(i, j)] = upper;
            }
            let denom = h[(j, j)].hypot(h[(j + 1, j)]);
            let (c, s) = if denom == 0.0 {
                (1.0, 0.0)
            } else {
                (h[(j, j)] / denom, h[(j + 1, j)] / denom)
            };
            cs[j] = c;
            sn[j] = s;
            h[(j, j)] = c * h[(j, j)] + s * h[(j + 1, j)];
            h[(j + 1, j)] = 0.0;
            g[j + 1] = -s * g[j];
            g[j] *= c;

            k = j + 1;
            iterations += 1;
            if g[j + 1].abs() <= tolerance || wnorm == 0.0 {
                break;
            }
            basis.push(w / wnorm);
        }

        // Back-substitute the upper-triangular k×k system H·y = g.
        let mut y = vec![0.0; k];
        for i in (0..k).rev() {
            if h[(i, i)] == 0.0 {
                return Err(GmresError::NotConverged {
                    residual: beta,
                    tolerance,
                });
            }
            let tail: f64 = (i + 1..k).map(|l| h[(i, l)] * y[l]).sum();
            y[i] = (g[i] - tail) / h[(i, i)];
        }
        for (v, &yi) in basis.iter().zip(&y) {
            x += v * yi;
        }
    }

    let residual = (b - a * &x).norm();
    if residual <= tolerance {
        Ok(GmresSolution {
            x,
            iterations,
            residual,
        })
    } else {
        Err(GmresError::NotConverged {
            residual,
            tolerance,
        })
    }
}
