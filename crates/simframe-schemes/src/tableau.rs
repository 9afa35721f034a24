//! Butcher tableaux and stage evaluation.
//!
//! A tableau with `s` stages defines
//!
//! ```text
//! k_i = f(x0 + c_i·dx, Y0 + dx·Σ_j a_ij·k_j)     j < i
//! ΔY  = dx·Σ_i b_i·k_i
//! ```
//!
//! Embedded pairs add error weights `e_i = b_i − b*_i`, the difference
//! between the propagated solution and a lower-order companion.

use simframe_core::{FrameError, Value};
use simframe_engine::SchemeContext;

/// Coefficients of an explicit Runge–Kutta method.
///
/// `a[i]` holds the `i` coefficients of stage `i` (so `a[0]` is empty).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ButcherTableau {
    /// Short name, reported in metrics.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Order of the propagated solution.
    pub order: u8,
    /// Stage nodes.
    pub c: &'static [f64],
    /// Strictly lower-triangular stage coefficients.
    pub a: &'static [&'static [f64]],
    /// Solution weights.
    pub b: &'static [f64],
    /// Embedded error weights, for adaptive pairs.
    pub e: Option<&'static [f64]>,
}

impl ButcherTableau {
    /// Number of stages.
    pub fn stages(&self) -> usize {
        self.b.len()
    }

    /// Whether the tableau is well formed: matching lengths, a strictly
    /// lower-triangular `a`, and `Σ b_i = 1`.
    pub fn is_consistent(&self) -> bool {
        let s = self.stages();
        let shape_ok = self.c.len() == s
            && self.a.len() == s
            && self.a.iter().enumerate().all(|(i, row)| row.len() == i)
            && self.e.is_none_or(|e| e.len() == s);
        let sum: f64 = self.b.iter().sum();
        shape_ok && (sum - 1.0).abs() < 1e-12
    }

    /// Evaluates every stage derivative from the context's start state.
    ///
    /// The first stage uses the derivative at `(x0, Y0)`.
    pub fn stages_at(&self, ctx: &mut SchemeContext<'_>, dx: f64) -> Result<Vec<Value>, FrameError> {
        let mut k = Vec::with_capacity(self.stages());
        k.push(ctx.initial_derivative()?);
        for i in 1..self.stages() {
            let mut y = ctx.y0().clone();
            for (kj, &aij) in k.iter().zip(self.a[i]) {
                if aij != 0.0 {
                    y += &(kj * (aij * dx));
                }
            }
            let x = ctx.x0() + self.c[i] * dx;
            k.push(ctx.derivative(x, &y)?);
        }
        Ok(k)
    }

    /// `dx·Σ w_i·k_i` for the given weights.
    pub fn combine(weights: &[f64], k: &[Value], dx: f64) -> Value {
        let mut out = k[0].zeros_like();
        for (ki, &w) in k.iter().zip(weights) {
            if w != 0.0 {
                out += &(ki * (w * dx));
            }
        }
        out
    }
}
