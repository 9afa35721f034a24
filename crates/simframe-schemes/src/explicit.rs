//! Fixed-step explicit Runge–Kutta schemes.

use simframe_core::FrameError;
use simframe_engine::{Scheme, SchemeContext, SchemeOutcome};

use crate::tableau::ButcherTableau;

// ── Tableaux ────────────────────────────────────────────────────

/// Forward Euler.
pub const EULER: ButcherTableau = ButcherTableau {
    name: "euler",
    description: "Explicit 1st-order Euler method",
    order: 1,
    c: &[0.0],
    a: &[&[]],
    b: &[1.0],
    e: None,
};

/// Explicit midpoint.
pub const MIDPOINT: ButcherTableau = ButcherTableau {
    name: "midpoint",
    description: "Explicit 2nd-order midpoint method",
    order: 2,
    c: &[0.0, 0.5],
    a: &[&[], &[0.5]],
    b: &[0.0, 1.0],
    e: None,
};

/// Heun's second-order method (explicit trapezoid).
pub const HEUN2: ButcherTableau = ButcherTableau {
    name: "heun2",
    description: "Explicit 2nd-order Heun method",
    order: 2,
    c: &[0.0, 1.0],
    a: &[&[], &[1.0]],
    b: &[0.5, 0.5],
    e: None,
};

/// Ralston's second-order method.
pub const RALSTON2: ButcherTableau = ButcherTableau {
    name: "ralston2",
    description: "Explicit 2nd-order Ralston method",
    order: 2,
    c: &[0.0, 2.0 / 3.0],
    a: &[&[], &[2.0 / 3.0]],
    b: &[0.25, 0.75],
    e: None,
};

/// Kutta's third-order method.
pub const KUTTA3: ButcherTableau = ButcherTableau {
    name: "kutta3",
    description: "Explicit 3rd-order Kutta method",
    order: 3,
    c: &[0.0, 0.5, 1.0],
    a: &[&[], &[0.5], &[-1.0, 2.0]],
    b: &[1.0 / 6.0, 2.0 / 3.0, 1.0 / 6.0],
    e: None,
};

/// Heun's third-order method.
pub const HEUN3: ButcherTableau = ButcherTableau {
    name: "heun3",
    description: "Explicit 3rd-order Heun method",
    order: 3,
    c: &[0.0, 1.0 / 3.0, 2.0 / 3.0],
    a: &[&[], &[1.0 / 3.0], &[0.0, 2.0 / 3.0]],
    b: &[0.25, 0.0, 0.75],
    e: None,
};

/// Ralston's third-order method.
pub const RALSTON3: ButcherTableau = ButcherTableau {
    name: "ralston3",
    description: "Explicit 3rd-order Ralston method",
    order: 3,
    c: &[0.0, 0.5, 0.75],
    a: &[&[], &[0.5], &[0.0, 0.75]],
    b: &[2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0],
    e: None,
};

/// Third-order strong-stability-preserving Runge–Kutta.
pub const SSPRK3: ButcherTableau = ButcherTableau {
    name: "ssprk3",
    description: "Explicit 3rd-order strong stability preserving Runge-Kutta method",
    order: 3,
    c: &[0.0, 1.0, 0.5],
    a: &[&[], &[1.0], &[0.25, 0.25]],
    b: &[1.0 / 6.0, 1.0 / 6.0, 2.0 / 3.0],
    e: None,
};

/// The classical fourth-order Runge–Kutta method.
pub const RK4: ButcherTableau = ButcherTableau {
    name: "rk4",
    description: "Explicit 4th-order classical Runge-Kutta method",
    order: 4,
    c: &[0.0, 0.5, 0.5, 1.0],
    a: &[&[], &[0.5], &[0.0, 0.5], &[0.0, 0.0, 1.0]],
    b: &[1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
    e: None,
};

/// Kutta's 3/8-rule.
pub const RULE38: ButcherTableau = ButcherTableau {
    name: "rk4-3/8",
    description: "Explicit 4th-order 3/8-rule Runge-Kutta method",
    order: 4,
    c: &[0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0],
    a: &[&[], &[1.0 / 3.0], &[-1.0 / 3.0, 1.0], &[1.0, -1.0, 1.0]],
    b: &[0.125, 0.375, 0.375, 0.125],
    e: None,
};

/// Ralston's fourth-order method with minimum truncation error.
/// Coefficients are rounded to eight decimals.
pub const RALSTON4: ButcherTableau = ButcherTableau {
    name: "ralston4",
    description: "Explicit 4th-order Ralston method",
    order: 4,
    c: &[0.0, 0.4, 0.45573725, 1.0],
    a: &[
        &[],
        &[0.4],
        &[0.29697761, 0.15875964],
        &[0.21810040, -3.05096516, 3.83286476],
    ],
    b: &[0.17476028, -0.55148066, 1.20553560, 0.17118478],
    e: None,
};

// ── Scheme ──────────────────────────────────────────────────────

/// A fixed-step explicit scheme. Always stages a delta.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExplicitScheme {
    tableau: &'static ButcherTableau,
}

impl ExplicitScheme {
    /// A scheme over any explicit tableau.
    pub fn new(tableau: &'static ButcherTableau) -> Self {
        Self { tableau }
    }

    /// The underlying tableau.
    pub fn tableau(&self) -> &'static ButcherTableau {
        self.tableau
    }

    /// Forward Euler (order 1).
    pub fn euler() -> Self {
        Self::new(&EULER)
    }

    /// Explicit midpoint (order 2).
    pub fn midpoint() -> Self {
        Self::new(&MIDPOINT)
    }

    /// Heun (order 2).
    pub fn heun2() -> Self {
        Self::new(&HEUN2)
    }

    /// Ralston (order 2).
    pub fn ralston2() -> Self {
        Self::new(&RALSTON2)
    }

    /// Kutta (order 3).
    pub fn kutta3() -> Self {
        Self::new(&KUTTA3)
    }

    /// Heun (order 3).
    pub fn heun3() -> Self {
        Self::new(&HEUN3)
    }

    /// Ralston (order 3).
    pub fn ralston3() -> Self {
        Self::new(&RALSTON3)
    }

    /// SSPRK3 (order 3).
    pub fn ssprk3() -> Self {
        Self::new(&SSPRK3)
    }

    /// Classical Runge–Kutta (order 4).
    pub fn rk4() -> Self {
        Self::new(&RK4)
    }

    /// 3/8-rule (order 4).
    pub fn rule38() -> Self {
        Self::new(&RULE38)
    }

    /// Ralston (order 4).
    pub fn ralston4() -> Self {
        Self::new(&RALSTON4)
    }
}

impl Scheme for ExplicitScheme {
    fn name(&self) -> &str {
        self.tableau.name
    }

    fn description(&self) -> &str {
        self.tableau.description
    }

    fn step(&self, ctx: &mut SchemeContext<'_>, dx: f64) -> Result<SchemeOutcome, FrameError> {
        let k = self.tableau.stages_at(ctx, dx)?;
        Ok(SchemeOutcome::Delta(ButcherTableau::combine(
            self.tableau.b,
            &k,
            dx,
        )))
    }
}
