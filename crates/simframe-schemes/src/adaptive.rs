//! Adaptive embedded Runge–Kutta pairs.
//!
//! Each step computes the propagated solution and a scaled error estimate
//!
//! ```text
//! e = max_i |dx·Σ_j e_j·k_j|_i / (|Y0|_i + |dx·k0|_i) / eps
//! ```
//!
//! where zero scales are replaced by `1e100` so elements crossing zero do
//! not dominate. If `e ≤ 1` the step is staged and a larger next step is
//! suggested; otherwise the step is rejected with a smaller suggestion.

use simframe_core::{FrameError, IntVarId, Value};
use simframe_engine::{Scheme, SchemeContext, SchemeOutcome, StepsizeFn, UpdateRule};
use tracing::debug;

use crate::tableau::ButcherTableau;

/// Scale substituted for elements whose scale is exactly zero.
const ZERO_SCALE: f64 = 1e100;

/// Growth factor used when the error is far below tolerance.
const MAX_GROWTH: f64 = 5.0;

/// Smallest shrink factor applied after a rejection.
const MIN_SHRINK: f64 = 0.1;

// ── Controller ──────────────────────────────────────────────────

/// Step size control parameters.
///
/// Defaults depend on the scheme's order; see the associated constants.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdaptiveController {
    /// Desired maximum relative error. Default: 0.1.
    pub eps: f64,
    /// Safety factor applied to every step change. Default: 0.9.
    pub safety: f64,
    /// Below this scaled error the step grows by the fixed factor 5.
    pub econ: f64,
    /// Exponent for growing the step after acceptance.
    pub pgrow: f64,
    /// Exponent for shrinking the step after rejection.
    pub pshrink: f64,
}

impl AdaptiveController {
    /// Defaults for second-order pairs.
    pub const SECOND_ORDER: Self = Self {
        eps: 0.1,
        safety: 0.9,
        econ: 0.0324,
        pgrow: -0.5,
        pshrink: -1.0,
    };

    /// Defaults for third-order pairs.
    pub const THIRD_ORDER: Self = Self {
        eps: 0.1,
        safety: 0.9,
        econ: 0.005832,
        pgrow: -1.0 / 3.0,
        pshrink: -0.5,
    };

    /// Defaults for fifth-order pairs.
    pub const FIFTH_ORDER: Self = Self {
        eps: 0.1,
        safety: 0.9,
        econ: 1.889568e-4,
        pgrow: -0.2,
        pshrink: -0.25,
    };

    /// Sets the error tolerance.
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Sets the safety factor.
    pub fn with_safety(mut self, safety: f64) -> Self {
        self.safety = safety;
        self
    }

    /// Check the parameters.
    ///
    /// Returns `Ok(())` if `eps` is positive, `safety` lies in `(0, 1]`,
    /// and both exponents are negative.
    pub fn validate(&self) -> Result<(), FrameError> {
        if !(self.eps > 0.0 && self.eps.is_finite()) {
            return Err(FrameError::configuration(format!(
                "eps must be positive and finite, got {}",
                self.eps
            )));
        }
        if !(self.safety > 0.0 && self.safety <= 1.0) {
            return Err(FrameError::configuration(format!(
                "safety must be in (0, 1], got {}",
                self.safety
            )));
        }
        if !(self.pgrow < 0.0 && self.pshrink < 0.0) {
            return Err(FrameError::configuration(
                "pgrow and pshrink must be negative",
            ));
        }
        Ok(())
    }

    /// The scaled error of an increment `err` against `y0` and the first
    /// stage derivative `k0`.
    pub fn scaled_error(&self, y0: &Value, k0: &Value, err: &Value, dx: f64) -> f64 {
        let emax = y0
            .as_slice()
            .iter()
            .zip(k0.as_slice())
            .zip(err.as_slice())
            .map(|((&y, &k), &e)| {
                let scale = y.abs() + (dx * k).abs();
                let scale = if scale == 0.0 { ZERO_SCALE } else { scale };
                (e / scale).abs()
            })
            .fold(0.0, |acc: f64, v| {
                if acc.is_nan() || v.is_nan() {
                    f64::NAN
                } else {
                    acc.max(v)
                }
            });
        emax / self.eps
    }

    /// Whether a step with scaled error `emax` is accepted, and the step
    /// to suggest next.
    pub fn assess(&self, dx: f64, emax: f64) -> (bool, f64) {
        if emax <= 1.0 {
            let next = if emax > self.econ {
                self.safety * dx * emax.powf(self.pgrow)
            } else {
                MAX_GROWTH * dx
            };
            (true, next)
        } else {
            let next = (self.safety * dx * emax.powf(self.pshrink)).max(MIN_SHRINK * dx);
            (false, next)
        }
    }
}

// ── Scheme ──────────────────────────────────────────────────────

/// An embedded pair with step size control.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdaptiveScheme {
    tableau: &'static ButcherTableau,
    controller: AdaptiveController,
}

impl AdaptiveScheme {
    /// A scheme over an embedded tableau.
    ///
    /// Fails with [`FrameError::Configuration`] when the tableau has no
    /// error weights or the controller is invalid.
    pub fn new(
        tableau: &'static ButcherTableau,
        controller: AdaptiveController,
    ) -> Result<Self, FrameError> {
        if tableau.e.is_none() {
            return Err(FrameError::configuration(format!(
                "tableau '{}' has no embedded error estimate",
                tableau.name
            )));
        }
        controller.validate()?;
        Ok(Self {
            tableau,
            controller,
        })
    }

    /// Replaces the controller.
    pub fn with_controller(mut self, controller: AdaptiveController) -> Result<Self, FrameError> {
        controller.validate()?;
        self.controller = controller;
        Ok(self)
    }

    /// Replaces only the error tolerance.
    pub fn with_eps(self, eps: f64) -> Result<Self, FrameError> {
        let controller = self.controller.with_eps(eps);
        self.with_controller(controller)
    }

    /// The active controller.
    pub fn controller(&self) -> &AdaptiveController {
        &self.controller
    }

    /// The underlying tableau.
    pub fn tableau(&self) -> &'static ButcherTableau {
        self.tableau
    }

    fn builtin(tableau: &'static ButcherTableau, controller: AdaptiveController) -> Self {
        Self {
            tableau,
            controller,
        }
    }

    /// Heun–Euler 2(1).
    pub fn heun_euler() -> Self {
        Self::builtin(&HEUN_EULER, AdaptiveController::SECOND_ORDER)
    }

    /// Runge–Kutta–Fehlberg 1(2), propagating the second-order solution.
    pub fn fehlberg() -> Self {
        Self::builtin(&FEHLBERG12, AdaptiveController::SECOND_ORDER)
    }

    /// Bogacki–Shampine 3(2).
    pub fn bogacki_shampine() -> Self {
        Self::builtin(&BOGACKI_SHAMPINE, AdaptiveController::THIRD_ORDER)
    }

    /// Gottlieb–Shu SSP 3(2), with Heun as the embedded method.
    pub fn gottlieb_shu() -> Self {
        Self::builtin(&GOTTLIEB_SHU, AdaptiveController::THIRD_ORDER)
    }

    /// Cash–Karp 5(4).
    pub fn cash_karp() -> Self {
        Self::builtin(&CASH_KARP, AdaptiveController::FIFTH_ORDER)
    }

    /// Dormand–Prince 5(4).
    pub fn dormand_prince() -> Self {
        Self::builtin(&DORMAND_PRINCE, AdaptiveController::FIFTH_ORDER)
    }
}

impl Scheme for AdaptiveScheme {
    fn name(&self) -> &str {
        self.tableau.name
    }

    fn description(&self) -> &str {
        self.tableau.description
    }

    fn step(&self, ctx: &mut SchemeContext<'_>, dx: f64) -> Result<SchemeOutcome, FrameError> {
        let k = self.tableau.stages_at(ctx, dx)?;
        let e = self.tableau.e.ok_or_else(|| {
            FrameError::configuration(format!(
                "tableau '{}' has no embedded error estimate",
                self.tableau.name
            ))
        })?;
        let err = ButcherTableau::combine(e, &k, dx);
        let emax = self.controller.scaled_error(ctx.y0(), &k[0], &err, dx);
        let (accepted, next) = self.controller.assess(dx, emax);
        ctx.suggest(next)?;

        if accepted {
            Ok(SchemeOutcome::Delta(ButcherTableau::combine(
                self.tableau.b,
                &k,
                dx,
            )))
        } else {
            debug!(
                scheme = self.tableau.name,
                field = %ctx.target_name(),
                dx,
                emax,
                next,
                "step error above tolerance"
            );
            Ok(SchemeOutcome::Rejected)
        }
    }
}

/// A step size rule for adaptive schemes: the step suggested during the
/// previous attempt, or `initial` before any suggestion exists.
pub fn adaptive_stepsize(var: IntVarId, initial: f64) -> UpdateRule<StepsizeFn> {
    UpdateRule::stepsize(move |frame| Ok(frame.suggested(var).unwrap_or(initial)))
}

// ── Tableaux ────────────────────────────────────────────────────

/// Heun–Euler: Heun's method with forward Euler as the embedded estimate.
pub const HEUN_EULER: ButcherTableau = ButcherTableau {
    name: "heun-euler",
    description: "Explicit adaptive 2nd-order Heun-Euler method",
    order: 2,
    c: &[0.0, 1.0],
    a: &[&[], &[1.0]],
    b: &[0.5, 0.5],
    e: Some(&[0.5 - 1.0, 0.5]),
};

/// Runge–Kutta–Fehlberg 1(2).
pub const FEHLBERG12: ButcherTableau = ButcherTableau {
    name: "fehlberg",
    description: "Explicit adaptive 2nd-order Runge-Kutta-Fehlberg method",
    order: 2,
    c: &[0.0, 0.5, 1.0],
    a: &[&[], &[0.5], &[1.0 / 256.0, 255.0 / 256.0]],
    b: &[1.0 / 512.0, 255.0 / 256.0, 1.0 / 512.0],
    e: Some(&[1.0 / 512.0 - 1.0 / 256.0, 0.0, 1.0 / 512.0]),
};

/// Bogacki–Shampine 3(2).
pub const BOGACKI_SHAMPINE: ButcherTableau = ButcherTableau {
    name: "bogacki-shampine",
    description: "Explicit adaptive 3rd-order Bogacki-Shampine method",
    order: 3,
    c: &[0.0, 0.5, 0.75, 1.0],
    a: &[&[], &[0.5], &[0.0, 0.75], &[2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0]],
    b: &[2.0 / 9.0, 1.0 / 3.0, 4.0 / 9.0, 0.0],
    e: Some(&[
        2.0 / 9.0 - 7.0 / 24.0,
        1.0 / 3.0 - 0.25,
        4.0 / 9.0 - 1.0 / 3.0,
        -0.125,
    ]),
};

/// Gottlieb–Shu third-order SSP with Heun's method embedded.
pub const GOTTLIEB_SHU: ButcherTableau = ButcherTableau {
    name: "gottlieb-shu",
    description: "Explicit adaptive 3rd-order Gottlieb-Shu method",
    order: 3,
    c: &[0.0, 1.0, 0.5],
    a: &[&[], &[1.0], &[0.25, 0.25]],
    b: &[1.0 / 6.0, 1.0 / 6.0, 2.0 / 3.0],
    e: Some(&[1.0 / 6.0 - 0.5, 1.0 / 6.0 - 0.5, 2.0 / 3.0]),
};

/// Cash–Karp 5(4).
pub const CASH_KARP: ButcherTableau = ButcherTableau {
    name: "cash-karp",
    description: "Explicit adaptive 5th-order Cash-Karp method",
    order: 5,
    c: &[0.0, 0.2, 0.3, 0.6, 1.0, 0.875],
    a: &[
        &[],
        &[0.2],
        &[3.0 / 40.0, 9.0 / 40.0],
        &[0.3, -0.9, 1.2],
        &[-11.0 / 54.0, 2.5, -70.0 / 27.0, 35.0 / 27.0],
        &[
            1631.0 / 55296.0,
            175.0 / 512.0,
            575.0 / 13824.0,
            44275.0 / 110592.0,
            253.0 / 4096.0,
        ],
    ],
    b: &[
        37.0 / 378.0,
        0.0,
        250.0 / 621.0,
        125.0 / 594.0,
        0.0,
        512.0 / 1771.0,
    ],
    e: Some(&[
        37.0 / 378.0 - 2825.0 / 27648.0,
        0.0,
        250.0 / 621.0 - 18575.0 / 48384.0,
        125.0 / 594.0 - 13525.0 / 55296.0,
        -277.0 / 14336.0,
        512.0 / 1771.0 - 0.25,
    ]),
};

/// Dormand–Prince 5(4).
pub const DORMAND_PRINCE: ButcherTableau = ButcherTableau {
    name: "dormand-prince",
    description: "Explicit adaptive 5th-order Dormand-Prince method",
    order: 5,
    c: &[0.0, 0.2, 0.3, 0.8, 8.0 / 9.0, 1.0, 1.0],
    a: &[
        &[],
        &[0.2],
        &[3.0 / 40.0, 9.0 / 40.0],
        &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0],
        &[
            19372.0 / 6561.0,
            -25360.0 / 2187.0,
            64448.0 / 6561.0,
            -212.0 / 729.0,
        ],
        &[
            9017.0 / 3168.0,
            -355.0 / 33.0,
            46732.0 / 5247.0,
            49.0 / 176.0,
            -5103.0 / 18656.0,
        ],
        &[
            35.0 / 384.0,
            0.0,
            500.0 / 1113.0,
            125.0 / 192.0,
            -2187.0 / 6784.0,
            11.0 / 84.0,
        ],
    ],
    b: &[
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
        0.0,
    ],
    e: Some(&[
        35.0 / 384.0 - 5179.0 / 57600.0,
        0.0,
        500.0 / 1113.0 - 7571.0 / 16695.0,
        125.0 / 192.0 - 393.0 / 640.0,
        -2187.0 / 6784.0 + 92097.0 / 339200.0,
        11.0 / 84.0 - 187.0 / 2100.0,
        -1.0 / 40.0,
    ]),
};

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [&ButcherTableau; 6] = [
        &HEUN_EULER,
        &FEHLBERG12,
        &BOGACKI_SHAMPINE,
        &GOTTLIEB_SHU,
        &CASH_KARP,
        &DORMAND_PRINCE,
    ];

    #[test]
    fn tableaux_are_consistent() {
        for t in ALL {
            assert!(t.is_consistent(), "{} is malformed", t.name);
        }
    }

    #[test]
    fn error_weights_sum_to_zero() {
        // Both members of a pair are consistent, so b − b* sums to zero.
        for t in ALL {
            let sum: f64 = t.e.unwrap().iter().sum();
            assert!(sum.abs() < 1e-12, "{}: Σe = {sum}", t.name);
        }
    }

    #[test]
    fn row_sums_match_nodes() {
        for t in ALL {
            for (i, row) in t.a.iter().enumerate() {
                let sum: f64 = row.iter().sum();
                assert!((sum - t.c[i]).abs() < 1e-12, "{} stage {i}", t.name);
            }
        }
    }

    #[test]
    fn small_error_grows_by_fixed_factor() {
        let c = AdaptiveController::THIRD_ORDER;
        assert_eq!(c.assess(0.1, 0.0), (true, 0.5));
        assert_eq!(c.assess(0.1, 1e-3), (true, 0.5));
    }

    #[test]
    fn moderate_error_grows_by_power_law() {
        let c = AdaptiveController::SECOND_ORDER;
        let (accepted, next) = c.assess(1.0, 0.25);
        assert!(accepted);
        assert!((next - 0.9 * 2.0).abs() < 1e-12);
    }

    #[test]
    fn large_error_rejects_and_shrinks() {
        let c = AdaptiveController::SECOND_ORDER;
        let (accepted, next) = c.assess(1.0, 2.0);
        assert!(!accepted);
        assert!((next - 0.45).abs() < 1e-12);
        // Shrink is bounded below by a tenth of the step.
        let (_, next) = c.assess(1.0, 1e6);
        assert_eq!(next, 0.1);
    }

    #[test]
    fn nan_error_rejects() {
        let c = AdaptiveController::FIFTH_ORDER;
        let emax = c.scaled_error(
            &Value::scalar(1.0),
            &Value::scalar(1.0),
            &Value::scalar(f64::NAN),
            0.1,
        );
        let (accepted, next) = c.assess(0.1, emax);
        assert!(!accepted);
        assert!((next - 0.01).abs() < 1e-15);
    }

    #[test]
    fn zero_scale_elements_are_ignored() {
        let c = AdaptiveController::SECOND_ORDER;
        let y0 = Value::from_vec(vec![0.0, 1.0]);
        let k0 = Value::from_vec(vec![0.0, -1.0]);
        let err = Value::from_vec(vec![1.0, 0.011]);
        let emax = c.scaled_error(&y0, &k0, &err, 0.1);
        assert!((emax - 0.1).abs() < 1e-12);
    }

    #[test]
    fn invalid_controllers_are_rejected() {
        let c = AdaptiveController::SECOND_ORDER;
        assert!(c.with_eps(0.0).validate().is_err());
        assert!(c.with_safety(1.5).validate().is_err());
        assert!(AdaptiveScheme::new(&crate::explicit::RK4, c).is_err());
        assert!(AdaptiveScheme::new(&HEUN_EULER, c).is_ok());
    }
}
