//! Benchmark profiles for the simframe integration framework.
//!
//! - [`decay_profile`]: `n` independent decaying cells with spread rates
//! - [`diffusion_profile`]: 1D diffusion on `n` cells with a tridiagonal
//!   Jacobian, for the implicit schemes
//! - [`laplacian`]: the diffusion operator as a dense matrix

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use simframe_core::{FieldId, FrameError, GroupId, IntVarId, Jacobian, Value};
use simframe_engine::{Frame, Instruction, Integrator, IntegratorConfig, UpdateRule};
use simframe_schemes::{adaptive_stepsize, SchemeKind};

/// A frame ready to [`run`](Frame::run), with its handles.
pub struct Profile {
    /// The frame.
    pub frame: Frame,
    /// Integration variable.
    pub t: IntVarId,
    /// The integrated field.
    pub y: FieldId,
}

/// `dY_i/dt = -r_i·Y_i` on `n` cells, rates spread over `[0.5, 1.5]`,
/// integrated to `t = end` with `kind`.
///
/// Adaptive schemes start at dt=0.1 and follow their suggestions; the
/// rest use a fixed dt=0.01.
pub fn decay_profile(kind: SchemeKind, n: usize, end: f64) -> Result<Profile, FrameError> {
    let rates: Vec<f64> = (0..n)
        .map(|i| 0.5 + i as f64 / n.max(1) as f64)
        .collect();
    let rates = Value::from_vec(rates);

    let mut frame = Frame::with_description("decay benchmark");
    let t = frame.add_integration_variable(GroupId::ROOT, "t", 0.0, vec![end])?;
    let y = frame.add_field(GroupId::ROOT, "Y", Value::filled(&[n], 1.0))?;
    frame
        .field_mut(y)?
        .set_differentiator(UpdateRule::derivative(move |_, _, y| Ok(-(&rates * y))))?;
    install(&mut frame, t, y, kind, 0.01)?;
    Ok(Profile { frame, t, y })
}

/// `dY/dt = D·∇²Y` on `n` cells with absorbing ends and a unit spike in
/// the middle, integrated to `t = end` at dt=0.1.
///
/// Only the jacobinator is set; the derivative falls back to `J·Y`.
pub fn diffusion_profile(
    kind: SchemeKind,
    n: usize,
    coefficient: f64,
    end: f64,
) -> Result<Profile, FrameError> {
    let mut initial = Value::zeros(&[n]);
    if n > 0 {
        initial.as_mut_slice()[n / 2] = 1.0;
    }
    let jac = laplacian(n, coefficient);

    let mut frame = Frame::with_description("diffusion benchmark");
    let t = frame.add_integration_variable(GroupId::ROOT, "t", 0.0, vec![end])?;
    let y = frame.add_field(GroupId::ROOT, "Y", initial)?;
    frame
        .field_mut(y)?
        .set_jacobinator(UpdateRule::jacobian(move |_, _| Ok(jac.clone())))?;
    install(&mut frame, t, y, kind, 0.1)?;
    Ok(Profile { frame, t, y })
}

/// Tridiagonal `D·(1, −2, 1)` matrix on `n` cells.
pub fn laplacian(n: usize, coefficient: f64) -> Jacobian {
    Jacobian::from_fn(n, n, |i, j| {
        if i == j {
            -2.0 * coefficient
        } else if i.abs_diff(j) == 1 {
            coefficient
        } else {
            0.0
        }
    })
}

fn install(
    frame: &mut Frame,
    t: IntVarId,
    y: FieldId,
    kind: SchemeKind,
    dt: f64,
) -> Result<(), FrameError> {
    if kind.is_adaptive() {
        frame.intvar_mut(t)?.set_updater(adaptive_stepsize(t, 0.1))?;
    } else {
        frame.intvar_mut(t)?.set_updater(UpdateRule::fixed(dt))?;
    }
    let config =
        IntegratorConfig::new(t).with_instruction(Instruction::from_boxed(kind.build(), y));
    frame.set_integrator(Integrator::new(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decay_profile_runs() {
        let mut p = decay_profile(SchemeKind::Rk4, 8, 1.0).unwrap();
        p.frame.run().unwrap();
        let y = p.frame.value(p.y).unwrap().as_slice().to_vec();
        assert!((y[0] - (-0.5f64).exp()).abs() < 1e-8);
        assert!(y.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn diffusion_spreads_and_decays() {
        let mut p = diffusion_profile(SchemeKind::ImplicitEuler, 9, 1.0, 1.0).unwrap();
        p.frame.run().unwrap();
        let y = p.frame.value(p.y).unwrap().as_slice().to_vec();
        assert!(y[4] < 1.0);
        assert!(y[3] > 0.0 && (y[3] - y[5]).abs() < 1e-12);
        assert!(y.iter().sum::<f64>() < 1.0);
    }

    #[test]
    fn laplacian_is_tridiagonal() {
        let l = laplacian(3, 2.0);
        assert_eq!(l[(0, 0)], -4.0);
        assert_eq!(l[(0, 1)], 2.0);
        assert_eq!(l[(0, 2)], 0.0);
    }
}
