//! Integration test: implicit schemes on stiff linear systems.

use nalgebra::DMatrix;
use simframe_core::{FieldId, FrameError, GroupId, IntVarId};
use simframe_engine::{
    Frame, Instruction, IntegrationError, Integrator, IntegratorConfig, Scheme, UpdateRule,
};
use simframe_schemes::{GmresOptions, ImplicitEuler, ImplicitMidpoint};

/// A frame with `dY/dx = J·Y` supplied only through a jacobinator.
fn linear_frame(y0: Vec<f64>, jac: DMatrix<f64>, dx: f64, end: f64) -> (Frame, IntVarId, FieldId) {
    let mut frame = Frame::new();
    let x = frame
        .add_integration_variable(GroupId::ROOT, "x", 0.0, vec![end])
        .unwrap();
    frame
        .intvar_mut(x)
        .unwrap()
        .set_updater(UpdateRule::fixed(dx))
        .unwrap();
    let y = frame.add_field(GroupId::ROOT, "Y", y0).unwrap();
    frame
        .field_mut(y)
        .unwrap()
        .set_jacobinator(UpdateRule::jacobian(move |_, _| Ok(jac.clone())))
        .unwrap();
    (frame, x, y)
}

fn install(frame: &mut Frame, x: IntVarId, y: FieldId, scheme: impl Scheme + 'static) {
    let integrator = Integrator::new(
        IntegratorConfig::new(x).with_instruction(Instruction::new(scheme, y)),
    )
    .unwrap();
    frame.set_integrator(integrator).unwrap();
}

fn stiff_scalar() -> DMatrix<f64> {
    DMatrix::from_element(1, 1, -1000.0)
}

#[test]
fn backward_euler_single_step() {
    let (mut frame, x, y) = linear_frame(vec![1.0], stiff_scalar(), 0.1, 0.1);
    install(&mut frame, x, y, ImplicitEuler::direct());
    frame.run().unwrap();
    let v = frame.value(y).unwrap().item().unwrap();
    assert!((v - 1.0 / 101.0).abs() < 1e-15);
}

#[test]
fn backward_euler_stays_stable_on_stiff_decay() {
    let (mut frame, x, y) = linear_frame(vec![1.0], stiff_scalar(), 0.1, 1.0);
    install(&mut frame, x, y, ImplicitEuler::direct());
    frame.run().unwrap();
    let v = frame.value(y).unwrap().item().unwrap();
    assert!(v > 0.0 && v < 1e-18, "got {v}");
}

#[test]
fn implicit_midpoint_single_step() {
    let (mut frame, x, y) = linear_frame(vec![1.0], stiff_scalar(), 0.1, 0.1);
    install(&mut frame, x, y, ImplicitMidpoint::direct());
    frame.run().unwrap();
    let v = frame.value(y).unwrap().item().unwrap();
    assert!((v - (-49.0 / 51.0)).abs() < 1e-14, "got {v}");
}

#[test]
fn implicit_midpoint_is_second_order_on_mild_decay() {
    let jac = DMatrix::from_element(1, 1, -1.0);
    let (mut frame, x, y) = linear_frame(vec![1.0], jac, 0.01, 1.0);
    install(&mut frame, x, y, ImplicitMidpoint::direct());
    frame.run().unwrap();
    let v = frame.value(y).unwrap().item().unwrap();
    assert!((v - (-1.0f64).exp()).abs() < 1e-5);
}

#[test]
fn gmres_matches_direct_solve() {
    let jac = DMatrix::from_row_slice(3, 3, &[-100.0, 1.0, 0.0, 1.0, -50.0, 2.0, 0.0, 3.0, -10.0]);
    let y0 = vec![1.0, -2.0, 0.5];

    let (mut direct, x, y) = linear_frame(y0.clone(), jac.clone(), 0.05, 0.5);
    install(&mut direct, x, y, ImplicitEuler::direct());
    direct.run().unwrap();

    let (mut iterative, x, y) = linear_frame(y0, jac, 0.05, 0.5);
    let gmres = ImplicitEuler::gmres(GmresOptions::default().with_rtol(1e-12)).unwrap();
    install(&mut iterative, x, y, gmres);
    iterative.run().unwrap();

    let a = direct.value(y).unwrap().as_slice();
    let b = iterative.value(y).unwrap().as_slice();
    for (da, db) in a.iter().zip(b) {
        assert!((da - db).abs() < 1e-10, "direct {da} vs gmres {db}");
    }
}

#[test]
fn singular_direct_solve_is_an_error() {
    // I − 0.1·(10·I) = 0
    let jac = DMatrix::<f64>::identity(2, 2) * 10.0;
    let (mut frame, x, y) = linear_frame(vec![1.0, 1.0], jac, 0.1, 1.0);
    install(&mut frame, x, y, ImplicitEuler::direct());
    assert_eq!(
        frame.integrate().unwrap_err(),
        IntegrationError::Frame(FrameError::SingularMatrix { field: "Y".into() })
    );
    assert_eq!(frame.value(y).unwrap().as_slice(), &[1.0, 1.0]);
}

#[test]
fn gmres_nonconvergence_rejects_until_exhausted() {
    let jac = DMatrix::<f64>::identity(2, 2) * 10.0;
    let (mut frame, x, y) = linear_frame(vec![1.0, 1.0], jac, 0.1, 1.0);
    let integrator = Integrator::new(
        IntegratorConfig::new(x)
            .with_instruction(Instruction::new(ImplicitEuler::default_gmres(), y))
            .with_maxit(3),
    )
    .unwrap();
    frame.set_integrator(integrator).unwrap();
    assert_eq!(
        frame.integrate().unwrap_err(),
        IntegrationError::Exhausted { attempts: 3 }
    );
}

#[test]
fn missing_jacobian_is_reported() {
    let mut frame = Frame::new();
    let x = frame
        .add_integration_variable(GroupId::ROOT, "x", 0.0, vec![1.0])
        .unwrap();
    frame
        .intvar_mut(x)
        .unwrap()
        .set_updater(UpdateRule::fixed(0.1))
        .unwrap();
    let y = frame.add_field(GroupId::ROOT, "Y", 1.0).unwrap();
    install(&mut frame, x, y, ImplicitMidpoint::direct());
    assert_eq!(
        frame.integrate().unwrap_err(),
        IntegrationError::Frame(FrameError::MissingJacobian { field: "Y".into() })
    );
}
