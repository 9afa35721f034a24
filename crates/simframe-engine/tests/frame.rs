//! Integration test: registration, navigation, and derivative dispatch.

use nalgebra::DMatrix;
use simframe_core::{Child, FrameError, GroupId, Value};
use simframe_engine::{Frame, UpdateRule};

// ── Registration and paths ───────────────────────────────────────────

#[test]
fn dotted_paths_resolve() {
    let mut frame = Frame::new();
    let planet = frame.add_group(GroupId::ROOT, "planet").unwrap();
    let gas = frame.add_group(planet, "gas").unwrap();
    let sigma = frame.add_field(gas, "sigma", vec![1.0, 2.0]).unwrap();

    assert_eq!(frame.resolve("planet"), Some(Child::Group(planet)));
    assert_eq!(frame.resolve("planet.gas"), Some(Child::Group(gas)));
    assert_eq!(frame.field_by_path("planet.gas.sigma"), Some(sigma));
    assert_eq!(frame.field_path(sigma).unwrap(), "planet.gas.sigma");
    assert_eq!(frame.resolve("planet.dust"), None);
    assert_eq!(frame.resolve("planet.gas.sigma.x"), None);
    assert_eq!(frame.field_by_path("planet.gas"), None);
}

#[test]
fn duplicate_and_invalid_names_are_rejected() {
    let mut frame = Frame::new();
    frame.add_field(GroupId::ROOT, "Y", 1.0).unwrap();
    assert_eq!(
        frame.add_group(GroupId::ROOT, "Y").unwrap_err(),
        FrameError::DuplicateChild {
            group: "Frame".into(),
            name: "Y".into()
        }
    );
    assert!(matches!(
        frame.add_field(GroupId::ROOT, "a.b", 1.0),
        Err(FrameError::InvalidName { .. })
    ));
    assert!(matches!(
        frame.add_field(GroupId::ROOT, "", 1.0),
        Err(FrameError::InvalidName { .. })
    ));
    assert!(matches!(
        frame.add_field(GroupId(42), "z", 1.0),
        Err(FrameError::UnknownGroup(_))
    ));
}

#[test]
fn children_keep_insertion_order() {
    let mut frame = Frame::new();
    for name in ["c", "a", "b"] {
        frame.add_field(GroupId::ROOT, name, 0.0).unwrap();
    }
    let names: Vec<&str> = frame
        .group(GroupId::ROOT)
        .unwrap()
        .children()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(names, vec!["c", "a", "b"]);
}

#[test]
fn toc_lists_the_hierarchy() {
    let mut frame = Frame::with_description("disk model");
    frame
        .add_integration_variable(GroupId::ROOT, "t", 0.0, vec![1.0])
        .unwrap();
    let gas = frame.add_group(GroupId::ROOT, "gas").unwrap();
    frame
        .group_mut(gas)
        .unwrap()
        .set_description("gas quantities");
    let sigma = frame.add_field(gas, "sigma", vec![1.0, 2.0, 3.0]).unwrap();
    frame
        .field_mut(sigma)
        .unwrap()
        .set_description("surface density");
    let k = frame.add_field(GroupId::ROOT, "k", 1.0).unwrap();
    frame.field_mut(k).unwrap().freeze();

    let expected = "\
Frame (disk model)
    - t: IntVar [1]
    - gas: Group, gas quantities
        - sigma: Field [3], surface density
    - k: Field [1] (constant)
";
    assert_eq!(frame.toc(), expected);
}

// ── Values ───────────────────────────────────────────────────────────

#[test]
fn constant_fields_refuse_writes() {
    let mut frame = Frame::new();
    let k = frame.add_field(GroupId::ROOT, "k", 1.0).unwrap();
    frame.field_mut(k).unwrap().freeze();
    assert_eq!(
        frame.set_value(k, 2.0).unwrap_err(),
        FrameError::ConstantViolation { field: "k".into() }
    );
    assert_eq!(frame.value(k).unwrap().item(), Some(1.0));
}

#[test]
fn updating_an_integration_variable_does_nothing() {
    let mut frame = Frame::new();
    let x = frame
        .add_integration_variable(GroupId::ROOT, "x", 3.0, vec![5.0])
        .unwrap();
    let field = frame.intvar(x).unwrap().field();
    frame.update_field(field).unwrap();
    assert_eq!(frame.control_value(x).unwrap(), 3.0);
    assert_eq!(frame.field(field).unwrap().integration_variable(), Some(x));
}

// ── Derivatives ──────────────────────────────────────────────────────

#[test]
fn derivative_without_callables_is_zero() {
    let mut frame = Frame::new();
    let y = frame.add_field(GroupId::ROOT, "Y", vec![1.0, 2.0]).unwrap();
    let y0 = frame.value(y).unwrap().clone();
    let d = frame.derivative(y, 0.0, &y0).unwrap();
    assert_eq!(d, Value::zeros(&[2]));
}

#[test]
fn derivative_falls_back_to_jacobian() {
    let mut frame = Frame::new();
    let y = frame.add_field(GroupId::ROOT, "Y", vec![1.0, 2.0]).unwrap();
    frame
        .field_mut(y)
        .unwrap()
        .set_jacobinator(UpdateRule::jacobian(|_, _| {
            Ok(DMatrix::from_row_slice(2, 2, &[0.0, 1.0, -1.0, 0.0]))
        }))
        .unwrap();
    let y0 = frame.value(y).unwrap().clone();
    let d = frame.derivative(y, 0.0, &y0).unwrap();
    assert_eq!(d.as_slice(), &[2.0, -1.0]);
}

#[test]
fn differentiator_takes_precedence() {
    let mut frame = Frame::new();
    let y = frame.add_field(GroupId::ROOT, "Y", 2.0).unwrap();
    frame
        .field_mut(y)
        .unwrap()
        .set_differentiator(UpdateRule::derivative(|_, x, y| Ok(y * x)))
        .unwrap();
    frame
        .field_mut(y)
        .unwrap()
        .set_jacobinator(UpdateRule::jacobian(|_, _| Ok(DMatrix::from_element(1, 1, 100.0))))
        .unwrap();
    let d = frame.derivative(y, 3.0, &Value::scalar(2.0)).unwrap();
    assert_eq!(d.item(), Some(6.0));
}

#[test]
fn wrong_jacobian_shape_is_reported() {
    let mut frame = Frame::new();
    let y = frame.add_field(GroupId::ROOT, "Y", vec![1.0, 2.0]).unwrap();
    frame
        .field_mut(y)
        .unwrap()
        .set_jacobinator(UpdateRule::jacobian(|_, _| Ok(DMatrix::zeros(3, 3))))
        .unwrap();
    assert_eq!(
        frame.jacobian(y, 0.0).unwrap_err(),
        FrameError::JacobianShape {
            field: "Y".into(),
            rows: 3,
            cols: 3,
            expected: 2,
        }
    );
}

#[test]
fn wrong_derivative_shape_is_reported() {
    let mut frame = Frame::new();
    let y = frame.add_field(GroupId::ROOT, "Y", vec![1.0, 2.0]).unwrap();
    frame
        .field_mut(y)
        .unwrap()
        .set_differentiator(UpdateRule::derivative(|_, _, _| Ok(Value::scalar(1.0))))
        .unwrap();
    let y0 = frame.value(y).unwrap().clone();
    assert!(matches!(
        frame.derivative(y, 0.0, &y0),
        Err(FrameError::ShapeMismatch { .. })
    ));
}

// ── Control variable ─────────────────────────────────────────────────

#[test]
fn snapshot_navigation() {
    let mut frame = Frame::new();
    let x = frame
        .add_integration_variable(GroupId::ROOT, "x", 1.0, vec![0.0, 1.0, 2.0])
        .unwrap();
    assert_eq!(frame.next_snapshot(x).unwrap(), 2.0);
    assert_eq!(frame.prev_snapshot(x).unwrap(), Some(1.0));
    assert_eq!(frame.max_stepsize(x).unwrap(), 1.0);
}

#[test]
fn invalid_stepsize_is_rejected() {
    let mut frame = Frame::new();
    let x = frame
        .add_integration_variable(GroupId::ROOT, "x", 0.0, vec![1.0])
        .unwrap();
    frame
        .intvar_mut(x)
        .unwrap()
        .set_updater(UpdateRule::fixed(-1.0))
        .unwrap();
    assert_eq!(
        frame.stepsize(x).unwrap_err(),
        FrameError::InvalidStepsize { value: -1.0 }
    );
}

#[test]
fn suggestions_keep_the_minimum() {
    let mut frame = Frame::new();
    let x = frame
        .add_integration_variable(GroupId::ROOT, "x", 0.0, vec![1.0])
        .unwrap();
    assert!(matches!(
        frame.suggested(x),
        Err(FrameError::NoSuggestion { .. })
    ));
    frame.suggest(x, 0.5, false).unwrap();
    frame.suggest(x, 0.2, false).unwrap();
    frame.suggest(x, 0.4, false).unwrap();
    assert_eq!(frame.suggested(x).unwrap(), 0.2);
    frame.suggest(x, 0.4, true).unwrap();
    assert_eq!(frame.suggested(x).unwrap(), 0.4);
}
