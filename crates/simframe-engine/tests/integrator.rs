//! Integration test: retry, atomic commit, and integrator wiring.

use std::cell::Cell;
use std::rc::Rc;

use simframe_core::{FrameError, GroupId, Value};
use simframe_engine::{
    Frame, Instruction, IntegrationError, Integrator, IntegratorConfig, UpdateRule,
};
use simframe_test_utils::fixtures::{
    AcceptingScheme, FixedDeltaScheme, FlakyScheme, ForwardScheme, RejectingScheme,
};
use simframe_test_utils::{decay_frame, DecayFrame};

fn install(frame: &mut Frame, config: IntegratorConfig) {
    let integrator = Integrator::new(config).unwrap();
    frame.set_integrator(integrator).unwrap();
}

// ── Retry ────────────────────────────────────────────────────────────

#[test]
fn exhausted_after_maxit_rejections() {
    let DecayFrame { mut frame, x, y } = decay_frame(1.0, 0.1, vec![1.0]);
    install(
        &mut frame,
        IntegratorConfig::new(x)
            .with_instruction(Instruction::new(ForwardScheme, y))
            .with_instruction(Instruction::new(RejectingScheme::new(), y))
            .with_maxit(1),
    );

    let err = frame.integrate().unwrap_err();
    assert_eq!(err, IntegrationError::Exhausted { attempts: 1 });
    // The forward instruction staged a delta, but nothing was committed.
    assert_eq!(frame.value(y).unwrap().item(), Some(1.0));
    assert_eq!(frame.intvar(x).unwrap().prev_stepsize(), None);
}

#[test]
fn failop_runs_after_every_rejection() {
    let DecayFrame { mut frame, x, y } = decay_frame(1.0, 0.1, vec![1.0]);
    let failures = Rc::new(Cell::new(0u32));
    let seen = Rc::clone(&failures);
    install(
        &mut frame,
        IntegratorConfig::new(x)
            .with_instruction(Instruction::new(RejectingScheme::new(), y))
            .with_maxit(5)
            .with_failop(UpdateRule::hook(move |_| {
                seen.set(seen.get() + 1);
                Ok(())
            })),
    );

    let err = frame.integrate().unwrap_err();
    assert_eq!(err, IntegrationError::Exhausted { attempts: 5 });
    assert_eq!(failures.get(), 5);
}

#[test]
fn rejection_then_success_commits_once() {
    let DecayFrame { mut frame, x, y } = decay_frame(1.0, 0.1, vec![1.0]);
    frame
        .intvar_mut(x)
        .unwrap()
        .set_updater(UpdateRule::stepsize(move |f| {
            Ok(f.suggested(x).unwrap_or(0.2))
        }))
        .unwrap();
    install(
        &mut frame,
        IntegratorConfig::new(x).with_instruction(Instruction::new(FlakyScheme::new(1), y)),
    );

    let metrics = frame.integrate().unwrap();
    assert_eq!(metrics.attempts, 2);
    assert_eq!(metrics.rejected_attempts, 1);
    // The rejected attempt suggested 0.1; the retry used it.
    assert_eq!(metrics.stepsize, 0.1);
    assert!((frame.value(y).unwrap().item().unwrap() - 0.9).abs() < 1e-15);
    assert_eq!(frame.intvar(x).unwrap().prev_stepsize(), Some(0.1));
    assert_eq!(frame.integrator().unwrap().last_metrics(), &metrics);
}

#[test]
fn integrate_does_not_move_the_control_variable() {
    let DecayFrame { mut frame, x, y } = decay_frame(1.0, 0.25, vec![1.0]);
    install(
        &mut frame,
        IntegratorConfig::new(x).with_instruction(Instruction::new(ForwardScheme, y)),
    );
    frame.integrate().unwrap();
    assert_eq!(frame.control_value(x).unwrap(), 0.0);
    assert_eq!(frame.value(y).unwrap().item(), Some(0.75));
}

// ── Commit ───────────────────────────────────────────────────────────

#[test]
fn instructions_see_only_committed_values() {
    let mut frame = Frame::new();
    let x = frame
        .add_integration_variable(GroupId::ROOT, "x", 0.0, vec![1.0])
        .unwrap();
    frame
        .intvar_mut(x)
        .unwrap()
        .set_updater(UpdateRule::fixed(1.0))
        .unwrap();
    let a = frame.add_field(GroupId::ROOT, "A", 0.0).unwrap();
    let b = frame.add_field(GroupId::ROOT, "B", 0.0).unwrap();
    frame
        .field_mut(a)
        .unwrap()
        .set_differentiator(UpdateRule::derivative(|_, _, y| Ok(Value::filled(y.shape(), 1.0))))
        .unwrap();
    frame
        .field_mut(b)
        .unwrap()
        .set_differentiator(UpdateRule::derivative(move |f, _, _| Ok(f.value(a)?.clone())))
        .unwrap();
    install(
        &mut frame,
        IntegratorConfig::new(x)
            .with_instruction(Instruction::new(ForwardScheme, a))
            .with_instruction(Instruction::new(ForwardScheme, b)),
    );

    frame.integrate().unwrap();
    assert_eq!(frame.value(a).unwrap().item(), Some(1.0));
    assert_eq!(frame.value(b).unwrap().item(), Some(0.0));
}

#[test]
fn repeated_targets_accumulate() {
    let DecayFrame { mut frame, x, y } = decay_frame(1.0, 0.1, vec![1.0]);
    install(
        &mut frame,
        IntegratorConfig::new(x)
            .with_instruction(Instruction::new(FixedDeltaScheme::new(0.5), y))
            .with_instruction(Instruction::new(FixedDeltaScheme::new(0.25), y)),
    );
    frame.integrate().unwrap();
    assert_eq!(frame.value(y).unwrap().item(), Some(1.75));
}

#[test]
fn accepted_without_delta_leaves_target() {
    let DecayFrame { mut frame, x, y } = decay_frame(1.0, 0.1, vec![1.0]);
    install(
        &mut frame,
        IntegratorConfig::new(x).with_instruction(Instruction::new(AcceptingScheme, y)),
    );
    let metrics = frame.integrate().unwrap();
    assert_eq!(metrics.attempts, 1);
    assert_eq!(frame.value(y).unwrap().item(), Some(1.0));
}

#[test]
fn delta_shape_mismatch_is_an_error() {
    let DecayFrame { mut frame, x, y } = decay_frame(vec![1.0, 2.0, 3.0], 0.1, vec![1.0]);
    install(
        &mut frame,
        IntegratorConfig::new(x)
            .with_instruction(Instruction::new(FixedDeltaScheme::new(vec![1.0, 1.0]), y)),
    );
    let err = frame.integrate().unwrap_err();
    assert_eq!(
        err,
        IntegrationError::Frame(FrameError::ShapeMismatch {
            field: "Y".into(),
            expected: vec![3],
            found: vec![2],
        })
    );
    assert_eq!(frame.value(y).unwrap().as_slice(), &[1.0, 2.0, 3.0]);
}

#[test]
fn constant_target_aborts_the_whole_commit() {
    let DecayFrame { mut frame, x, y } = decay_frame(1.0, 0.1, vec![1.0]);
    let k = frame.add_field(GroupId::ROOT, "k", 2.0).unwrap();
    frame.field_mut(k).unwrap().freeze();
    install(
        &mut frame,
        IntegratorConfig::new(x)
            .with_instruction(Instruction::new(ForwardScheme, y))
            .with_instruction(Instruction::new(FixedDeltaScheme::new(1.0), k)),
    );

    let err = frame.integrate().unwrap_err();
    assert_eq!(
        err,
        IntegrationError::Frame(FrameError::ConstantViolation { field: "k".into() })
    );
    assert_eq!(frame.value(y).unwrap().item(), Some(1.0));
    assert_eq!(frame.value(k).unwrap().item(), Some(2.0));
}

#[test]
fn fstep_scales_the_step() {
    let DecayFrame { mut frame, x, y } = decay_frame(1.0, 0.1, vec![1.0]);
    install(
        &mut frame,
        IntegratorConfig::new(x)
            .with_instruction(Instruction::new(ForwardScheme, y).with_fstep(0.5)),
    );
    frame.integrate().unwrap();
    assert!((frame.value(y).unwrap().item().unwrap() - 0.95).abs() < 1e-15);
}

#[test]
fn fstep_above_one_is_still_applied() {
    let DecayFrame { mut frame, x, y } = decay_frame(1.0, 0.1, vec![1.0]);
    install(
        &mut frame,
        IntegratorConfig::new(x)
            .with_instruction(Instruction::new(ForwardScheme, y).with_fstep(1.5)),
    );
    frame.integrate().unwrap();
    assert!((frame.value(y).unwrap().item().unwrap() - 0.85).abs() < 1e-15);
}

// ── Hooks ────────────────────────────────────────────────────────────

#[test]
fn preparator_and_finalizer_bracket_the_step() {
    let DecayFrame { mut frame, x, y } = decay_frame(1.0, 0.5, vec![1.0]);
    let before = frame.add_field(GroupId::ROOT, "before", 0.0).unwrap();
    let after = frame.add_field(GroupId::ROOT, "after", 0.0).unwrap();
    install(
        &mut frame,
        IntegratorConfig::new(x)
            .with_instruction(Instruction::new(ForwardScheme, y))
            .with_preparator(UpdateRule::hook(move |f| {
                let v = f.value(y)?.clone();
                f.set_value(before, v)
            }))
            .with_finalizer(UpdateRule::hook(move |f| {
                let v = f.value(y)?.clone();
                f.set_value(after, v)
            })),
    );
    frame.integrate().unwrap();
    assert_eq!(frame.value(before).unwrap().item(), Some(1.0));
    assert_eq!(frame.value(after).unwrap().item(), Some(0.5));
}

// ── Wiring ───────────────────────────────────────────────────────────

#[test]
fn integrate_without_integrator_fails() {
    let DecayFrame { mut frame, .. } = decay_frame(1.0, 0.1, vec![1.0]);
    assert_eq!(frame.integrate().unwrap_err(), IntegrationError::NoIntegrator);
}

#[test]
fn zero_maxit_is_a_configuration_error() {
    let DecayFrame { x, .. } = decay_frame(1.0, 0.1, vec![1.0]);
    let err = Integrator::new(IntegratorConfig::new(x).with_maxit(0)).unwrap_err();
    assert!(matches!(err, FrameError::Configuration { .. }));
}

#[test]
fn targeting_the_integration_variable_is_rejected() {
    let DecayFrame { mut frame, x, .. } = decay_frame(1.0, 0.1, vec![1.0]);
    let x_field = frame.intvar(x).unwrap().field();
    let integrator = Integrator::new(
        IntegratorConfig::new(x).with_instruction(Instruction::new(ForwardScheme, x_field)),
    )
    .unwrap();
    let err = frame.set_integrator(integrator).unwrap_err();
    assert!(matches!(err, FrameError::Configuration { .. }));
}

#[test]
fn missing_stepsize_updater_is_reported() {
    let mut frame = Frame::new();
    let x = frame
        .add_integration_variable(GroupId::ROOT, "x", 0.0, vec![1.0])
        .unwrap();
    let y = frame.add_field(GroupId::ROOT, "Y", 1.0).unwrap();
    install(
        &mut frame,
        IntegratorConfig::new(x).with_instruction(Instruction::new(ForwardScheme, y)),
    );
    let err = frame.integrate().unwrap_err();
    assert_eq!(
        err,
        IntegrationError::Frame(FrameError::MissingStepsizeUpdater { var: "x".into() })
    );
}

#[test]
fn stepsize_is_capped_at_next_snapshot() {
    let DecayFrame { mut frame, x, y } = decay_frame(1.0, 10.0, vec![0.5, 1.0]);
    install(
        &mut frame,
        IntegratorConfig::new(x).with_instruction(Instruction::new(ForwardScheme, y)),
    );
    let metrics = frame.integrate().unwrap();
    assert_eq!(metrics.stepsize, 0.5);
    assert_eq!(metrics.instruction_us.len(), 1);
    assert_eq!(metrics.instruction_us[0].0, "forward");
}
