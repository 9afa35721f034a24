//! Updaters, heartbeats, and the update-rule union.
//!
//! Every reactive slot in a frame (a field's value updater, differentiator
//! and jacobinator, a group's updater, an integration variable's step size
//! updater, and the integrator's hooks) holds an [`UpdateRule`]. A rule is
//! one of:
//!
//! - [`UpdateRule::NoOp`]: does nothing.
//! - [`UpdateRule::Callable`]: a single callable.
//! - [`UpdateRule::Sequence`]: an [`UpdateOrder`] of resolved children,
//!   updated strictly in order. Only group and hook slots accept it.
//! - [`UpdateRule::Heartbeat`]: a [`Heartbeat`] running systole, main
//!   updater, and diastole in that order.
//!
//! The callable signature depends on the slot; see [`HookFn`],
//! [`UpdateFn`], [`DerivativeFn`], [`JacobianFn`], and [`StepsizeFn`].

use std::fmt;

use simframe_core::{Child, FrameError, Jacobian, Value};

use crate::frame::Frame;

/// Hook callable: systole, diastole, group updaters, integrator hooks.
pub type HookFn = dyn FnMut(&mut Frame) -> Result<(), FrameError>;

/// Field value updater. A returned value is committed to the field.
pub type UpdateFn = dyn FnMut(&mut Frame) -> Result<Option<Value>, FrameError>;

/// Derivative of a field at control value `x` for state `Y`.
pub type DerivativeFn = dyn FnMut(&mut Frame, f64, &Value) -> Result<Value, FrameError>;

/// Jacobian of a field's derivative at control value `x`.
pub type JacobianFn = dyn FnMut(&mut Frame, f64) -> Result<Jacobian, FrameError>;

/// Desired step size of an integration variable.
pub type StepsizeFn = dyn FnMut(&mut Frame) -> Result<f64, FrameError>;

// ── Updater ─────────────────────────────────────────────────────

/// Wrapper over an optional callable. An empty updater is a no-op.
pub struct Updater<F: ?Sized> {
    func: Option<Box<F>>,
}

impl<F: ?Sized> Updater<F> {
    /// An updater that does nothing.
    pub fn noop() -> Self {
        Self { func: None }
    }

    /// Wraps an already boxed callable.
    pub fn from_boxed(func: Box<F>) -> Self {
        Self { func: Some(func) }
    }

    /// Whether this updater has no callable.
    pub fn is_noop(&self) -> bool {
        self.func.is_none()
    }

    fn func_mut(&mut self) -> Option<&mut F> {
        self.func.as_deref_mut()
    }
}

impl<F: ?Sized> Default for Updater<F> {
    fn default() -> Self {
        Self::noop()
    }
}

impl<F: ?Sized> fmt::Debug for Updater<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_noop() {
            write!(f, "Updater(noop)")
        } else {
            write!(f, "Updater(callable)")
        }
    }
}

impl Updater<HookFn> {
    /// A hook updater.
    pub fn hook(f: impl FnMut(&mut Frame) -> Result<(), FrameError> + 'static) -> Self {
        Self {
            func: Some(Box::new(f)),
        }
    }

    /// Invokes the hook, if any.
    pub fn update(&mut self, frame: &mut Frame) -> Result<(), FrameError> {
        match self.func_mut() {
            Some(func) => func(frame),
            None => Ok(()),
        }
    }
}

impl Updater<UpdateFn> {
    /// A field value updater.
    pub fn value(f: impl FnMut(&mut Frame) -> Result<Option<Value>, FrameError> + 'static) -> Self {
        Self {
            func: Some(Box::new(f)),
        }
    }
}

impl Updater<DerivativeFn> {
    /// A derivative updater.
    pub fn derivative(
        f: impl FnMut(&mut Frame, f64, &Value) -> Result<Value, FrameError> + 'static,
    ) -> Self {
        Self {
            func: Some(Box::new(f)),
        }
    }
}

impl Updater<JacobianFn> {
    /// A Jacobian updater.
    pub fn jacobian(f: impl FnMut(&mut Frame, f64) -> Result<Jacobian, FrameError> + 'static) -> Self {
        Self {
            func: Some(Box::new(f)),
        }
    }
}

impl Updater<StepsizeFn> {
    /// A step size updater.
    pub fn stepsize(f: impl FnMut(&mut Frame) -> Result<f64, FrameError> + 'static) -> Self {
        Self {
            func: Some(Box::new(f)),
        }
    }
}

// ── Heartbeat ───────────────────────────────────────────────────

/// Ordered triple of updaters: systole, main updater, diastole.
///
/// A beat always runs all three in that order.
/// When the target is a field, the main updater's return value is
/// committed before diastole runs, so diastole observes the new value.
/// An error from any phase aborts the beat.
pub struct Heartbeat<F: ?Sized> {
    systole: Updater<HookFn>,
    updater: Updater<F>,
    diastole: Updater<HookFn>,
}

impl<F: ?Sized> Heartbeat<F> {
    /// A heartbeat around `updater` with no-op systole and diastole.
    pub fn new(updater: Updater<F>) -> Self {
        Self {
            systole: Updater::noop(),
            updater,
            diastole: Updater::noop(),
        }
    }

    /// Sets the hook run before the main updater.
    pub fn with_systole(
        mut self,
        f: impl FnMut(&mut Frame) -> Result<(), FrameError> + 'static,
    ) -> Self {
        self.systole = Updater::hook(f);
        self
    }

    /// Sets the hook run after the main updater (and its commit).
    pub fn with_diastole(
        mut self,
        f: impl FnMut(&mut Frame) -> Result<(), FrameError> + 'static,
    ) -> Self {
        self.diastole = Updater::hook(f);
        self
    }

    /// Whether all three phases are no-ops.
    pub fn is_noop(&self) -> bool {
        self.systole.is_noop() && self.updater.is_noop() && self.diastole.is_noop()
    }

    /// Runs systole, `call` on the main updater followed by `commit` of
    /// its result, then diastole.
    ///
    /// Returns `None` when the main updater is a no-op.
    pub(crate) fn beat_with<R>(
        &mut self,
        frame: &mut Frame,
        call: impl FnOnce(&mut F, &mut Frame) -> Result<R, FrameError>,
        commit: impl FnOnce(&mut Frame, &R) -> Result<(), FrameError>,
    ) -> Result<Option<R>, FrameError> {
        self.systole.update(frame)?;
        let ret = match self.updater.func_mut() {
            Some(func) => {
                let ret = call(func, frame)?;
                commit(frame, &ret)?;
                Some(ret)
            }
            None => None,
        };
        self.diastole.update(frame)?;
        Ok(ret)
    }
}

impl<F: ?Sized> Default for Heartbeat<F> {
    fn default() -> Self {
        Self::new(Updater::noop())
    }
}

impl<F: ?Sized> fmt::Debug for Heartbeat<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heartbeat")
            .field("systole", &self.systole)
            .field("updater", &self.updater)
            .field("diastole", &self.diastole)
            .finish()
    }
}

impl Heartbeat<HookFn> {
    /// A heartbeat whose main updater is a hook.
    pub fn hook(f: impl FnMut(&mut Frame) -> Result<(), FrameError> + 'static) -> Self {
        Self::new(Updater::hook(f))
    }
}

impl Heartbeat<UpdateFn> {
    /// A heartbeat whose main updater returns a new field value.
    pub fn value(f: impl FnMut(&mut Frame) -> Result<Option<Value>, FrameError> + 'static) -> Self {
        Self::new(Updater::value(f))
    }
}

impl Heartbeat<DerivativeFn> {
    /// A heartbeat whose main updater computes a derivative.
    pub fn derivative(
        f: impl FnMut(&mut Frame, f64, &Value) -> Result<Value, FrameError> + 'static,
    ) -> Self {
        Self::new(Updater::derivative(f))
    }
}

impl Heartbeat<JacobianFn> {
    /// A heartbeat whose main updater computes a Jacobian.
    pub fn jacobian(f: impl FnMut(&mut Frame, f64) -> Result<Jacobian, FrameError> + 'static) -> Self {
        Self::new(Updater::jacobian(f))
    }
}

impl Heartbeat<StepsizeFn> {
    /// A heartbeat whose main updater returns a desired step size.
    pub fn stepsize(f: impl FnMut(&mut Frame) -> Result<f64, FrameError> + 'static) -> Self {
        Self::new(Updater::stepsize(f))
    }
}

// ── UpdateOrder ─────────────────────────────────────────────────

/// Ordered sequence of children resolved from a list of names.
///
/// Built by [`Frame::resolve_order`]; names that did not resolve are
/// already dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateOrder {
    entries: Vec<(String, Child)>,
}

impl UpdateOrder {
    pub(crate) fn new(entries: Vec<(String, Child)>) -> Self {
        Self { entries }
    }

    /// The retained child names, in update order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// The retained children, in update order.
    pub fn children(&self) -> impl Iterator<Item = Child> + '_ {
        self.entries.iter().map(|(_, child)| *child)
    }

    /// Number of retained children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no children were retained.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn run(&self, frame: &mut Frame) -> Result<(), FrameError> {
        for (_, child) in &self.entries {
            frame.update_child(*child)?;
        }
        Ok(())
    }
}

// ── UpdateRule ──────────────────────────────────────────────────

/// What a reactive slot does when it fires.
pub enum UpdateRule<F: ?Sized> {
    /// Nothing.
    NoOp,
    /// A single callable.
    Callable(Box<F>),
    /// Children updated strictly in order.
    Sequence(UpdateOrder),
    /// Systole, main updater, diastole.
    Heartbeat(Heartbeat<F>),
}

impl<F: ?Sized> UpdateRule<F> {
    /// Whether this rule is [`UpdateRule::NoOp`].
    pub fn is_noop(&self) -> bool {
        matches!(self, Self::NoOp)
    }

    /// The update order, if this rule is a sequence.
    pub fn update_order(&self) -> Option<&UpdateOrder> {
        match self {
            Self::Sequence(order) => Some(order),
            _ => None,
        }
    }

    /// Fires the rule. `call` invokes the slot's callable and `commit`
    /// stores its result before any diastole runs.
    ///
    /// Returns `None` for no-ops, sequences, and heartbeats without a main
    /// updater.
    pub(crate) fn run<R>(
        &mut self,
        frame: &mut Frame,
        call: impl FnOnce(&mut F, &mut Frame) -> Result<R, FrameError>,
        commit: impl FnOnce(&mut Frame, &R) -> Result<(), FrameError>,
    ) -> Result<Option<R>, FrameError> {
        match self {
            Self::NoOp => Ok(None),
            Self::Callable(func) => {
                let ret = call(&mut **func, frame)?;
                commit(frame, &ret)?;
                Ok(Some(ret))
            }
            Self::Sequence(order) => {
                order.run(frame)?;
                Ok(None)
            }
            Self::Heartbeat(heartbeat) => heartbeat.beat_with(frame, call, commit),
        }
    }

    pub(crate) fn reject_sequence(&self, slot: &str) -> Result<(), FrameError> {
        match self {
            Self::Sequence(_) => Err(FrameError::configuration(format!(
                "{slot} cannot be an update order"
            ))),
            _ => Ok(()),
        }
    }
}

impl<F: ?Sized> Default for UpdateRule<F> {
    fn default() -> Self {
        Self::NoOp
    }
}

impl<F: ?Sized> From<Heartbeat<F>> for UpdateRule<F> {
    fn from(heartbeat: Heartbeat<F>) -> Self {
        Self::Heartbeat(heartbeat)
    }
}

impl<F: ?Sized> From<UpdateOrder> for UpdateRule<F> {
    fn from(order: UpdateOrder) -> Self {
        Self::Sequence(order)
    }
}

impl<F: ?Sized> fmt::Debug for UpdateRule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOp => write!(f, "NoOp"),
            Self::Callable(_) => write!(f, "Callable"),
            Self::Sequence(order) => f
                .debug_tuple("Sequence")
                .field(&order.names().collect::<Vec<_>>())
                .finish(),
            Self::Heartbeat(heartbeat) => fmt::Debug::fmt(heartbeat, f),
        }
    }
}

impl UpdateRule<HookFn> {
    /// A single hook callable.
    pub fn hook(f: impl FnMut(&mut Frame) -> Result<(), FrameError> + 'static) -> Self {
        Self::Callable(Box::new(f))
    }

    /// Fires the hook rule.
    pub fn beat(&mut self, frame: &mut Frame) -> Result<(), FrameError> {
        self.run(frame, |func, frame| func(frame), |_, _| Ok(()))
            .map(|_| ())
    }
}

impl UpdateRule<UpdateFn> {
    /// A single field value updater.
    pub fn value(f: impl FnMut(&mut Frame) -> Result<Option<Value>, FrameError> + 'static) -> Self {
        Self::Callable(Box::new(f))
    }
}

impl UpdateRule<DerivativeFn> {
    /// A single derivative callable.
    pub fn derivative(
        f: impl FnMut(&mut Frame, f64, &Value) -> Result<Value, FrameError> + 'static,
    ) -> Self {
        Self::Callable(Box::new(f))
    }
}

impl UpdateRule<JacobianFn> {
    /// A single Jacobian callable.
    pub fn jacobian(f: impl FnMut(&mut Frame, f64) -> Result<Jacobian, FrameError> + 'static) -> Self {
        Self::Callable(Box::new(f))
    }
}

impl UpdateRule<StepsizeFn> {
    /// A single step size callable.
    pub fn stepsize(f: impl FnMut(&mut Frame) -> Result<f64, FrameError> + 'static) -> Self {
        Self::Callable(Box::new(f))
    }

    /// A constant step size.
    pub fn fixed(dx: f64) -> Self {
        Self::stepsize(move |_| Ok(dx))
    }
}
