//! The root container: registration, navigation, and reactive updates.
//!
//! A [`Frame`] owns every field, group, and integration variable in flat
//! arenas indexed by typed handles. Groups hold an ordered name→[`Child`]
//! map into those arenas. Reactive slots are moved out of their arena
//! entry while they fire, so callbacks receive `&mut Frame` and may read
//! or write any other part of the hierarchy.

use std::fmt;
use std::fmt::Write as _;
use std::mem;

use simframe_core::{Child, FieldId, FrameError, GroupId, IntVarId, Jacobian, Value};
use tracing::{debug, warn};

use crate::field::Field;
use crate::group::Group;
use crate::integrator::{IntegrationError, Integrator};
use crate::intvar::IntVar;
use crate::listener::{ControlSignal, Listener};
use crate::metrics::IntegrationMetrics;
use crate::output::{OutputError, Writer};
use crate::updater::UpdateOrder;

/// The root of a field hierarchy.
///
/// The frame is itself the root group ([`GroupId::ROOT`]). It holds at most
/// one [`Integrator`], one [`Writer`], and one [`Listener`].
pub struct Frame {
    description: String,
    pub(crate) fields: Vec<Field>,
    pub(crate) groups: Vec<Group>,
    pub(crate) intvars: Vec<IntVar>,
    integrator: Option<Integrator>,
    var: Option<IntVarId>,
    writer: Option<Box<dyn Writer>>,
    listener: Option<Box<dyn Listener>>,
}

impl Frame {
    /// An empty frame.
    pub fn new() -> Self {
        Self {
            description: String::new(),
            fields: Vec::new(),
            groups: vec![Group::new("Frame".into(), None)],
            intvars: Vec::new(),
            integrator: None,
            var: None,
            writer: None,
            listener: None,
        }
    }

    /// An empty frame with a description.
    pub fn with_description(description: impl Into<String>) -> Self {
        let mut frame = Self::new();
        frame.description = description.into();
        frame
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    // ── Registration ────────────────────────────────────────────

    /// Registers a field named `name` under `parent`.
    ///
    /// The field's shape is fixed to that of `value`.
    pub fn add_field(
        &mut self,
        parent: GroupId,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<FieldId, FrameError> {
        let name = name.into();
        self.check_new_child(parent, &name)?;
        let id = FieldId(self.fields.len() as u32);
        self.fields
            .push(Field::new(name.clone(), value.into(), parent));
        self.groups[parent.0 as usize]
            .children
            .insert(name, Child::Field(id));
        Ok(id)
    }

    /// Registers an empty group named `name` under `parent`.
    pub fn add_group(
        &mut self,
        parent: GroupId,
        name: impl Into<String>,
    ) -> Result<GroupId, FrameError> {
        let name = name.into();
        self.check_new_child(parent, &name)?;
        let id = GroupId(self.groups.len() as u32);
        self.groups.push(Group::new(name.clone(), Some(parent)));
        self.groups[parent.0 as usize]
            .children
            .insert(name, Child::Group(id));
        Ok(id)
    }

    /// Registers an integration variable with starting value `value` and
    /// the given snapshot schedule.
    ///
    /// The variable is backed by a scalar field of the same name.
    pub fn add_integration_variable(
        &mut self,
        parent: GroupId,
        name: impl Into<String>,
        value: f64,
        snapshots: impl Into<Vec<f64>>,
    ) -> Result<IntVarId, FrameError> {
        let name = name.into();
        self.check_new_child(parent, &name)?;
        let field_id = FieldId(self.fields.len() as u32);
        let id = IntVarId(self.intvars.len() as u32);
        let intvar = IntVar::new(field_id, name.clone(), snapshots.into())?;
        let mut field = Field::new(name.clone(), Value::scalar(value), parent);
        field.intvar = Some(id);
        self.fields.push(field);
        self.intvars.push(intvar);
        self.groups[parent.0 as usize]
            .children
            .insert(name, Child::Field(field_id));
        Ok(id)
    }

    fn check_new_child(&self, parent: GroupId, name: &str) -> Result<(), FrameError> {
        let group = self.group(parent)?;
        if name.is_empty() || name.contains('.') {
            return Err(FrameError::InvalidName { name: name.into() });
        }
        if group.children.contains_key(name) {
            return Err(FrameError::DuplicateChild {
                group: group.name.clone(),
                name: name.into(),
            });
        }
        Ok(())
    }

    // ── Access ──────────────────────────────────────────────────

    /// The field behind `id`.
    pub fn field(&self, id: FieldId) -> Result<&Field, FrameError> {
        self.fields
            .get(id.0 as usize)
            .ok_or(FrameError::UnknownField(id))
    }

    /// The field behind `id`, mutably.
    pub fn field_mut(&mut self, id: FieldId) -> Result<&mut Field, FrameError> {
        self.fields
            .get_mut(id.0 as usize)
            .ok_or(FrameError::UnknownField(id))
    }

    /// The group behind `id`.
    pub fn group(&self, id: GroupId) -> Result<&Group, FrameError> {
        self.groups
            .get(id.0 as usize)
            .ok_or(FrameError::UnknownGroup(id))
    }

    /// The group behind `id`, mutably.
    pub fn group_mut(&mut self, id: GroupId) -> Result<&mut Group, FrameError> {
        self.groups
            .get_mut(id.0 as usize)
            .ok_or(FrameError::UnknownGroup(id))
    }

    /// The integration variable behind `id`.
    pub fn intvar(&self, id: IntVarId) -> Result<&IntVar, FrameError> {
        self.intvars
            .get(id.0 as usize)
            .ok_or(FrameError::UnknownIntVar(id))
    }

    /// The integration variable behind `id`, mutably.
    pub fn intvar_mut(&mut self, id: IntVarId) -> Result<&mut IntVar, FrameError> {
        self.intvars
            .get_mut(id.0 as usize)
            .ok_or(FrameError::UnknownIntVar(id))
    }

    /// All fields in registration order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldId, &Field)> {
        self.fields
            .iter()
            .enumerate()
            .map(|(i, f)| (FieldId(i as u32), f))
    }

    /// The committed value of a field.
    pub fn value(&self, id: FieldId) -> Result<&Value, FrameError> {
        self.field(id).map(Field::value)
    }

    /// Commits a new value to a field. See [`Field::set_value`].
    pub fn set_value(&mut self, id: FieldId, value: impl Into<Value>) -> Result<(), FrameError> {
        self.field_mut(id)?.set_value(value)
    }

    /// Looks up a direct child of `parent` by name.
    pub fn child(&self, parent: GroupId, name: &str) -> Option<Child> {
        self.groups.get(parent.0 as usize)?.child(name)
    }

    /// Resolves a dotted path such as `"planet.gas.sigma"` from the root.
    pub fn resolve(&self, path: &str) -> Option<Child> {
        let mut current = Child::Group(GroupId::ROOT);
        for part in path.split('.') {
            let group = current.as_group()?;
            current = self.child(group, part)?;
        }
        Some(current)
    }

    /// Resolves a dotted path to a field.
    pub fn field_by_path(&self, path: &str) -> Option<FieldId> {
        self.resolve(path)?.as_field()
    }

    /// The dotted path of a field from the root.
    pub fn field_path(&self, id: FieldId) -> Result<String, FrameError> {
        let field = self.field(id)?;
        let mut parts = vec![field.name.as_str()];
        let mut group = field.parent;
        while let Some(parent) = self.groups[group.0 as usize].parent {
            parts.push(self.groups[group.0 as usize].name.as_str());
            group = parent;
        }
        parts.reverse();
        Ok(parts.join("."))
    }

    // ── Updates ─────────────────────────────────────────────────

    /// Updates the whole hierarchy by firing the root group's rule.
    pub fn update(&mut self) -> Result<(), FrameError> {
        self.update_group(GroupId::ROOT)
    }

    /// Updates one child.
    pub fn update_child(&mut self, child: Child) -> Result<(), FrameError> {
        match child {
            Child::Field(id) => self.update_field(id),
            Child::Group(id) => self.update_group(id),
        }
    }

    /// Fires a group's update rule.
    pub fn update_group(&mut self, id: GroupId) -> Result<(), FrameError> {
        self.group(id)?;
        let idx = id.0 as usize;
        let mut rule = mem::take(&mut self.groups[idx].updater);
        let result = rule.beat(self);
        self.groups[idx].updater = rule;
        result
    }

    /// Fires a field's update rule, committing any returned value before
    /// diastole runs.
    ///
    /// Integration variables are only advanced by the run loop; updating
    /// one directly logs a warning and does nothing.
    pub fn update_field(&mut self, id: FieldId) -> Result<(), FrameError> {
        let field = self.field(id)?;
        if field.intvar.is_some() {
            warn!(
                field = %field.name,
                "integration variable is advanced by the integrator, not by update"
            );
            return Ok(());
        }
        let idx = id.0 as usize;
        let mut rule = mem::take(&mut self.fields[idx].updater);
        let result = rule.run(
            self,
            |func, frame| func(frame),
            |frame, ret: &Option<Value>| match ret {
                Some(value) => frame.fields[idx].assign(value),
                None => Ok(()),
            },
        );
        self.fields[idx].updater = rule;
        result.map(|_| ())
    }

    /// Resolves child names of `group` into an [`UpdateOrder`].
    ///
    /// Unknown names are logged as warnings and dropped.
    pub fn resolve_order<I>(&self, group: GroupId, names: I) -> Result<UpdateOrder, FrameError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let g = self.group(group)?;
        let mut entries = Vec::new();
        for name in names {
            let name = name.as_ref();
            match g.child(name) {
                Some(child) => entries.push((name.to_string(), child)),
                None => warn!(
                    group = %g.name,
                    child = name,
                    "unknown child in update order, skipping"
                ),
            }
        }
        Ok(UpdateOrder::new(entries))
    }

    /// Makes `group` update the named children strictly in the given order.
    pub fn set_update_order<I>(&mut self, group: GroupId, names: I) -> Result<(), FrameError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let order = self.resolve_order(group, names)?;
        self.group_mut(group)?.set_updater(order);
        Ok(())
    }

    // ── Derivatives ─────────────────────────────────────────────

    /// Derivative of field `id` at control value `x` for state `y`.
    ///
    /// Uses the differentiator if one is set, else `jacobian · y` if a
    /// jacobinator is set, else zeros shaped like `y`.
    pub fn derivative(&mut self, id: FieldId, x: f64, y: &Value) -> Result<Value, FrameError> {
        self.field(id)?;
        let idx = id.0 as usize;
        let mut rule = mem::take(&mut self.fields[idx].differentiator);
        let result = rule.run(self, |func, frame| func(frame, x, y), |_, _| Ok(()));
        self.fields[idx].differentiator = rule;

        if let Some(d) = result? {
            if !d.same_shape(y) {
                return Err(FrameError::ShapeMismatch {
                    field: self.fields[idx].name.clone(),
                    expected: y.shape().to_vec(),
                    found: d.shape().to_vec(),
                });
            }
            return Ok(d);
        }

        match self.jacobian(id, x)? {
            Some(jac) => {
                if jac.ncols() != y.len() {
                    return Err(FrameError::JacobianShape {
                        field: self.fields[idx].name.clone(),
                        rows: jac.nrows(),
                        cols: jac.ncols(),
                        expected: y.len(),
                    });
                }
                let dy = &jac * y.to_dvector();
                Value::from_dvector(y.shape(), &dy)
            }
            None => Ok(y.zeros_like()),
        }
    }

    /// Jacobian of field `id` at control value `x`, or `None` without a
    /// jacobinator.
    pub fn jacobian(&mut self, id: FieldId, x: f64) -> Result<Option<Jacobian>, FrameError> {
        self.field(id)?;
        let idx = id.0 as usize;
        let mut rule = mem::take(&mut self.fields[idx].jacobinator);
        let result = rule.run(self, |func, frame| func(frame, x), |_, _| Ok(()));
        self.fields[idx].jacobinator = rule;

        let Some(jac) = result? else {
            return Ok(None);
        };
        let n = self.fields[idx].value.len();
        if jac.nrows() != n || jac.ncols() != n {
            return Err(FrameError::JacobianShape {
                field: self.fields[idx].name.clone(),
                rows: jac.nrows(),
                cols: jac.ncols(),
                expected: n,
            });
        }
        Ok(Some(jac))
    }

    // ── Control variable ────────────────────────────────────────

    /// Current value of an integration variable.
    pub fn control_value(&self, var: IntVarId) -> Result<f64, FrameError> {
        let field = self.intvar(var)?.field;
        Ok(self.fields[field.0 as usize].value.as_slice()[0])
    }

    /// The step the next attempt will try: the variable's desired step,
    /// capped at the distance to the next snapshot.
    pub fn stepsize(&mut self, var: IntVarId) -> Result<f64, FrameError> {
        self.intvar(var)?;
        let idx = var.0 as usize;
        let mut rule = mem::take(&mut self.intvars[idx].updater);
        let result = rule.run(self, |func, frame| func(frame), |_, _| Ok(()));
        self.intvars[idx].updater = rule;

        let desired = result?.ok_or_else(|| FrameError::MissingStepsizeUpdater {
            var: self.intvars[idx].name.clone(),
        })?;
        if !desired.is_finite() || desired <= 0.0 {
            return Err(FrameError::InvalidStepsize { value: desired });
        }
        Ok(desired.min(self.max_stepsize(var)?))
    }

    /// Distance from the current value to the next snapshot.
    pub fn max_stepsize(&self, var: IntVarId) -> Result<f64, FrameError> {
        self.intvar(var)?.max_stepsize(self.control_value(var)?)
    }

    /// The first snapshot strictly ahead of the current value.
    pub fn next_snapshot(&self, var: IntVarId) -> Result<f64, FrameError> {
        self.intvar(var)?.next_snapshot(self.control_value(var)?)
    }

    /// The snapshot preceding [`next_snapshot`](Frame::next_snapshot).
    pub fn prev_snapshot(&self, var: IntVarId) -> Result<Option<f64>, FrameError> {
        self.intvar(var)?.prev_snapshot(self.control_value(var)?)
    }

    /// Proposes a step size for the next attempt. See [`IntVar::suggest`].
    pub fn suggest(&mut self, var: IntVarId, value: f64, reset: bool) -> Result<(), FrameError> {
        self.intvar_mut(var)?.suggest(value, reset)
    }

    /// The smallest step suggested during the current attempt.
    pub fn suggested(&self, var: IntVarId) -> Result<f64, FrameError> {
        self.intvar(var)?.suggested()
    }

    /// Moves the control value forward by `dx`, landing exactly on `cap`
    /// when the step reaches it.
    pub(crate) fn advance(&mut self, var: IntVarId, dx: f64, cap: f64) -> Result<(), FrameError> {
        let field = self.intvar(var)?.field;
        let x = &mut self.fields[field.0 as usize].value.as_mut_slice()[0];
        *x = if dx >= cap - *x { cap } else { *x + dx };
        Ok(())
    }

    // ── Integration ─────────────────────────────────────────────

    /// Installs the integrator, replacing any previous one.
    ///
    /// Fails with [`FrameError::Configuration`] when its variable or any
    /// instruction target does not belong to this frame, or when an
    /// instruction targets the integration variable itself.
    pub fn set_integrator(&mut self, integrator: Integrator) -> Result<(), FrameError> {
        let var = integrator.var();
        let var_field = self
            .intvar(var)
            .map_err(|_| {
                FrameError::configuration(format!(
                    "integration variable {var} does not belong to this frame"
                ))
            })?
            .field;
        for instruction in integrator.instructions() {
            let target = instruction.target();
            if self.field(target).is_err() {
                return Err(FrameError::configuration(format!(
                    "instruction target field {target} does not belong to this frame"
                )));
            }
            if target == var_field {
                return Err(FrameError::configuration(
                    "an instruction cannot target the integration variable",
                ));
            }
        }
        self.var = Some(var);
        self.integrator = Some(integrator);
        Ok(())
    }

    /// The installed integrator.
    ///
    /// Returns `None` while the integrator itself is running.
    pub fn integrator(&self) -> Option<&Integrator> {
        self.integrator.as_ref()
    }

    /// The installed integrator, mutably.
    pub fn integrator_mut(&mut self) -> Option<&mut Integrator> {
        self.integrator.as_mut()
    }

    /// The installed integrator's control variable. Stays available while
    /// the integrator runs.
    pub fn integration_variable(&self) -> Option<IntVarId> {
        self.var
    }

    /// Runs one integration step with the installed integrator.
    pub fn integrate(&mut self) -> Result<IntegrationMetrics, IntegrationError> {
        let mut integrator = self
            .integrator
            .take()
            .ok_or(IntegrationError::NoIntegrator)?;
        let result = integrator.integrate(self);
        if self.integrator.is_none() {
            self.integrator = Some(integrator);
        }
        result
    }

    // ── Collaborators ───────────────────────────────────────────

    /// Installs the output writer.
    pub fn set_writer(&mut self, writer: impl Writer + 'static) {
        self.writer = Some(Box::new(writer));
    }

    /// Removes and returns the output writer.
    pub fn take_writer(&mut self) -> Option<Box<dyn Writer>> {
        self.writer.take()
    }

    /// Installs the control-signal listener.
    pub fn set_listener(&mut self, listener: impl Listener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Removes and returns the listener.
    pub fn take_listener(&mut self) -> Option<Box<dyn Listener>> {
        self.listener.take()
    }

    /// Asks the writer to write output for snapshot `index`. Without a
    /// writer this does nothing.
    pub fn write_output(
        &mut self,
        index: usize,
        force_overwrite: bool,
        filename: Option<&str>,
    ) -> Result<(), OutputError> {
        let Some(mut writer) = self.writer.take() else {
            debug!(index, "no writer installed, skipping output");
            return Ok(());
        };
        let result = writer.write(self, index, force_overwrite, filename);
        if self.writer.is_none() {
            self.writer = Some(writer);
        }
        result
    }

    /// Asks the writer to dump the frame.
    pub fn dump(&mut self, filename: Option<&str>) -> Result<(), OutputError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        let result = writer.dump(self, filename);
        if self.writer.is_none() {
            self.writer = Some(writer);
        }
        result
    }

    pub(crate) fn poll_listener(&mut self) -> Option<ControlSignal> {
        self.listener.as_mut()?.listen()
    }

    // ── Presentation ────────────────────────────────────────────

    /// A table of contents of the hierarchy, one child per line.
    pub fn toc(&self) -> String {
        let mut out = String::new();
        let root = &self.groups[0];
        if self.description.is_empty() {
            let _ = writeln!(out, "{}", root.name);
        } else {
            let _ = writeln!(out, "{} ({})", root.name, self.description);
        }
        self.toc_group(GroupId::ROOT, 1, &mut out);
        out
    }

    fn toc_group(&self, id: GroupId, depth: usize, out: &mut String) {
        let indent = "    ".repeat(depth);
        for (name, child) in self.groups[id.0 as usize].children() {
            match child {
                Child::Field(fid) => {
                    let field = &self.fields[fid.0 as usize];
                    let kind = if field.intvar.is_some() {
                        "IntVar"
                    } else {
                        "Field"
                    };
                    let _ = write!(out, "{indent}- {name}: {kind} {:?}", field.shape());
                    if field.constant {
                        out.push_str(" (constant)");
                    }
                    if !field.description.is_empty() {
                        let _ = write!(out, ", {}", field.description);
                    }
                    out.push('\n');
                }
                Child::Group(gid) => {
                    let group = &self.groups[gid.0 as usize];
                    let _ = write!(out, "{indent}- {name}: Group");
                    if !group.description.is_empty() {
                        let _ = write!(out, ", {}", group.description);
                    }
                    out.push('\n');
                    self.toc_group(gid, depth + 1, out);
                }
            }
        }
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("description", &self.description)
            .field("fields", &self.fields.len())
            .field("groups", &self.groups.len())
            .field("intvars", &self.intvars.len())
            .field("integrator", &self.integrator.is_some())
            .field("writer", &self.writer.is_some())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}
