//! Fields: named, shaped state variables.

use simframe_core::{FrameError, GroupId, IntVarId, Value};

use crate::updater::{DerivativeFn, JacobianFn, UpdateFn, UpdateRule};

/// A named array-valued state variable.
///
/// A field's shape is fixed at registration. A constant field rejects every
/// write after it is frozen. Fields are created through
/// [`Frame::add_field`](crate::Frame::add_field) and live as long as the
/// frame.
#[derive(Debug)]
pub struct Field {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) value: Value,
    pub(crate) constant: bool,
    pub(crate) save: bool,
    pub(crate) parent: GroupId,
    pub(crate) intvar: Option<IntVarId>,
    pub(crate) updater: UpdateRule<UpdateFn>,
    pub(crate) differentiator: UpdateRule<DerivativeFn>,
    pub(crate) jacobinator: UpdateRule<JacobianFn>,
}

impl Field {
    pub(crate) fn new(name: String, value: Value, parent: GroupId) -> Self {
        Self {
            name,
            description: String::new(),
            value,
            constant: false,
            save: true,
            parent,
            intvar: None,
            updater: UpdateRule::NoOp,
            differentiator: UpdateRule::NoOp,
            jacobinator: UpdateRule::NoOp,
        }
    }

    /// The field's name within its parent group.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Sets the description.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// The committed value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The field's fixed shape.
    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    /// The group this field is registered in.
    pub fn parent(&self) -> GroupId {
        self.parent
    }

    /// Whether the field rejects writes.
    pub fn is_constant(&self) -> bool {
        self.constant
    }

    /// Freezes the field. Every later write fails with
    /// [`FrameError::ConstantViolation`].
    pub fn freeze(&mut self) {
        self.constant = true;
    }

    /// Whether writers should persist this field.
    pub fn save(&self) -> bool {
        self.save
    }

    /// Opts the field in or out of persistence by writers.
    pub fn set_save(&mut self, save: bool) {
        self.save = save;
    }

    /// The integration variable this field backs, if any.
    pub fn integration_variable(&self) -> Option<IntVarId> {
        self.intvar
    }

    /// Commits a new value.
    ///
    /// Fails with [`FrameError::ConstantViolation`] on a constant field and
    /// [`FrameError::ShapeMismatch`] when the shape differs. On failure the
    /// previous value is left untouched.
    pub fn set_value(&mut self, value: impl Into<Value>) -> Result<(), FrameError> {
        let value = value.into();
        self.check_write(&value)?;
        self.value = value;
        Ok(())
    }

    /// Commits a borrowed value, with the same checks as
    /// [`set_value`](Field::set_value).
    pub fn assign(&mut self, value: &Value) -> Result<(), FrameError> {
        self.check_write(value)?;
        self.value.as_mut_slice().copy_from_slice(value.as_slice());
        Ok(())
    }

    pub(crate) fn check_write(&self, value: &Value) -> Result<(), FrameError> {
        if self.constant {
            return Err(FrameError::ConstantViolation {
                field: self.name.clone(),
            });
        }
        if !self.value.same_shape(value) {
            return Err(FrameError::ShapeMismatch {
                field: self.name.clone(),
                expected: self.value.shape().to_vec(),
                found: value.shape().to_vec(),
            });
        }
        Ok(())
    }

    /// Sets what [`Frame::update_field`](crate::Frame::update_field) does.
    pub fn set_updater(&mut self, rule: impl Into<UpdateRule<UpdateFn>>) -> Result<(), FrameError> {
        let rule = rule.into();
        rule.reject_sequence("a field updater")?;
        self.updater = rule;
        Ok(())
    }

    /// Sets the derivative used by integration schemes.
    pub fn set_differentiator(
        &mut self,
        rule: impl Into<UpdateRule<DerivativeFn>>,
    ) -> Result<(), FrameError> {
        let rule = rule.into();
        rule.reject_sequence("a differentiator")?;
        self.differentiator = rule;
        Ok(())
    }

    /// Sets the Jacobian used by implicit schemes, and by
    /// [`Frame::derivative`](crate::Frame::derivative) when no
    /// differentiator is set.
    pub fn set_jacobinator(
        &mut self,
        rule: impl Into<UpdateRule<JacobianFn>>,
    ) -> Result<(), FrameError> {
        let rule = rule.into();
        rule.reject_sequence("a jacobinator")?;
        self.jacobinator = rule;
        Ok(())
    }

    /// Whether a value updater is set.
    pub fn has_updater(&self) -> bool {
        !self.updater.is_noop()
    }

    /// Whether a differentiator is set.
    pub fn has_differentiator(&self) -> bool {
        !self.differentiator.is_noop()
    }

    /// Whether a jacobinator is set.
    pub fn has_jacobinator(&self) -> bool {
        !self.jacobinator.is_noop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::updater::UpdateOrder;

    fn field(value: impl Into<Value>) -> Field {
        Field::new("Y".into(), value.into(), GroupId::ROOT)
    }

    #[test]
    fn set_value_commits_matching_shape() {
        let mut f = field([1.0, 2.0]);
        f.set_value([3.0, 4.0]).unwrap();
        assert_eq!(f.value().as_slice(), &[3.0, 4.0]);
    }

    #[test]
    fn shape_mismatch_keeps_previous_value() {
        let mut f = field([1.0, 2.0]);
        let err = f.set_value([1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(err, FrameError::ShapeMismatch { .. }));
        assert_eq!(f.value().as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn frozen_field_rejects_writes() {
        let mut f = field(5.0);
        f.freeze();
        let err = f.set_value(6.0).unwrap_err();
        assert_eq!(err, FrameError::ConstantViolation { field: "Y".into() });
        assert!(f.assign(&Value::scalar(7.0)).is_err());
        assert_eq!(f.value().item(), Some(5.0));
    }

    #[test]
    fn scalar_assignment_normalizes_shape() {
        let mut f = field(0.0);
        assert_eq!(f.shape(), &[1]);
        f.set_value(2.0).unwrap();
        f.set_value(vec![3.0]).unwrap();
        assert_eq!(f.value().item(), Some(3.0));
    }

    #[test]
    fn sequence_is_not_a_field_updater() {
        let mut f = field(0.0);
        let err = f.set_updater(UpdateOrder::default()).unwrap_err();
        assert!(matches!(err, FrameError::Configuration { .. }));
        assert!(!f.has_updater());
    }
}
