//! Array-valued state held by fields.
//!
//! A [`Value`] is a flat `f64` buffer plus a shape. Scalars are normalized
//! to the single-element shape `[1]`, so every value has a rank of at
//! least one. Arithmetic is element-wise; a single-element operand
//! broadcasts against any shape.

use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

use nalgebra::{DMatrix, DVector};
use smallvec::{smallvec, SmallVec};

use crate::error::FrameError;

/// Dimensions of a [`Value`], outermost first.
pub type Shape = SmallVec<[usize; 4]>;

/// Dense Jacobian matrix of a field's derivative with respect to itself.
///
/// For a field with `n` elements (flattened in row-major order) the
/// Jacobian is `n × n`.
pub type Jacobian = DMatrix<f64>;

/// Numeric array value with a fixed shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    shape: Shape,
    data: Vec<f64>,
}

impl Value {
    /// A single-element value of shape `[1]`.
    pub fn scalar(v: f64) -> Self {
        Self {
            shape: smallvec![1],
            data: vec![v],
        }
    }

    /// A one-dimensional value of shape `[data.len()]`.
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self {
            shape: smallvec![data.len()],
            data,
        }
    }

    /// A value with an explicit shape.
    ///
    /// An empty `shape` is treated as a scalar (`[1]`). Fails with
    /// [`FrameError::InvalidShape`] when the product of `shape` does not
    /// equal `data.len()`.
    pub fn from_shape_vec(shape: &[usize], data: Vec<f64>) -> Result<Self, FrameError> {
        let shape: Shape = if shape.is_empty() {
            smallvec![1]
        } else {
            SmallVec::from_slice(shape)
        };
        let expected: usize = shape.iter().product();
        if expected != data.len() {
            return Err(FrameError::InvalidShape {
                shape: shape.to_vec(),
                len: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// A zero-filled value of the given shape.
    pub fn zeros(shape: &[usize]) -> Self {
        Self::filled(shape, 0.0)
    }

    /// A value of the given shape with every element set to `v`.
    pub fn filled(shape: &[usize], v: f64) -> Self {
        let shape: Shape = if shape.is_empty() {
            smallvec![1]
        } else {
            SmallVec::from_slice(shape)
        };
        let len = shape.iter().product();
        Self {
            shape,
            data: vec![v; len],
        }
    }

    /// A zero-filled value with the same shape as `self`.
    pub fn zeros_like(&self) -> Self {
        Self {
            shape: self.shape.clone(),
            data: vec![0.0; self.data.len()],
        }
    }

    /// Builds a value of the given shape from a column vector.
    pub fn from_dvector(shape: &[usize], v: &DVector<f64>) -> Result<Self, FrameError> {
        Self::from_shape_vec(shape, v.as_slice().to_vec())
    }

    /// The value's dimensions.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the value holds no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether `self` and `other` have identical shapes.
    pub fn same_shape(&self, other: &Value) -> bool {
        self.shape == other.shape
    }

    /// Flat row-major view of the elements.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable flat row-major view of the elements.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consumes the value, returning its flat buffer.
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// The sole element of a single-element value.
    pub fn item(&self) -> Option<f64> {
        match self.data.as_slice() {
            [v] => Some(*v),
            _ => None,
        }
    }

    /// Copies the elements into a column vector.
    pub fn to_dvector(&self) -> DVector<f64> {
        DVector::from_column_slice(&self.data)
    }

    /// Applies `f` to every element.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Value {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combines `self` and `other` element-wise, broadcasting a
    /// single-element operand.
    ///
    /// # Panics
    ///
    /// Panics if neither shapes match nor one side has a single element.
    pub fn zip_map(&self, other: &Value, f: impl Fn(f64, f64) -> f64) -> Value {
        if self.shape == other.shape {
            let data = self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect();
            return Self {
                shape: self.shape.clone(),
                data,
            };
        }
        if let Some(b) = other.item() {
            return self.map(|a| f(a, b));
        }
        if let Some(a) = self.item() {
            return other.map(|b| f(a, b));
        }
        panic!(
            "incompatible shapes {:?} and {:?}",
            self.shape.as_slice(),
            other.shape.as_slice()
        );
    }

    /// Element-wise absolute value.
    pub fn abs(&self) -> Value {
        self.map(f64::abs)
    }

    /// Largest absolute element, or 0 for an empty value.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
    }

    /// Whether every element is finite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(v) = self.item() {
            return write!(f, "{v}");
        }
        write!(f, "[")?;
        for (i, v) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{v}")?;
        }
        write!(f, "]")
    }
}

// ── Conversions ─────────────────────────────────────────────────

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::scalar(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(data: Vec<f64>) -> Self {
        Self::from_vec(data)
    }
}

impl From<&[f64]> for Value {
    fn from(data: &[f64]) -> Self {
        Self::from_vec(data.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for Value {
    fn from(data: [f64; N]) -> Self {
        Self::from_vec(data.to_vec())
    }
}

impl FromIterator<f64> for Value {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

// ── Arithmetic ──────────────────────────────────────────────────

impl Add<&Value> for &Value {
    type Output = Value;
    fn add(self, rhs: &Value) -> Value {
        self.zip_map(rhs, |a, b| a + b)
    }
}

impl Add<&Value> for Value {
    type Output = Value;
    fn add(mut self, rhs: &Value) -> Value {
        self += rhs;
        self
    }
}

impl Add<Value> for Value {
    type Output = Value;
    fn add(self, rhs: Value) -> Value {
        self + &rhs
    }
}

impl Sub<&Value> for &Value {
    type Output = Value;
    fn sub(self, rhs: &Value) -> Value {
        self.zip_map(rhs, |a, b| a - b)
    }
}

impl Sub<&Value> for Value {
    type Output = Value;
    fn sub(mut self, rhs: &Value) -> Value {
        self -= rhs;
        self
    }
}

impl Sub<Value> for Value {
    type Output = Value;
    fn sub(self, rhs: Value) -> Value {
        self - &rhs
    }
}

impl Mul<&Value> for &Value {
    type Output = Value;
    fn mul(self, rhs: &Value) -> Value {
        self.zip_map(rhs, |a, b| a * b)
    }
}

impl Div<&Value> for &Value {
    type Output = Value;
    fn div(self, rhs: &Value) -> Value {
        self.zip_map(rhs, |a, b| a / b)
    }
}

impl Add<f64> for &Value {
    type Output = Value;
    fn add(self, rhs: f64) -> Value {
        self.map(|a| a + rhs)
    }
}

impl Add<f64> for Value {
    type Output = Value;
    fn add(self, rhs: f64) -> Value {
        &self + rhs
    }
}

impl Sub<f64> for &Value {
    type Output = Value;
    fn sub(self, rhs: f64) -> Value {
        self.map(|a| a - rhs)
    }
}

impl Mul<f64> for &Value {
    type Output = Value;
    fn mul(self, rhs: f64) -> Value {
        self.map(|a| a * rhs)
    }
}

impl Mul<f64> for Value {
    type Output = Value;
    fn mul(mut self, rhs: f64) -> Value {
        self *= rhs;
        self
    }
}

impl Mul<&Value> for f64 {
    type Output = Value;
    fn mul(self, rhs: &Value) -> Value {
        rhs * self
    }
}

impl Mul<Value> for f64 {
    type Output = Value;
    fn mul(self, rhs: Value) -> Value {
        rhs * self
    }
}

impl Div<f64> for &Value {
    type Output = Value;
    fn div(self, rhs: f64) -> Value {
        self.map(|a| a / rhs)
    }
}

impl Neg for &Value {
    type Output = Value;
    fn neg(self) -> Value {
        self.map(|a| -a)
    }
}

impl Neg for Value {
    type Output = Value;
    fn neg(mut self) -> Value {
        for v in &mut self.data {
            *v = -*v;
        }
        self
    }
}

impl AddAssign<&Value> for Value {
    fn add_assign(&mut self, rhs: &Value) {
        if self.shape == rhs.shape {
            for (a, b) in self.data.iter_mut().zip(&rhs.data) {
                *a += b;
            }
        } else {
            *self = self.zip_map(rhs, |a, b| a + b);
        }
    }
}

impl SubAssign<&Value> for Value {
    fn sub_assign(&mut self, rhs: &Value) {
        if self.shape == rhs.shape {
            for (a, b) in self.data.iter_mut().zip(&rhs.data) {
                *a -= b;
            }
        } else {
            *self = self.zip_map(rhs, |a, b| a - b);
        }
    }
}

impl MulAssign<f64> for Value {
    fn mul_assign(&mut self, rhs: f64) {
        for v in &mut self.data {
            *v *= rhs;
        }
    }
}
