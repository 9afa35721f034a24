//! Core types for the simframe integration framework.
//!
//! This crate defines the shared vocabulary used by all other simframe
//! crates. It has no dependency on the engine.
//!
//! - [`Value`]: shaped `f64` arrays held by fields, with element-wise
//!   arithmetic.
//! - [`FieldId`], [`GroupId`], [`IntVarId`], [`Child`]: typed handles
//!   returned by frame registration.
//! - [`FrameError`]: the data-model error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod value;

pub use error::FrameError;
pub use id::{Child, FieldId, GroupId, IntVarId};
pub use value::{Jacobian, Shape, Value};
