//! Integration schemes for simframe.
//!
//! Every scheme implements the engine's [`Scheme`](simframe_engine::Scheme)
//! trait and can be wrapped in an
//! [`Instruction`](simframe_engine::Instruction).
//!
//! - [`ExplicitScheme`]: fixed-step Runge–Kutta from a [`ButcherTableau`].
//! - [`AdaptiveScheme`]: embedded pairs with an [`AdaptiveController`].
//! - [`ImplicitEuler`], [`ImplicitMidpoint`]: Jacobian-based schemes for
//!   stiff linear problems.
//! - [`SchemeKind`]: the full catalogue, addressable by name.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod adaptive;
pub mod catalogue;
pub mod explicit;
pub mod gmres;
pub mod implicit;
pub mod tableau;

pub use adaptive::{adaptive_stepsize, AdaptiveController, AdaptiveScheme};
pub use catalogue::SchemeKind;
pub use explicit::ExplicitScheme;
pub use gmres::{GmresError, GmresOptions, GmresSolution};
pub use implicit::{ImplicitEuler, ImplicitMidpoint, LinearSolver};
pub use tableau::ButcherTableau;
