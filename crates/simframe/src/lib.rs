//! simframe: reactive data frames with adaptive ODE integration.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all simframe sub-crates. For most users, adding `simframe` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use simframe::prelude::*;
//!
//! // dY/dt = -Y on t ∈ [0, 1], written at t = 0.5 and t = 1.
//! let mut frame = Frame::with_description("decay");
//! let t = frame
//!     .add_integration_variable(GroupId::ROOT, "t", 0.0, vec![0.5, 1.0])
//!     .unwrap();
//! let y = frame.add_field(GroupId::ROOT, "Y", 1.0).unwrap();
//! frame
//!     .field_mut(y)
//!     .unwrap()
//!     .set_differentiator(UpdateRule::derivative(|_, _, y| Ok(-y)))
//!     .unwrap();
//! frame
//!     .intvar_mut(t)
//!     .unwrap()
//!     .set_updater(adaptive_stepsize(t, 0.1))
//!     .unwrap();
//!
//! let config = IntegratorConfig::new(t)
//!     .with_instruction(Instruction::new(AdaptiveScheme::dormand_prince(), y));
//! frame.set_integrator(Integrator::new(config).unwrap()).unwrap();
//!
//! let summary = frame.run().unwrap();
//! assert!(summary.steps > 0);
//! assert_eq!(frame.control_value(t).unwrap(), 1.0);
//! let exact = (-1.0f64).exp();
//! assert!((frame.value(y).unwrap().item().unwrap() - exact).abs() < 1e-3);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `simframe-core` | `Value`, handles, `FrameError` |
//! | [`engine`] | `simframe-engine` | Frame, updaters, integrator, run loop |
//! | [`schemes`] | `simframe-schemes` | Runge–Kutta tableaux, implicit schemes, GMRES |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core values, handles, and errors (`simframe-core`).
pub use simframe_core as types;

/// The reactive frame model and integration engine (`simframe-engine`).
///
/// [`engine::Frame`] owns the hierarchy; [`engine::Integrator`] advances it
/// one step and [`engine::Frame::run`] drives it over the snapshot
/// schedule.
pub use simframe_engine as engine;

/// Integration schemes (`simframe-schemes`).
///
/// Look schemes up by name through [`schemes::SchemeKind`] or build them
/// directly, e.g. [`schemes::ExplicitScheme::rk4`].
pub use simframe_schemes as schemes;

/// Common imports for typical simframe usage.
///
/// ```rust
/// use simframe::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use simframe_core::{Child, FieldId, FrameError, GroupId, IntVarId, Jacobian, Value};

    // Frame model
    pub use simframe_engine::{Field, Frame, Group, Heartbeat, IntVar, UpdateRule};

    // Integration
    pub use simframe_engine::{
        Instruction, IntegrationError, IntegrationMetrics, Integrator, IntegratorConfig,
        RunError, RunSummary, Scheme, SchemeContext, SchemeOutcome,
    };

    // Output and control
    pub use simframe_engine::{
        ChannelListener, ControlSignal, Listener, OutputError, Writer,
    };

    // Schemes
    pub use simframe_schemes::{
        adaptive_stepsize, AdaptiveScheme, ExplicitScheme, ImplicitEuler, ImplicitMidpoint,
        SchemeKind,
    };
}
