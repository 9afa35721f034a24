//! Reactive frame model and integration engine for simframe.
//!
//! Provides the [`Frame`] that owns a hierarchy of fields and groups,
//! the heartbeat update protocol, and the [`Integrator`] that advances
//! fields along a control variable with retry and atomic commit. The
//! [`run`](Frame::run) loop drives integration through a snapshot
//! schedule, handing output to a [`Writer`] and taking direction from a
//! [`Listener`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod field;
pub mod frame;
pub mod group;
pub mod instruction;
pub mod integrator;
pub mod intvar;
pub mod listener;
pub mod metrics;
pub mod output;
pub mod run;
pub mod scheme;
pub mod updater;

pub use config::IntegratorConfig;
pub use field::Field;
pub use frame::Frame;
pub use group::Group;
pub use instruction::{Instruction, InstructionStatus};
pub use integrator::{IntegrationError, Integrator};
pub use intvar::IntVar;
pub use listener::{ChannelListener, ControlSignal, Listener};
pub use metrics::{IntegrationMetrics, RunSummary};
pub use output::{OutputError, Writer};
pub use run::RunError;
pub use scheme::{Scheme, SchemeContext, SchemeOutcome};
pub use updater::{
    DerivativeFn, Heartbeat, HookFn, JacobianFn, StepsizeFn, UpdateFn, UpdateOrder, UpdateRule,
    Updater,
};
