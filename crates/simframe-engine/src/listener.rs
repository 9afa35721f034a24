//! Out-of-band control of a running simulation.
//!
//! The run loop polls its [`Listener`] once before every integration
//! step. [`ChannelListener`] receives signals over a crossbeam channel so
//! another thread can steer a run without sharing the frame.

use crossbeam_channel::{Receiver, Sender};

/// A request delivered to a running simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlSignal {
    /// Write output for the upcoming snapshot now, overwriting.
    Write {
        /// Optional file name override.
        filename: Option<String>,
    },
    /// Dump the frame.
    Dump {
        /// Optional file name override.
        filename: Option<String>,
    },
    /// Stop the run before the next step.
    Stop,
}

/// Source of control signals.
pub trait Listener {
    /// The next pending signal, without blocking.
    fn listen(&mut self) -> Option<ControlSignal>;
}

/// A listener backed by a channel receiver.
#[derive(Debug)]
pub struct ChannelListener {
    rx: Receiver<ControlSignal>,
}

impl ChannelListener {
    /// Listens on an existing receiver.
    pub fn new(rx: Receiver<ControlSignal>) -> Self {
        Self { rx }
    }

    /// An unbounded channel and a listener on its receiving end.
    pub fn channel() -> (Sender<ControlSignal>, Self) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (tx, Self::new(rx))
    }
}

impl Listener for ChannelListener {
    fn listen(&mut self) -> Option<ControlSignal> {
        self.rx.try_recv().ok()
    }
}
