//! Test utilities and mock types for simframe development.
//!
//! Provides mock implementations of the engine's collaborator traits
//! ([`Writer`], [`Listener`]) and a [`decay_frame`] scaffold for the
//! standard `dY/dx = -Y` scenario.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use simframe_core::{FieldId, GroupId, IntVarId, Value};
use simframe_engine::{ControlSignal, Frame, Listener, OutputError, UpdateRule, Writer};

/// Handles into a frame built by [`decay_frame`].
pub struct DecayFrame {
    pub frame: Frame,
    pub x: IntVarId,
    pub y: FieldId,
}

/// A frame with integration variable `x` starting at 0 with the given
/// snapshots and fixed step `dx`, and a field `Y` with value `y0` whose
/// derivative is `-Y`.
pub fn decay_frame(y0: impl Into<Value>, dx: f64, snapshots: Vec<f64>) -> DecayFrame {
    let mut frame = Frame::new();
    let x = frame
        .add_integration_variable(GroupId::ROOT, "x", 0.0, snapshots)
        .unwrap();
    frame
        .intvar_mut(x)
        .unwrap()
        .set_updater(UpdateRule::fixed(dx))
        .unwrap();
    let y = frame.add_field(GroupId::ROOT, "Y", y0).unwrap();
    frame
        .field_mut(y)
        .unwrap()
        .set_differentiator(UpdateRule::derivative(|_, _, y| Ok(-y)))
        .unwrap();
    DecayFrame { frame, x, y }
}

/// One call received by a [`RecordingWriter`].
#[derive(Clone, Debug, PartialEq)]
pub enum WriterCall {
    Write {
        index: usize,
        force_overwrite: bool,
        filename: Option<String>,
        /// Control value at the time of the write.
        at: f64,
    },
    Dump {
        filename: Option<String>,
    },
}

/// Writer that records every call into a shared log.
///
/// Clone the log with [`calls`](RecordingWriter::calls) before handing the
/// writer to a frame.
#[derive(Clone)]
pub struct RecordingWriter {
    var: IntVarId,
    calls: Rc<RefCell<Vec<WriterCall>>>,
    fail_at: Option<usize>,
}

impl RecordingWriter {
    pub fn new(var: IntVarId) -> Self {
        Self {
            var,
            calls: Rc::new(RefCell::new(Vec::new())),
            fail_at: None,
        }
    }

    /// Makes writes for snapshot `index` fail.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// The shared call log.
    pub fn calls(&self) -> Rc<RefCell<Vec<WriterCall>>> {
        Rc::clone(&self.calls)
    }
}

impl Writer for RecordingWriter {
    fn write(
        &mut self,
        frame: &Frame,
        index: usize,
        force_overwrite: bool,
        filename: Option<&str>,
    ) -> Result<(), OutputError> {
        if self.fail_at == Some(index) {
            return Err(OutputError::new(format!("refusing snapshot {index}")));
        }
        let at = frame
            .control_value(self.var)
            .map_err(|e| OutputError::new(e.to_string()))?;
        self.calls.borrow_mut().push(WriterCall::Write {
            index,
            force_overwrite,
            filename: filename.map(str::to_string),
            at,
        });
        Ok(())
    }

    fn dump(&mut self, _frame: &Frame, filename: Option<&str>) -> Result<(), OutputError> {
        self.calls.borrow_mut().push(WriterCall::Dump {
            filename: filename.map(str::to_string),
        });
        Ok(())
    }
}

/// Listener that replays a fixed script, one entry per poll.
///
/// `None` entries are polls with no pending signal.
pub struct ScriptedListener {
    script: VecDeque<Option<ControlSignal>>,
}

impl ScriptedListener {
    pub fn new(script: impl IntoIterator<Item = Option<ControlSignal>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }
}

impl Listener for ScriptedListener {
    fn listen(&mut self) -> Option<ControlSignal> {
        self.script.pop_front().flatten()
    }
}
