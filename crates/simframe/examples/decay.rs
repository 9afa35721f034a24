//! Exponential decay integrated with any catalogued scheme.
//!
//! ```sh
//! RUST_LOG=debug cargo run -p simframe --example decay -- cash-karp
//! ```
//!
//! The optional argument names a scheme (default `dormand-prince`).
//! Every snapshot is printed next to the exact solution.

use simframe::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Prints `Y` against `exp(-t)` at each snapshot.
struct TableWriter {
    t: IntVarId,
    y: FieldId,
}

impl Writer for TableWriter {
    fn write(
        &mut self,
        frame: &Frame,
        index: usize,
        _force_overwrite: bool,
        _filename: Option<&str>,
    ) -> Result<(), OutputError> {
        let t = frame
            .control_value(self.t)
            .map_err(|e| OutputError::new(e.to_string()))?;
        let y = frame
            .value(self.y)
            .map_err(|e| OutputError::new(e.to_string()))?
            .item()
            .ok_or_else(|| OutputError::new("Y is not a scalar"))?;
        let exact = (-t).exp();
        println!(
            "{index:>4}  t = {t:>6.2}  Y = {y:.10e}  exact = {exact:.10e}  rel err = {:.2e}",
            (y / exact - 1.0).abs()
        );
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let kind: SchemeKind = std::env::args()
        .nth(1)
        .as_deref()
        .unwrap_or("dormand-prince")
        .parse()?;

    // 1. Build the frame.
    let mut frame = Frame::with_description("exponential decay");
    let snapshots: Vec<f64> = (0..=10).map(f64::from).collect();
    let t = frame.add_integration_variable(GroupId::ROOT, "t", 0.0, snapshots)?;
    let y = frame.add_field(GroupId::ROOT, "Y", 1.0)?;
    {
        let field = frame.field_mut(y)?;
        field.set_description("decaying quantity");
        field.set_differentiator(UpdateRule::derivative(|_, _, y| Ok(-y)))?;
        field.set_jacobinator(UpdateRule::jacobian(|_, _| Ok(Jacobian::from_element(1, 1, -1.0))))?;
    }

    // 2. Step size: adaptive schemes follow their own suggestions.
    let initial = 0.1;
    if kind.is_adaptive() {
        frame.intvar_mut(t)?.set_updater(adaptive_stepsize(t, initial))?;
    } else {
        frame.intvar_mut(t)?.set_updater(UpdateRule::fixed(initial))?;
    }

    // 3. Integrator and output.
    let config = IntegratorConfig::new(t)
        .with_instruction(Instruction::from_boxed(kind.build(), y))
        .with_description(format!("{kind} on Y"));
    frame.set_integrator(Integrator::new(config)?)?;
    frame.set_writer(TableWriter { t, y });

    print!("{}", frame.toc());
    let summary = frame.run()?;
    info!(
        scheme = %kind,
        steps = summary.steps,
        rejected = summary.rejected_attempts,
        elapsed_us = summary.elapsed_us,
        "decay finished"
    );
    Ok(())
}
