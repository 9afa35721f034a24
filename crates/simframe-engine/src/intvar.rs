//! Integration variables: the control variable and its snapshot schedule.

use simframe_core::{FieldId, FrameError};

use crate::updater::{StepsizeFn, UpdateRule};

/// Bookkeeping for the control variable of an integration.
///
/// The current value lives in the backing field ([`IntVar::field`]); this
/// struct holds the snapshot schedule and step size negotiation state.
///
/// - `snapshots`: strictly increasing control values at which output is
///   written.
/// - `suggested`: running minimum of step sizes proposed by schemes during
///   the current attempt. Cleared at the start of every attempt.
/// - `prev_stepsize`: the last accepted step.
#[derive(Debug)]
pub struct IntVar {
    pub(crate) field: FieldId,
    pub(crate) name: String,
    pub(crate) snapshots: Vec<f64>,
    pub(crate) suggested: Option<f64>,
    pub(crate) prev_stepsize: Option<f64>,
    pub(crate) updater: UpdateRule<StepsizeFn>,
}

impl IntVar {
    pub(crate) fn new(
        field: FieldId,
        name: String,
        snapshots: Vec<f64>,
    ) -> Result<Self, FrameError> {
        validate_snapshots(&snapshots)?;
        Ok(Self {
            field,
            name,
            snapshots,
            suggested: None,
            prev_stepsize: None,
            updater: UpdateRule::NoOp,
        })
    }

    /// The field holding the current control value.
    pub fn field(&self) -> FieldId {
        self.field
    }

    /// The backing field's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The snapshot schedule.
    pub fn snapshots(&self) -> &[f64] {
        &self.snapshots
    }

    /// Replaces the snapshot schedule. Fails unless strictly increasing.
    pub fn set_snapshots(&mut self, snapshots: Vec<f64>) -> Result<(), FrameError> {
        validate_snapshots(&snapshots)?;
        self.snapshots = snapshots;
        Ok(())
    }

    /// Sets the rule producing the desired step size.
    pub fn set_updater(&mut self, rule: impl Into<UpdateRule<StepsizeFn>>) -> Result<(), FrameError> {
        let rule = rule.into();
        rule.reject_sequence("a step size updater")?;
        self.updater = rule;
        Ok(())
    }

    /// The smallest step suggested during the current attempt.
    pub fn suggested(&self) -> Result<f64, FrameError> {
        self.suggested.ok_or_else(|| FrameError::NoSuggestion {
            var: self.name.clone(),
        })
    }

    /// Folds `value` into the running minimum of suggestions. With `reset`,
    /// earlier suggestions are discarded first.
    pub fn suggest(&mut self, value: f64, reset: bool) -> Result<(), FrameError> {
        if value.is_nan() || value <= 0.0 {
            return Err(FrameError::InvalidSuggestion { value });
        }
        self.suggested = match self.suggested {
            Some(current) if !reset => Some(current.min(value)),
            _ => Some(value),
        };
        Ok(())
    }

    pub(crate) fn clear_suggested(&mut self) {
        self.suggested = None;
    }

    /// The last accepted step, if any round has been committed.
    pub fn prev_stepsize(&self) -> Option<f64> {
        self.prev_stepsize
    }

    /// The first snapshot strictly greater than `x`.
    pub fn next_snapshot(&self, x: f64) -> Result<f64, FrameError> {
        self.next_index(x).map(|i| self.snapshots[i])
    }

    /// The snapshot preceding [`next_snapshot`](IntVar::next_snapshot), or
    /// `None` when the next snapshot is the first.
    pub fn prev_snapshot(&self, x: f64) -> Result<Option<f64>, FrameError> {
        let i = self.next_index(x)?;
        Ok(i.checked_sub(1).map(|p| self.snapshots[p]))
    }

    /// Distance from `x` to the next snapshot.
    pub fn max_stepsize(&self, x: f64) -> Result<f64, FrameError> {
        Ok(self.next_snapshot(x)? - x)
    }

    fn next_index(&self, x: f64) -> Result<usize, FrameError> {
        if self.snapshots.is_empty() {
            return Err(FrameError::NoSnapshots {
                var: self.name.clone(),
            });
        }
        self.snapshots
            .iter()
            .position(|&s| x < s)
            .ok_or_else(|| FrameError::SnapshotsExhausted {
                var: self.name.clone(),
                value: x,
            })
    }
}

fn validate_snapshots(snapshots: &[f64]) -> Result<(), FrameError> {
    if let Some(bad) = snapshots.iter().find(|s| !s.is_finite()) {
        return Err(FrameError::InvalidSnapshots {
            reason: format!("snapshot {bad} is not finite"),
        });
    }
    for (i, pair) in snapshots.windows(2).enumerate() {
        if pair[0] >= pair[1] {
            return Err(FrameError::InvalidSnapshots {
                reason: format!(
                    "snapshot {} ({}) is not less than snapshot {} ({})",
                    i,
                    pair[0],
                    i + 1,
                    pair[1]
                ),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn intvar(snapshots: Vec<f64>) -> Result<IntVar, FrameError> {
        IntVar::new(FieldId(0), "x".into(), snapshots)
    }

    #[test]
    fn snapshots_must_strictly_increase() {
        assert!(matches!(
            intvar(vec![2.0, 1.0]),
            Err(FrameError::InvalidSnapshots { .. })
        ));
        assert!(matches!(
            intvar(vec![1.0, 1.0]),
            Err(FrameError::InvalidSnapshots { .. })
        ));
        assert!(matches!(
            intvar(vec![0.0, f64::NAN]),
            Err(FrameError::InvalidSnapshots { .. })
        ));
        assert!(intvar(vec![1.0, 2.0, 3.0]).is_ok());
    }

    #[test]
    fn set_snapshots_validates() {
        let mut iv = intvar(vec![1.0]).unwrap();
        assert!(iv.set_snapshots(vec![3.0, 2.0]).is_err());
        assert_eq!(iv.snapshots(), &[1.0]);
        iv.set_snapshots(vec![1.0, 5.0]).unwrap();
        assert_eq!(iv.snapshots(), &[1.0, 5.0]);
    }

    #[test]
    fn suggest_keeps_running_minimum() {
        let mut iv = intvar(vec![1.0]).unwrap();
        assert!(matches!(
            iv.suggested(),
            Err(FrameError::NoSuggestion { .. })
        ));
        assert_eq!(
            iv.suggest(-1.0, false),
            Err(FrameError::InvalidSuggestion { value: -1.0 })
        );
        assert!(iv.suggest(0.0, false).is_err());
        iv.suggest(1.0, false).unwrap();
        iv.suggest(2.0, false).unwrap();
        assert_eq!(iv.suggested().unwrap(), 1.0);
        iv.suggest(2.0, true).unwrap();
        assert_eq!(iv.suggested().unwrap(), 2.0);
        iv.clear_suggested();
        assert!(iv.suggested().is_err());
    }

    #[test]
    fn snapshot_navigation() {
        let iv = intvar(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(iv.next_snapshot(2.1).unwrap(), 3.0);
        assert_eq!(iv.prev_snapshot(2.1).unwrap(), Some(2.0));
        assert_eq!(iv.next_snapshot(2.0).unwrap(), 3.0);
        assert_eq!(iv.next_snapshot(0.0).unwrap(), 1.0);
        assert_eq!(iv.prev_snapshot(0.0).unwrap(), None);
        assert!((iv.max_stepsize(2.5).unwrap() - 0.5).abs() < 1e-15);
        assert!(matches!(
            iv.next_snapshot(3.0),
            Err(FrameError::SnapshotsExhausted { .. })
        ));
    }

    #[test]
    fn empty_snapshots_have_no_neighbours() {
        let iv = intvar(vec![]).unwrap();
        assert!(matches!(
            iv.next_snapshot(0.0),
            Err(FrameError::NoSnapshots { .. })
        ));
        assert!(iv.prev_snapshot(0.0).is_err());
    }

    proptest! {
        #[test]
        fn max_stepsize_reaches_exactly_the_next_snapshot(
            mut raw in prop::collection::vec(-1e3f64..1e3, 1..16),
            frac in 0.0f64..1.0,
        ) {
            raw.sort_by(|a, b| a.partial_cmp(b).unwrap());
            raw.dedup();
            let iv = intvar(raw.clone()).unwrap();
            let x = raw[0] - 1.0 + frac * (raw[raw.len() - 1] - raw[0] + 1.0);
            if let Ok(next) = iv.next_snapshot(x) {
                prop_assert!(next > x);
                let max = iv.max_stepsize(x).unwrap();
                prop_assert!(max > 0.0);
                prop_assert!(raw.iter().all(|&s| s <= x || s >= next));
            }
        }
    }
}
