//! Trial log: append-only, trial-indexed, sparse parameter series.
//!
//! Each named parameter is a series with one slot per trial. Slots are
//! filled lazily; writing a value for the current trial pads any skipped
//! earlier trials with the missing sentinel first, so no series ever grows
//! past the current trial and reads see rectangular data.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::value::FactorValue;

/// One filled trial slot: a scalar, an in-trial list of values, or an
/// in-trial list of keyed values. The missing sentinel is the `None` of the
/// surrounding `Option`.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Scalar(FactorValue),
    List(Vec<FactorValue>),
    Pairs(Vec<(String, FactorValue)>),
}

/// Receiver for batched trial-range notifications, e.g. a cross-process
/// replication bridge. Both callbacks report acceptance; a refused batch is
/// retried whole on the next flush.
pub trait NotifySink {
    /// One parameter's slots for trials `first_trial..first_trial + values.len()`.
    fn push_range(&mut self, name: &str, first_trial: usize, values: &[Option<Observation>])
        -> bool;
    /// End of one batch; `time` is the host experiment clock in seconds.
    fn commit(&mut self, time: f64) -> bool;
}

type Hook = Box<dyn FnMut() + Send>;

/// Sparse rectangular store of per-trial observations.
#[derive(Default)]
pub struct TrialLog {
    series: BTreeMap<String, Vec<Option<Observation>>>,
    current: Option<usize>,
    notified: Option<usize>,
    on_new_trial: Option<Hook>,
    on_clear: Option<Hook>,
}

impl TrialLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the trial currently open for observations.
    pub fn current_trial(&self) -> Option<usize> {
        self.current
    }

    /// Trials closed or open so far.
    pub fn trial_count(&self) -> usize {
        self.current.map_or(0, |c| c + 1)
    }

    /// Highest trial index already accepted by a notification sink.
    pub fn notified_trial(&self) -> Option<usize> {
        self.notified
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Full series of one parameter; slots beyond its length are missing by
    /// convention.
    pub fn series(&self, name: &str) -> Option<&[Option<Observation>]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn set_on_new_trial(&mut self, hook: impl FnMut() + Send + 'static) {
        self.on_new_trial = Some(Box::new(hook));
    }

    pub fn set_on_clear(&mut self, hook: impl FnMut() + Send + 'static) {
        self.on_clear = Some(Box::new(hook));
    }

    /// Open the next trial. Series data is untouched; earlier trials left
    /// unwritten stay missing.
    pub fn new_trial(&mut self) {
        if let Some(hook) = self.on_new_trial.as_mut() {
            hook();
        }
        self.current = Some(self.current.map_or(0, |c| c + 1));
    }

    /// Record a scalar observation for the current trial. Ignored before the
    /// first trial. A second write of the same parameter within one trial
    /// replaces the slot.
    pub fn add(&mut self, name: &str, value: FactorValue) {
        self.put(name, Observation::Scalar(value));
    }

    /// Append a value to the current trial's list slot for `name`, creating
    /// the list on first use within the trial.
    pub fn add_in_list(&mut self, name: &str, value: FactorValue) {
        let Some(cur) = self.current else {
            debug!(param = name, "observation before first trial dropped");
            return;
        };
        let slot = self.slot_mut(name, cur);
        match slot {
            Some(Observation::List(items)) => items.push(value),
            Some(other) => {
                warn!(param = name, "list observation replaces non-list slot");
                *other = Observation::List(vec![value]);
            }
            None => *slot = Some(Observation::List(vec![value])),
        }
    }

    /// Append a keyed value to the current trial's pair-list slot for `name`.
    pub fn add_pair(&mut self, name: &str, key: impl Into<String>, value: FactorValue) {
        let Some(cur) = self.current else {
            debug!(param = name, "observation before first trial dropped");
            return;
        };
        let slot = self.slot_mut(name, cur);
        match slot {
            Some(Observation::Pairs(pairs)) => pairs.push((key.into(), value)),
            Some(other) => {
                warn!(param = name, "keyed observation replaces non-pair slot");
                *other = Observation::Pairs(vec![(key.into(), value)]);
            }
            None => *slot = Some(Observation::Pairs(vec![(key.into(), value)])),
        }
    }

    fn put(&mut self, name: &str, obs: Observation) {
        let Some(cur) = self.current else {
            debug!(param = name, "observation before first trial dropped");
            return;
        };
        *self.slot_mut(name, cur) = Some(obs);
    }

    /// Slot for trial `trial` of series `name`, padding skipped trials with
    /// the missing sentinel. Afterwards the series length is exactly
    /// `trial + 1`.
    fn slot_mut(&mut self, name: &str, trial: usize) -> &mut Option<Observation> {
        let series = self.series.entry(name.to_string()).or_default();
        while series.len() <= trial {
            series.push(None);
        }
        debug_assert_eq!(series.len(), trial + 1);
        &mut series[trial]
    }

    /// Observations of trial `trial`, restricted to series already written
    /// through that trial. A series still short of `trial + 1` slots is
    /// omitted entirely, so a half-written trial is never observable.
    pub fn snapshot(&self, trial: usize) -> BTreeMap<&str, &Observation> {
        self.series
            .iter()
            .filter(|(_, slots)| slots.len() == trial + 1)
            .filter_map(|(name, slots)| {
                slots[trial].as_ref().map(|obs| (name.as_str(), obs))
            })
            .collect()
    }

    /// Drop all series and reset both trial cursors.
    pub fn clear(&mut self) {
        if let Some(hook) = self.on_clear.as_mut() {
            hook();
        }
        self.series.clear();
        self.current = None;
        self.notified = None;
    }

    fn set_notified(&mut self, trial: usize) {
        self.notified = Some(trial);
    }
}

/// Batched notification policy over a [`TrialLog`].
///
/// Flushes the range of trials past the log's notified high-water mark once
/// it spans at least `batch` trials (a batch of zero notifies every trial).
/// The mark only advances when the sink accepts every parameter range and
/// the batch commit, so a refused batch is retried whole.
#[derive(Debug, Clone)]
pub struct TrialNotifier {
    params: Vec<String>,
    batch: usize,
}

impl TrialNotifier {
    pub fn new(params: Vec<String>, batch: usize) -> Self {
        Self { params, batch }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Push any due range to `sink`; returns true when the high-water mark
    /// advanced.
    pub fn flush(&self, log: &mut TrialLog, sink: &mut dyn NotifySink, time: f64) -> bool {
        let Some(current) = log.current_trial() else {
            return false;
        };
        let first = log.notified_trial().map_or(0, |n| n + 1);
        if first > current {
            return false;
        }
        let pending = current - first + 1;
        if pending < self.batch.max(1) {
            return false;
        }

        let mut accepted = true;
        for name in &self.params {
            let values: Vec<Option<Observation>> = (first..=current)
                .map(|trial| {
                    log.series(name)
                        .and_then(|slots| slots.get(trial))
                        .cloned()
                        .flatten()
                })
                .collect();
            accepted &= sink.push_range(name, first, &values);
        }
        accepted &= sink.commit(time);

        if accepted {
            log.set_notified(current);
        } else {
            debug!(first, current, "notification batch refused; will retry");
        }
        accepted
    }
}
