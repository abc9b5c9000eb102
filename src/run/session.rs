//! Session driver: the single loop that owns scheduler and trial log.
//!
//! Observation producers (timers, I/O callbacks) stay off this loop; they
//! send [`ObsEvent`]s over a channel and the driver drains the queue at
//! trial boundaries, so scheduler and log are only ever touched from one
//! thread.

use crossbeam_channel::Receiver;
use tracing::{debug, info};

use crate::run::scheduler::{CondScheduler, ParamSink};
use crate::run::trials::{NotifySink, TrialLog, TrialNotifier};
use crate::run::SchedError;
use crate::value::FactorValue;

/// Observation routed into the trial log from outside the driver loop.
#[derive(Debug, Clone)]
pub enum ObsEvent {
    /// Scalar parameter for the open trial.
    Scalar { name: String, value: FactorValue },
    /// Timestamped sub-event appended to the open trial's list slot.
    Event { name: String, time: f64 },
    /// Keyed sub-event appended to the open trial's pair slot.
    Mark {
        name: String,
        key: String,
        value: FactorValue,
    },
}

/// Per-trial record names written by the driver itself.
pub const COND_INDEX_PARAM: &str = "cond_index";
pub const BLOCK_INDEX_PARAM: &str = "block_index";

pub struct Session {
    pub scheduler: CondScheduler,
    pub log: TrialLog,
    notifier: Option<TrialNotifier>,
    cond_repeat_target: u64,
    block_repeat_target: u64,
}

impl Session {
    pub fn new(
        scheduler: CondScheduler,
        cond_repeat_target: u64,
        block_repeat_target: u64,
        notifier: Option<TrialNotifier>,
    ) -> Self {
        Self {
            scheduler,
            log: TrialLog::new(),
            notifier,
            cond_repeat_target,
            block_repeat_target,
        }
    }

    /// Every condition has reached its total repeat target.
    pub fn complete(&self) -> bool {
        self.scheduler
            .session_complete(self.cond_repeat_target, self.block_repeat_target)
    }

    /// Close the open trial and start the next one.
    ///
    /// Drains observations queued since the previous step into the trial
    /// they were recorded under, flushes any due notification batch, then
    /// draws the next condition, opens its trial, and pushes the condition's
    /// factor values to `sinks`. Returns the condition index drawn, or
    /// `None` when there is nothing to sample.
    pub fn step(
        &mut self,
        sinks: &mut [&mut dyn ParamSink],
        obs_rx: &Receiver<ObsEvent>,
        notify_sink: Option<&mut dyn NotifySink>,
        time: f64,
    ) -> Result<Option<usize>, SchedError> {
        self.close_open_trial(obs_rx, notify_sink, time);

        let Some(cond) = self
            .scheduler
            .next(self.cond_repeat_target, None, None, true)?
        else {
            return Ok(None);
        };
        self.log.new_trial();
        self.log.add(COND_INDEX_PARAM, FactorValue::Int(cond as i64));
        if let Some(block) = self.scheduler.current_block() {
            self.log
                .add(BLOCK_INDEX_PARAM, FactorValue::Int(block as i64));
        }
        self.scheduler.push_condition(sinks, None, &[], false);
        debug!(trial = ?self.log.current_trial(), cond, "trial opened");
        Ok(Some(cond))
    }

    /// Drain remaining observations and flush the notifier after the last
    /// trial.
    pub fn finish(
        &mut self,
        obs_rx: &Receiver<ObsEvent>,
        notify_sink: Option<&mut dyn NotifySink>,
        time: f64,
    ) {
        self.close_open_trial(obs_rx, notify_sink, time);
        info!(
            trials = self.log.trial_count(),
            complete = self.complete(),
            "session finished"
        );
    }

    fn close_open_trial(
        &mut self,
        obs_rx: &Receiver<ObsEvent>,
        notify_sink: Option<&mut dyn NotifySink>,
        time: f64,
    ) {
        for event in obs_rx.try_iter() {
            match event {
                ObsEvent::Scalar { name, value } => self.log.add(&name, value),
                ObsEvent::Event { name, time } => {
                    self.log.add_in_list(&name, FactorValue::Float(time))
                }
                ObsEvent::Mark { name, key, value } => self.log.add_pair(&name, key, value),
            }
        }
        if let (Some(notifier), Some(sink)) = (self.notifier.as_ref(), notify_sink) {
            notifier.flush(&mut self.log, sink, time);
        }
    }
}
