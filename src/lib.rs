//! condlab: trial design and execution engine for vision/behavior
//! experiments.
//!
//! A condition table maps factor names to equal-length value lists; a block
//! partition groups conditions by shared block-factor values; the scheduler
//! draws blocks and conditions under configurable sampling methods while
//! tracking repeat counts; the trial log records sparse, rectangular
//! per-trial observations and batches completed trials to a notification
//! sink. Stimulus rendering, transport, and hardware I/O live elsewhere and
//! connect through the `ParamSink` and `NotifySink` traits.

pub mod config;
pub mod design;
pub mod run;
pub mod value;

pub use config::ExperimentConfig;
pub use design::table::ConditionTable;
pub use run::scheduler::CondScheduler;
pub use run::trials::TrialLog;
pub use value::FactorValue;
