// Headless runner: resolve a design file, run trials, print a summary.

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

use condlab::config::ExperimentConfig;
use condlab::design::factorial::DesignSpec;
use condlab::run::scheduler::{CondScheduler, ParamSink};
use condlab::run::session::{ObsEvent, Session};
use condlab::run::trials::{NotifySink, Observation, TrialNotifier};
use condlab::value::FactorValue;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Design file (TOML factor levels)
    #[arg(value_name = "DESIGN_PATH")]
    design: String,

    /// Path to config TOML
    #[arg(long, default_value = "condlab.toml")]
    config: String,

    /// Stop after this many trials even if targets are not met
    #[arg(long, default_value_t = 1000)]
    max_trials: usize,

    /// Override the config's RNG seed
    #[arg(long)]
    seed: Option<u64>,
}

/// Stand-in stimulus target: logs every parameter it is handed.
struct TraceSink;

impl ParamSink for TraceSink {
    fn set_param(&mut self, name: &str, value: &FactorValue) -> bool {
        info!(param = name, value = %value, "stimulus parameter");
        true
    }
}

/// Stand-in replication bridge: logs each notified trial range.
struct TraceNotify;

impl NotifySink for TraceNotify {
    fn push_range(&mut self, name: &str, first_trial: usize, values: &[Option<Observation>]) -> bool {
        info!(
            param = name,
            first_trial,
            trials = values.len(),
            "notified trial range"
        );
        true
    }

    fn commit(&mut self, time: f64) -> bool {
        info!(time, "notification batch committed");
        true
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let cfg = ExperimentConfig::load_or_default(&args.config);
    let seed = args.seed.unwrap_or(cfg.sampling.seed);

    let design = DesignSpec::load(&args.design)
        .with_context(|| format!("loading design {}", args.design))?;
    let table = design.resolve().context("resolving design")?;
    info!(
        conditions = table.n_cond(),
        factors = table.n_factors(),
        seed,
        "design resolved"
    );

    let mut scheduler = CondScheduler::new(seed);
    scheduler.set_scan_step(cfg.sampling.scan_step);
    scheduler.initialize(
        table,
        cfg.sampling.cond_method,
        cfg.sampling.block_method,
        &cfg.sampling.block_factors,
    );

    let notifier = (!cfg.session.notify_params.is_empty())
        .then(|| TrialNotifier::new(cfg.session.notify_params.clone(), cfg.session.notify_batch));
    let mut session = Session::new(
        scheduler,
        cfg.session.cond_repeat,
        cfg.session.block_repeat,
        notifier,
    );

    // Observations normally arrive from hardware or UI callbacks; here a
    // seeded generator stands in for a subject's response latency.
    let (obs_tx, obs_rx) = crossbeam_channel::unbounded();
    let mut subject = SmallRng::seed_from_u64(seed ^ 0x5eed);

    let mut sink = TraceSink;
    let mut notify = TraceNotify;
    let mut trials = 0usize;
    while !session.complete() && trials < args.max_trials {
        let mut sinks: [&mut dyn ParamSink; 1] = [&mut sink];
        let drawn = session.step(&mut sinks, &obs_rx, Some(&mut notify), trials as f64)?;
        if drawn.is_none() {
            break;
        }
        obs_tx.send(ObsEvent::Scalar {
            name: "latency".to_string(),
            value: FactorValue::Float(0.2 + subject.random::<f64>() * 0.3),
        })?;
        trials += 1;
    }
    session.finish(&obs_rx, Some(&mut notify), trials as f64);

    println!("ran {trials} trials, targets met: {}", session.complete());
    for cond in 0..session.scheduler.table().n_cond() {
        let row = session.scheduler.table().condition(cond);
        let desc: Vec<String> = row.iter().map(|(k, v)| format!("{k}={v}")).collect();
        println!(
            "  cond {cond}: {} repeats ({})",
            session.scheduler.cond_repeat(cond),
            desc.join(", ")
        );
    }
    let params: Vec<&str> = session.log.param_names().collect();
    println!("recorded params: {}", params.join(", "));
    Ok(())
}
