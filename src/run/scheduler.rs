//! Condition scheduler: block and condition draw order, repeat accounting,
//! and factor-value push to external parameter sinks.

use rand::rngs::SmallRng;
use rand::SeedableRng;
use tracing::{debug, error, warn};

use crate::design::block::{partition, BlockPartition};
use crate::design::table::ConditionTable;
use crate::run::sampling::{SampleMethod, SampleSpace};
use crate::run::SchedError;
use crate::value::FactorValue;

/// Anything that can receive a named parameter value, e.g. a stimulus
/// renderer or a UI panel. Returns false when the name is not recognized.
pub trait ParamSink {
    fn set_param(&mut self, name: &str, value: &FactorValue) -> bool;
}

/// Draws the next condition to run.
///
/// Owns the condition table, its block partition, one sample space for
/// blocks and one per block for conditions, and all repeat counters. Driven
/// from a single experiment loop; see [`crate::run::session`].
pub struct CondScheduler {
    table: ConditionTable,
    partition: BlockPartition,
    cond_method: SampleMethod,
    block_method: SampleMethod,
    block_space: SampleSpace,
    cond_spaces: Vec<SampleSpace>,
    block_repeat: Vec<u64>,
    cond_repeat: Vec<u64>,
    cond_of_block_repeat: Vec<Vec<u64>>,
    current_block: Option<usize>,
    current_cond: Option<usize>,
    skip_count: u64,
    scan_step: usize,
    rng: SmallRng,
}

impl CondScheduler {
    /// Empty scheduler; call [`initialize`](Self::initialize) before sampling.
    pub fn new(seed: u64) -> Self {
        Self::from_rng(SmallRng::seed_from_u64(seed))
    }

    /// Empty scheduler drawing all randomness from `rng`.
    pub fn from_rng(rng: SmallRng) -> Self {
        Self {
            table: ConditionTable::empty(),
            partition: BlockPartition::default(),
            cond_method: SampleMethod::Ascending,
            block_method: SampleMethod::Ascending,
            block_space: SampleSpace::empty(),
            cond_spaces: Vec::new(),
            block_repeat: Vec::new(),
            cond_repeat: Vec::new(),
            cond_of_block_repeat: Vec::new(),
            current_block: None,
            current_cond: None,
            skip_count: 0,
            scan_step: 1,
            rng,
        }
    }

    /// Partition the table, build all sample spaces, and zero every counter.
    /// An empty table is not fatal: every later draw reports no selection.
    pub fn initialize(
        &mut self,
        table: ConditionTable,
        cond_method: SampleMethod,
        block_method: SampleMethod,
        block_factors: &[String],
    ) {
        if table.is_empty() {
            warn!("initializing scheduler with an empty condition table; nothing to sample");
        }
        let partition = partition(&table, block_factors);
        let n_blocks = partition.n_blocks();

        self.cond_spaces = partition
            .groups()
            .iter()
            .map(|group| SampleSpace::generate(group.clone(), cond_method, &mut self.rng))
            .collect();
        self.block_space =
            SampleSpace::generate((0..n_blocks).collect(), block_method, &mut self.rng);

        self.block_repeat = vec![0; n_blocks];
        self.cond_repeat = vec![0; table.n_cond()];
        self.cond_of_block_repeat = partition
            .groups()
            .iter()
            .map(|group| vec![0; group.len()])
            .collect();
        self.current_block = None;
        self.current_cond = None;
        self.skip_count = 0;
        self.table = table;
        self.partition = partition;
        self.cond_method = cond_method;
        self.block_method = block_method;
    }

    pub fn table(&self) -> &ConditionTable {
        &self.table
    }

    pub fn partition(&self) -> &BlockPartition {
        &self.partition
    }

    pub fn n_blocks(&self) -> usize {
        self.partition.n_blocks()
    }

    pub fn current_block(&self) -> Option<usize> {
        self.current_block
    }

    pub fn current_cond(&self) -> Option<usize> {
        self.current_cond
    }

    /// Hold the current condition for the next `n` draws.
    pub fn set_skip_count(&mut self, n: u64) {
        self.skip_count = n;
    }

    pub fn skip_count(&self) -> u64 {
        self.skip_count
    }

    /// Cursor step for the ascending/descending scan methods.
    pub fn set_scan_step(&mut self, step: usize) {
        self.scan_step = step.max(1);
    }

    pub fn block_repeat(&self, b: usize) -> u64 {
        self.block_repeat.get(b).copied().unwrap_or(0)
    }

    pub fn cond_repeat(&self, cond: usize) -> u64 {
        self.cond_repeat.get(cond).copied().unwrap_or(0)
    }

    /// Select the next block, bump its repeat count, and reset the entered
    /// block's condition cursor and per-block repeat counters.
    ///
    /// `manual` is consulted only under the manual block method, where it is
    /// the block index itself; an out-of-range manual index is a loud error.
    pub fn sample_block(&mut self, manual: Option<usize>) -> Result<Option<usize>, SchedError> {
        let n_blocks = self.partition.n_blocks();
        if n_blocks == 0 {
            warn!("no blocks to sample");
            return Ok(None);
        }
        let selected = match self.block_method {
            SampleMethod::Manual => {
                let Some(index) = manual else {
                    warn!("manual block sampling without an index; no selection");
                    return Ok(None);
                };
                if index >= n_blocks {
                    return Err(SchedError::UnknownBlock { index, n_blocks });
                }
                // Manual block spaces keep ascending order, so position == index.
                self.block_space.select_at(index);
                index
            }
            _ => match self.block_space.advance(self.scan_step, &mut self.rng) {
                Some(b) => b,
                None => return Ok(None),
            },
        };

        self.block_repeat[selected] += 1;
        self.current_block = Some(selected);
        self.cond_spaces[selected].reset();
        for count in &mut self.cond_of_block_repeat[selected] {
            *count = 0;
        }
        debug!(block = selected, repeat = self.block_repeat[selected], "sampled block");
        Ok(Some(selected))
    }

    /// Select the next condition within the current block and bump its
    /// repeat counters.
    ///
    /// Under the manual condition method, `manual` is a condition index; it
    /// is looked up across every block's sample space and re-targets the
    /// current block accordingly. A condition index in no space is a loud
    /// error and leaves the scheduler untouched.
    pub fn sample_condition(&mut self, manual: Option<usize>) -> Result<Option<usize>, SchedError> {
        let (block, selected) = match self.cond_method {
            SampleMethod::Manual => {
                let Some(index) = manual else {
                    warn!("manual condition sampling without an index; no selection");
                    return Ok(None);
                };
                let located = (0..self.cond_spaces.len()).find_map(|b| {
                    self.cond_spaces[b].position_of(index).map(|pos| (b, pos))
                });
                let Some((b, pos)) = located else {
                    return Err(SchedError::UnknownCondition(index));
                };
                self.current_block = Some(b);
                self.cond_spaces[b].select_at(pos);
                (b, index)
            }
            _ => {
                let Some(b) = self.current_block else {
                    warn!("condition sampling before any block is selected");
                    return Ok(None);
                };
                match self.cond_spaces[b].advance(self.scan_step, &mut self.rng) {
                    Some(cond) => (b, cond),
                    None => return Ok(None),
                }
            }
        };

        if let Some(group) = self.partition.group(block) {
            if let Some(gpos) = group.iter().position(|&c| c == selected) {
                self.cond_of_block_repeat[block][gpos] += 1;
            }
        }
        self.cond_repeat[selected] += 1;
        self.current_cond = Some(selected);
        debug!(
            block,
            cond = selected,
            repeat = self.cond_repeat[selected],
            "sampled condition"
        );
        Ok(Some(selected))
    }

    /// Draw the condition for the next trial.
    ///
    /// A pending skip count holds the previous selection instead of
    /// advancing. Otherwise a block is selected first if none is, or
    /// re-selected when `auto_advance_block` is set and every condition in
    /// the current block has reached `cond_repeat_target` repeats since the
    /// block was entered; then a condition is drawn.
    pub fn next(
        &mut self,
        cond_repeat_target: u64,
        manual_cond: Option<usize>,
        manual_block: Option<usize>,
        auto_advance_block: bool,
    ) -> Result<Option<usize>, SchedError> {
        if self.skip_count > 0 {
            self.skip_count -= 1;
            debug!(cond = ?self.current_cond, remaining = self.skip_count, "holding condition");
            return Ok(self.current_cond);
        }
        match self.current_block {
            None => {
                self.sample_block(manual_block)?;
            }
            Some(b) => {
                if auto_advance_block && self.all_in_block_repeated(b, cond_repeat_target) {
                    self.sample_block(manual_block)?;
                }
            }
        }
        self.sample_condition(manual_cond)
    }

    /// Condition `cond` sampled at least `n` times since initialization.
    pub fn is_cond_repeated(&self, cond: usize, n: u64) -> bool {
        self.cond_repeat.get(cond).is_some_and(|&r| r >= n)
    }

    /// Block `b` entered at least `n` times since initialization.
    pub fn is_block_repeated(&self, b: usize, n: u64) -> bool {
        self.block_repeat.get(b).is_some_and(|&r| r >= n)
    }

    /// Every condition of block `b` sampled at least `n` times since the
    /// block was last entered.
    pub fn all_in_block_repeated(&self, b: usize, n: u64) -> bool {
        self.cond_of_block_repeat
            .get(b)
            .is_some_and(|counts| counts.iter().all(|&r| r >= n))
    }

    /// Every condition sampled at least `n` times in total.
    pub fn all_cond_repeated(&self, n: u64) -> bool {
        self.cond_repeat.iter().all(|&r| r >= n)
    }

    /// Typical termination check: every condition sampled at least
    /// `cond_repeat_target * max(block_repeat_target, 1)` times in total.
    pub fn session_complete(&self, cond_repeat_target: u64, block_repeat_target: u64) -> bool {
        self.all_cond_repeated(cond_repeat_target * block_repeat_target.max(1))
    }

    /// Push the factor values of a condition to every sink.
    ///
    /// Defaults to the current condition. Factors named in `exclude`, and
    /// the block factors when `exclude_block_factors` is set, are skipped.
    /// With several sinks a sink not recognizing a name is skipped silently;
    /// a lone sink is expected to handle every factor, so a refusal is
    /// logged.
    pub fn push_condition(
        &self,
        sinks: &mut [&mut dyn ParamSink],
        cond: Option<usize>,
        exclude: &[&str],
        exclude_block_factors: bool,
    ) {
        let Some(cond) = cond.or(self.current_cond) else {
            warn!("no condition to push");
            return;
        };
        let lone = sinks.len() == 1;
        for name in self.table.factor_names() {
            if exclude.contains(&name) {
                continue;
            }
            if exclude_block_factors && self.partition.factors().iter().any(|f| f == name) {
                continue;
            }
            let Some(value) = self.table.value(name, cond) else {
                continue;
            };
            for sink in sinks.iter_mut() {
                if !sink.set_param(name, value) && lone {
                    error!(param = name, cond, "sink does not accept condition parameter");
                }
            }
        }
    }

    /// Push the block-factor values of a block to every sink. Defaults to
    /// the current block; same per-sink failure policy as
    /// [`push_condition`](Self::push_condition).
    pub fn push_block(&self, sinks: &mut [&mut dyn ParamSink], block: Option<usize>, exclude: &[&str]) {
        let Some(block) = block.or(self.current_block) else {
            warn!("no block to push");
            return;
        };
        let lone = sinks.len() == 1;
        for name in self.partition.factors() {
            if exclude.contains(&name.as_str()) {
                continue;
            }
            let Some(value) = self.partition.value(name, block) else {
                continue;
            };
            for sink in sinks.iter_mut() {
                if !sink.set_param(name, value) && lone {
                    error!(param = name.as_str(), block, "sink does not accept block parameter");
                }
            }
        }
    }
}
