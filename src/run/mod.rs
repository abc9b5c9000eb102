pub mod sampling;
pub mod scheduler;
pub mod session;
pub mod trials;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedError {
    #[error("manual condition index {0} is not in any block's sample space")]
    UnknownCondition(usize),
    #[error("manual block index {index} out of range ({n_blocks} blocks)")]
    UnknownBlock { index: usize, n_blocks: usize },
}
