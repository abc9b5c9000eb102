pub mod block;
pub mod factorial;
pub mod table;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DesignError {
    #[error("factor {name} has {len} values, expected {expected}")]
    UnevenFactor {
        name: String,
        len: usize,
        expected: usize,
    },
    #[error("factor {0} has no levels")]
    EmptyLevels(String),
    #[error("factor {name}: range with step {step} never reaches {stop} from {start}")]
    BadRange {
        name: String,
        start: f64,
        stop: f64,
        step: f64,
    },
    #[error("failed to read design file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse design file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
