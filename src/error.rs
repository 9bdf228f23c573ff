use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetanetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid range: to_timestamp ({to}) must be greater than from_timestamp ({from})")]
    InvalidRange { from: i64, to: i64 },

    #[error("Invalid density: {0}")]
    InvalidDensity(String),

    #[error("Generation did not converge after {batches} batches (achieved {achieved:.5} of {desired:.5} packets/s)")]
    NonConvergingGeneration {
        batches: usize,
        achieved: f64,
        desired: f64,
    },

    #[error("Generation cancelled after {batches} batches")]
    Cancelled { batches: usize },

    #[error("Malformed blocklist {path}:{line}: {reason}")]
    Blocklist {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, MetanetError>;
