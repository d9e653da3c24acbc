use thiserror::Error;

/// Errors produced by type operations.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown algorithm name: {0:?}")]
    UnknownAlgorithmName(String),

    #[error("unknown algorithm tag: family {family}, subtype {subtype}")]
    UnknownAlgorithmTag { family: u32, subtype: u32 },

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid digest length for {algorithm}: expected {expected}, got {actual}")]
    InvalidLength {
        algorithm: String,
        expected: usize,
        actual: usize,
    },

    #[error("malformed block identifier: {0:?}")]
    MalformedId(String),
}
