use thiserror::Error;
use valya_types::{Algorithm, TypeError};

/// Why a single identifier record could not be encoded or decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("digest of {algorithm} identifier is {actual} bytes, expected {expected}")]
    DigestLength {
        algorithm: Algorithm,
        expected: usize,
        actual: usize,
    },

    #[error("record tag needs {needed} bytes, {available} remain")]
    ShortTag { needed: usize, available: usize },

    #[error("record names an unknown algorithm: {0}")]
    UnknownAlgorithm(#[from] TypeError),

    #[error("{algorithm} digest needs {expected} bytes, {available} remain")]
    ShortDigest {
        algorithm: Algorithm,
        expected: usize,
        available: usize,
    },

    #[error("record name has no separator")]
    MissingSeparator,
}

/// Errors from building index nodes and compressing identifier lists.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("index node needs at least one identifier")]
    EmptyNode,

    #[error("record encoding failed: {0}")]
    Record(#[from] RecordError),

    #[error("index node of {size} bytes exceeds the {max} byte ceiling")]
    Overflow { size: usize, max: usize },

    #[error("grouping {count} identifiers did not shrink the level")]
    NoProgress { count: usize },

    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}

pub type FormatResult<T> = Result<T, FormatError>;
