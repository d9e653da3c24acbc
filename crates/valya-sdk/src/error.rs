use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] valya_store::StoreError),

    #[error("format error: {0}")]
    Format(#[from] valya_format::FormatError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
