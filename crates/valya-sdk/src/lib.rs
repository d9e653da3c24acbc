//! High-level SDK for Valya.
//!
//! [`ValyaBlockStore`] wraps any [`BlockStore`] and turns `put` into the full
//! write path: content-defined leaf chunking, leaf storage, tree compression,
//! and bottom-up storage of every index node before the root is returned.
//! Read-side calls pass straight through to the wrapped store.

pub mod config;
pub mod error;
pub mod wrapper;

pub use config::ValyaConfig;
pub use error::{SdkError, SdkResult};
pub use wrapper::{Plan, ValyaBlockStore};

// Re-export key types
pub use valya_format::{Compressed, Decoded, Layout, Version};
pub use valya_store::{BlockStore, DirectoryBlockStore, InMemoryBlockStore, StoreError};
pub use valya_types::{Algorithm, Block, BlockId};
