//! Content-addressed block storage for Valya.
//!
//! Valya never owns durability. It consumes a block store through the
//! [`BlockStore`] trait: a flat, content-addressed key-value store keyed by
//! [`BlockId`](valya_types::BlockId).
//!
//! # Storage Backends
//!
//! - [`InMemoryBlockStore`] -- `HashMap`-based store for tests and embedding
//! - [`DirectoryBlockStore`] -- one file per block under a root directory
//!
//! # Design Rules
//!
//! 1. Blocks are immutable once written (content-addressing guarantees this).
//! 2. A duplicate `put` reports [`StoreError::AlreadyExists`]; callers that
//!    only care about durability treat it as success.
//! 3. Every call is a possible suspension point; nothing is held locked
//!    across one.
//! 4. The store never interprets block contents.

pub mod directory;
pub mod error;
pub mod memory;
pub mod traits;

pub use directory::DirectoryBlockStore;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryBlockStore;
pub use traits::BlockStore;
