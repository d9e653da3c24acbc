use std::collections::HashSet;

use async_trait::async_trait;
use bytes::Bytes;
use valya_types::BlockId;

use crate::error::StoreResult;

/// Content-addressed block store.
///
/// All implementations must satisfy these invariants:
/// - Blocks are immutable once written. The same content always produces
///   the same ID.
/// - `put` of content that is already stored fails with
///   [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists) carrying
///   the existing ID.
/// - Concurrent calls are safe; no call holds a lock across a suspension
///   point.
/// - The store never interprets block contents.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Identifiers of every stored block.
    async fn list(&self) -> StoreResult<HashSet<BlockId>>;

    /// Whether a block with this identifier is stored.
    async fn check(&self, id: &BlockId) -> StoreResult<bool>;

    /// Read a block's content.
    ///
    /// Fails with `NotFound` if the block does not exist.
    async fn fetch(&self, id: &BlockId) -> StoreResult<Bytes>;

    /// Store `content` and return its content-derived identifier.
    async fn put(&self, content: &[u8]) -> StoreResult<BlockId>;
}
