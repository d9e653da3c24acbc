use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use valya_types::{Algorithm, BlockId};

use crate::error::{StoreError, StoreResult};
use crate::traits::BlockStore;

/// In-memory, HashMap-based block store.
///
/// Intended for tests and embedding. Blocks are held behind a `RwLock`; the
/// lock is only taken inside synchronous sections, never across an await.
pub struct InMemoryBlockStore {
    algorithm: Algorithm,
    blocks: RwLock<HashMap<BlockId, Bytes>>,
}

impl InMemoryBlockStore {
    /// Create a new empty store that derives SHA-256 identifiers.
    pub fn new() -> Self {
        Self::with_algorithm(Algorithm::Sha2_256)
    }

    /// Create a new empty store deriving identifiers with `algorithm`.
    pub fn with_algorithm(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            blocks: RwLock::new(HashMap::new()),
        }
    }

    /// Number of blocks currently stored.
    pub fn len(&self) -> usize {
        self.blocks.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blocks.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored blocks.
    pub fn total_bytes(&self) -> u64 {
        self.blocks
            .read()
            .expect("lock poisoned")
            .values()
            .map(|content| content.len() as u64)
            .sum()
    }

    /// Synchronous lookup, for inspection in tests and embedding.
    pub fn get(&self, id: &BlockId) -> Option<Bytes> {
        self.blocks.read().expect("lock poisoned").get(id).cloned()
    }

    /// Remove all blocks from the store.
    pub fn clear(&self) {
        self.blocks.write().expect("lock poisoned").clear();
    }

    /// Return a sorted list of all block IDs in the store.
    pub fn all_ids(&self) -> Vec<BlockId> {
        let map = self.blocks.read().expect("lock poisoned");
        let mut ids: Vec<BlockId> = map.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for InMemoryBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlockStore for InMemoryBlockStore {
    async fn list(&self) -> StoreResult<HashSet<BlockId>> {
        let map = self.blocks.read().expect("lock poisoned");
        Ok(map.keys().cloned().collect())
    }

    async fn check(&self, id: &BlockId) -> StoreResult<bool> {
        let map = self.blocks.read().expect("lock poisoned");
        Ok(map.contains_key(id))
    }

    async fn fetch(&self, id: &BlockId) -> StoreResult<Bytes> {
        self.get(id).ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn put(&self, content: &[u8]) -> StoreResult<BlockId> {
        let id = BlockId::of(self.algorithm, content);
        let mut map = self.blocks.write().expect("lock poisoned");
        if map.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        map.insert(id.clone(), Bytes::copy_from_slice(content));
        Ok(id)
    }
}

impl std::fmt::Debug for InMemoryBlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlockStore")
            .field("algorithm", &self.algorithm)
            .field("block_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    // -----------------------------------------------------------------------
    // Core operations
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_and_fetch() {
        let store = InMemoryBlockStore::new();
        let id = store.put(b"hello world").await.unwrap();
        assert_eq!(id, BlockId::of(Algorithm::Sha2_256, b"hello world"));

        let content = store.fetch(&id).await.unwrap();
        assert_eq!(&content[..], b"hello world");
    }

    #[tokio::test]
    async fn fetch_missing_is_not_found() {
        let store = InMemoryBlockStore::new();
        let id = BlockId::of(Algorithm::Sha2_256, b"missing");
        assert!(matches!(
            store.fetch(&id).await,
            Err(StoreError::NotFound(missing)) if missing == id
        ));
    }

    #[tokio::test]
    async fn check_reflects_presence() {
        let store = InMemoryBlockStore::new();
        let absent = BlockId::of(Algorithm::Sha2_256, b"absent");
        assert!(!store.check(&absent).await.unwrap());

        let id = store.put(b"present").await.unwrap();
        assert!(store.check(&id).await.unwrap());
    }

    #[tokio::test]
    async fn list_returns_every_id() {
        let store = InMemoryBlockStore::new();
        let a = store.put(b"aaa").await.unwrap();
        let b = store.put(b"bbb").await.unwrap();

        let ids = store.list().await.unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a));
        assert!(ids.contains(&b));
    }

    // -----------------------------------------------------------------------
    // Content-addressing
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn duplicate_put_reports_already_exists() {
        let store = InMemoryBlockStore::new();
        let id = store.put(b"identical content").await.unwrap();
        match store.put(b"identical content").await {
            Err(StoreError::AlreadyExists(existing)) => assert_eq!(existing, id),
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn empty_content_is_storable() {
        let store = InMemoryBlockStore::new();
        let id = store.put(b"").await.unwrap();
        assert!(store.fetch(&id).await.unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Utility methods
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn len_total_bytes_and_clear() {
        let store = InMemoryBlockStore::new();
        assert!(store.is_empty());

        store.put(b"12345").await.unwrap();
        store.put(b"123456789").await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.total_bytes(), 14);

        store.clear();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn all_ids_is_sorted() {
        let store = InMemoryBlockStore::new();
        for content in [&b"x"[..], b"y", b"z"] {
            store.put(content).await.unwrap();
        }
        let ids = store.all_ids();
        assert_eq!(ids.len(), 3);
        for w in ids.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[tokio::test]
    async fn concurrent_puts_of_same_content() {
        let store = Arc::new(InMemoryBlockStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.put(b"raced").await })
            })
            .collect();

        let mut created = 0;
        for h in handles {
            match h.await.expect("task should not panic") {
                Ok(_) => created += 1,
                Err(StoreError::AlreadyExists(_)) => {}
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn debug_format() {
        let store = InMemoryBlockStore::default();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryBlockStore"));
        assert!(debug.contains("block_count"));
    }
}
