use std::collections::HashSet;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use valya_format::{classify, compress, split_leaves, Compressed, Decoded, Layout, Version};
use valya_store::{BlockStore, StoreError, StoreResult};
use valya_types::{Block, BlockId};

use crate::config::ValyaConfig;
use crate::error::SdkResult;

/// Chunking and compression result for some content, before any storage.
#[derive(Clone, Debug)]
pub struct Plan {
    /// Leaf blocks in content order.
    pub leaves: Vec<Block>,
    pub compressed: Compressed,
}

impl Plan {
    /// The identifier `put` would return for this content.
    pub fn root(&self) -> BlockId {
        match self.compressed.root() {
            Some(root) => root.clone(),
            None => Block::new(Bytes::new()).id().clone(),
        }
    }
}

/// Block store wrapper that stores content as a Valya tree.
///
/// `put` splits content into leaves, stores them, compresses their
/// identifiers into index nodes, stores those children-first, and returns
/// the root. `list` and `check` pass through to the wrapped store. `fetch`
/// is not offered: this wrapper only implements the write path.
#[derive(Debug)]
pub struct ValyaBlockStore<S> {
    source: S,
    layout: Layout,
}

impl<S: BlockStore> ValyaBlockStore<S> {
    /// Wrap `source` using the default (1.1) format.
    pub fn new(source: S) -> Self {
        Self::with_version(source, Version::default())
    }

    pub fn with_version(source: S, version: Version) -> Self {
        Self {
            source,
            layout: version.layout(),
        }
    }

    /// Wrap `source` with a custom layout, validating it first.
    pub fn with_layout(source: S, layout: Layout) -> SdkResult<Self> {
        layout.validate()?;
        Ok(Self { source, layout })
    }

    pub fn from_config(source: S, config: &ValyaConfig) -> SdkResult<Self> {
        Self::with_layout(source, config.layout()?)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Chunk and compress `content` without touching the store.
    pub fn plan(&self, content: impl Into<Bytes>) -> SdkResult<Plan> {
        let content = content.into();
        let leaves = split_leaves(&self.layout, &content)?;
        let ids: Vec<BlockId> = leaves.iter().map(|leaf| leaf.id().clone()).collect();
        let compressed = compress(&self.layout, &ids)?;
        Ok(Plan { leaves, compressed })
    }

    /// Classify raw block content, preferring this wrapper's version and
    /// falling back to the others.
    pub fn decode(&self, bytes: &[u8]) -> Decoded {
        classify(&self.layout, bytes, true)
    }

    /// Store one block, treating "already exists" as success.
    async fn store_block(&self, block: &Block) -> StoreResult<()> {
        match self.source.put(block.content()).await {
            Ok(id) if &id == block.id() => Ok(()),
            Ok(id) => Err(StoreError::Unable(format!(
                "store derived {id} for block {}",
                block.id()
            ))),
            Err(StoreError::AlreadyExists(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn unable_to_encode(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unable(format!("unable to encode content: {e}"))
}

#[async_trait]
impl<S: BlockStore> BlockStore for ValyaBlockStore<S> {
    async fn list(&self) -> StoreResult<HashSet<BlockId>> {
        self.source.list().await
    }

    async fn check(&self, id: &BlockId) -> StoreResult<bool> {
        self.source.check(id).await
    }

    async fn fetch(&self, _id: &BlockId) -> StoreResult<Bytes> {
        Err(StoreError::Unsupported("fetch"))
    }

    async fn put(&self, content: &[u8]) -> StoreResult<BlockId> {
        let content = Bytes::copy_from_slice(content);
        let leaves = split_leaves(&self.layout, &content).map_err(unable_to_encode)?;

        let mut ids = Vec::with_capacity(leaves.len());
        for leaf in &leaves {
            self.store_block(leaf).await?;
            ids.push(leaf.id().clone());
        }
        debug!(leaves = ids.len(), bytes = content.len(), "stored leaves");

        match compress(&self.layout, &ids).map_err(unable_to_encode)? {
            Compressed::Empty => {
                let empty = Block::new(Bytes::new());
                self.store_block(&empty).await?;
                Ok(empty.id().clone())
            }
            Compressed::Single(id) => Ok(id),
            Compressed::Tree {
                root,
                nodes,
                levels,
            } => {
                for node in &nodes {
                    self.store_block(node).await?;
                }
                debug!(root = %root, nodes = nodes.len(), levels, "stored index nodes");
                Ok(root)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use rand::{rngs::StdRng, RngCore, SeedableRng};
    use valya_store::InMemoryBlockStore;
    use valya_types::Algorithm;

    fn pseudo_random(len: usize, seed: u64) -> Vec<u8> {
        let mut data = vec![0u8; len];
        StdRng::seed_from_u64(seed).fill_bytes(&mut data);
        data
    }

    /// Walk the tree under `root` through the wrapped store and concatenate
    /// the leaves.
    async fn reassemble<S: BlockStore>(store: &ValyaBlockStore<S>, root: &BlockId) -> Vec<u8> {
        let mut out = Vec::new();
        let mut stack = vec![root.clone()];
        while let Some(id) = stack.pop() {
            let bytes = store.source().fetch(&id).await.unwrap();
            match store.decode(&bytes) {
                Decoded::Index(children) => stack.extend(children.into_iter().rev()),
                Decoded::Empty => {}
                Decoded::NotIndexNode => out.extend_from_slice(&bytes),
                Decoded::Corrupted(e) => panic!("corrupted node {id}: {e}"),
            }
        }
        out
    }

    /// Fails every `put` after the first `allowed` ones.
    struct FailingStore {
        inner: InMemoryBlockStore,
        allowed: usize,
        puts: AtomicUsize,
    }

    #[async_trait]
    impl BlockStore for FailingStore {
        async fn list(&self) -> StoreResult<HashSet<BlockId>> {
            self.inner.list().await
        }
        async fn check(&self, id: &BlockId) -> StoreResult<bool> {
            self.inner.check(id).await
        }
        async fn fetch(&self, id: &BlockId) -> StoreResult<Bytes> {
            self.inner.fetch(id).await
        }
        async fn put(&self, content: &[u8]) -> StoreResult<BlockId> {
            if self.puts.fetch_add(1, Ordering::SeqCst) >= self.allowed {
                return Err(StoreError::Unable("disk full".into()));
            }
            self.inner.put(content).await
        }
    }

    /// Records the order in which blocks arrive.
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryBlockStore,
        order: Mutex<Vec<BlockId>>,
    }

    #[async_trait]
    impl BlockStore for RecordingStore {
        async fn list(&self) -> StoreResult<HashSet<BlockId>> {
            self.inner.list().await
        }
        async fn check(&self, id: &BlockId) -> StoreResult<bool> {
            self.inner.check(id).await
        }
        async fn fetch(&self, id: &BlockId) -> StoreResult<Bytes> {
            self.inner.fetch(id).await
        }
        async fn put(&self, content: &[u8]) -> StoreResult<BlockId> {
            let result = self.inner.put(content).await;
            if let Ok(id) = &result {
                self.order.lock().unwrap().push(id.clone());
            }
            result
        }
    }

    /// Derives identifiers from something other than the content.
    struct MislabelingStore;

    #[async_trait]
    impl BlockStore for MislabelingStore {
        async fn list(&self) -> StoreResult<HashSet<BlockId>> {
            Ok(HashSet::new())
        }
        async fn check(&self, _id: &BlockId) -> StoreResult<bool> {
            Ok(false)
        }
        async fn fetch(&self, id: &BlockId) -> StoreResult<Bytes> {
            Err(StoreError::NotFound(id.clone()))
        }
        async fn put(&self, _content: &[u8]) -> StoreResult<BlockId> {
            Ok(BlockId::of(Algorithm::Sha2_256, b"something else"))
        }
    }

    // -----------------------------------------------------------------------
    // Put shapes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn empty_content_stores_the_empty_block() {
        let store = ValyaBlockStore::new(InMemoryBlockStore::new());
        let root = store.put(b"").await.unwrap();
        assert_eq!(root, BlockId::of(Algorithm::Sha2_256, b""));
        assert!(store.check(&root).await.unwrap());

        // A second empty put meets AlreadyExists and still succeeds.
        assert_eq!(store.put(b"").await.unwrap(), root);
        assert_eq!(store.source().len(), 1);
    }

    #[tokio::test]
    async fn small_content_is_a_single_leaf() {
        let store = ValyaBlockStore::new(InMemoryBlockStore::new());
        let root = store.put(b"hello valya").await.unwrap();
        assert_eq!(root, BlockId::of(Algorithm::Sha2_256, b"hello valya"));
        assert_eq!(store.source().len(), 1);
        assert_eq!(store.decode(&store.source().get(&root).unwrap()), Decoded::NotIndexNode);
    }

    #[tokio::test]
    async fn large_content_builds_a_tree() {
        let store = ValyaBlockStore::new(InMemoryBlockStore::new());
        let content = pseudo_random(2 << 20, 1);
        let root = store.put(&content).await.unwrap();

        let root_bytes = store.source().get(&root).unwrap();
        assert!(store.decode(&root_bytes).is_index_node());
        assert_eq!(reassemble(&store, &root).await, content);
    }

    #[tokio::test]
    async fn multi_level_tree_reassembles() {
        let layout = Layout::V1_1.with_max_block_size(4096);
        let store = ValyaBlockStore::with_layout(InMemoryBlockStore::new(), layout).unwrap();
        let content = pseudo_random(3 << 20, 2);

        let plan = store.plan(content.clone()).unwrap();
        let Compressed::Tree { levels, .. } = &plan.compressed else {
            panic!("expected a tree");
        };
        assert!(*levels >= 2);

        let root = store.put(&content).await.unwrap();
        assert_eq!(root, plan.root());
        for id in store.source().all_ids() {
            assert!(store.source().get(&id).unwrap().len() <= 4096);
        }
        assert_eq!(reassemble(&store, &root).await, content);
    }

    #[tokio::test]
    async fn legacy_version_reassembles() {
        let layout = Layout::V1.with_max_block_size(4096);
        let store = ValyaBlockStore::with_layout(InMemoryBlockStore::new(), layout).unwrap();
        let content = pseudo_random(1 << 20, 3);

        let root = store.put(&content).await.unwrap();
        let root_bytes = store.source().get(&root).unwrap();
        assert!(root_bytes.starts_with(b"valya-1\x00"));
        assert_eq!(reassemble(&store, &root).await, content);
    }

    // -----------------------------------------------------------------------
    // Idempotence and concurrency
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn repeated_put_is_idempotent() {
        let store = ValyaBlockStore::new(InMemoryBlockStore::new());
        let content = pseudo_random(1 << 20, 4);

        let first = store.put(&content).await.unwrap();
        let count = store.source().len();
        let second = store.put(&content).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.source().len(), count);
    }

    #[tokio::test]
    async fn concurrent_puts_agree() {
        let store = Arc::new(ValyaBlockStore::new(InMemoryBlockStore::new()));
        let content = Arc::new(pseudo_random(1 << 20, 5));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let content = Arc::clone(&content);
                tokio::spawn(async move { store.put(&content).await })
            })
            .collect();

        let mut roots = HashSet::new();
        for h in handles {
            roots.insert(h.await.unwrap().unwrap());
        }
        assert_eq!(roots.len(), 1);
    }

    #[tokio::test]
    async fn shared_prefix_dedups_leaves() {
        let store = ValyaBlockStore::new(InMemoryBlockStore::new());
        let base = pseudo_random(1 << 20, 6);
        store.put(&base).await.unwrap();
        let before = store.source().len();

        let mut edited = base.clone();
        edited.extend_from_slice(&pseudo_random(4096, 7));
        store.put(&edited).await.unwrap();

        let added = store.source().len() - before;
        assert!(added < before / 2, "added {added} of {before}");
    }

    // -----------------------------------------------------------------------
    // Ordering and failure
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn children_are_stored_before_parents() {
        let layout = Layout::V1_1.with_max_block_size(4096);
        let store = ValyaBlockStore::with_layout(RecordingStore::default(), layout).unwrap();
        let content = pseudo_random(2 << 20, 8);
        let root = store.put(&content).await.unwrap();

        let order = store.source().order.lock().unwrap().clone();
        let position: HashMap<&BlockId, usize> =
            order.iter().enumerate().map(|(i, id)| (id, i)).collect();
        assert_eq!(order.last(), Some(&root));

        for (i, id) in order.iter().enumerate() {
            let bytes = store.source().inner.get(id).unwrap();
            if let Decoded::Index(children) = store.decode(&bytes) {
                for child in &children {
                    assert!(position[child] < i, "child {child} stored after parent {id}");
                }
            }
        }
    }

    #[tokio::test]
    async fn store_failure_aborts_put() {
        let failing = FailingStore {
            inner: InMemoryBlockStore::new(),
            allowed: 3,
            puts: AtomicUsize::new(0),
        };
        let store = ValyaBlockStore::new(failing);
        let content = pseudo_random(1 << 20, 9);

        let err = store.put(&content).await.unwrap_err();
        assert!(matches!(err, StoreError::Unable(ref reason) if reason == "disk full"));
        // Put stops at the first failure; the earlier blocks stay as orphans.
        assert_eq!(store.source().puts.load(Ordering::SeqCst), 4);
        assert_eq!(store.source().inner.len(), 3);
    }

    #[tokio::test]
    async fn mislabeled_put_is_unable() {
        let store = ValyaBlockStore::new(MislabelingStore);
        assert!(matches!(
            store.put(b"content").await,
            Err(StoreError::Unable(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Pass-through and planning
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn fetch_is_unsupported() {
        let store = ValyaBlockStore::new(InMemoryBlockStore::new());
        let id = store.put(b"present").await.unwrap();
        assert!(matches!(
            store.fetch(&id).await,
            Err(StoreError::Unsupported("fetch"))
        ));
    }

    #[tokio::test]
    async fn list_and_check_pass_through() {
        let store = ValyaBlockStore::new(InMemoryBlockStore::new());
        let id = store.source().put(b"direct").await.unwrap();
        assert!(store.check(&id).await.unwrap());
        assert_eq!(store.list().await.unwrap(), HashSet::from([id]));
    }

    #[tokio::test]
    async fn plan_matches_put() {
        let store = ValyaBlockStore::new(InMemoryBlockStore::new());
        let content = pseudo_random(1 << 20, 10);
        let plan = store.plan(content.clone()).unwrap();
        assert!(store.source().is_empty());

        let root = store.put(&content).await.unwrap();
        assert_eq!(root, plan.root());
        assert_eq!(
            store.source().len(),
            plan.leaves.len() + plan.compressed.nodes().len()
        );
    }

    #[test]
    fn plan_of_empty_content() {
        let store = ValyaBlockStore::new(InMemoryBlockStore::new());
        let plan = store.plan(Bytes::new()).unwrap();
        assert!(plan.leaves.is_empty());
        assert_eq!(plan.compressed, Compressed::Empty);
        assert_eq!(plan.root(), BlockId::of(Algorithm::Sha2_256, b""));
    }

    #[test]
    fn invalid_layout_is_rejected() {
        let layout = Layout::V1_1.with_max_block_size(512);
        assert!(ValyaBlockStore::with_layout(InMemoryBlockStore::new(), layout).is_err());
    }

    #[test]
    fn from_config_uses_configured_version() {
        let config = ValyaConfig {
            version: Version::V1,
            ..ValyaConfig::default()
        };
        let store = ValyaBlockStore::from_config(InMemoryBlockStore::new(), &config).unwrap();
        assert_eq!(store.layout(), &Layout::V1);
    }
}
