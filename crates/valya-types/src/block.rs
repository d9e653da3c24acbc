use std::hash::{Hash, Hasher};

use bytes::Bytes;

use crate::algorithm::Algorithm;
use crate::id::BlockId;

/// Immutable byte payload paired with its content identifier.
///
/// The identifier is always derived from the content, never assigned, so two
/// blocks are equal exactly when their identifiers are.
#[derive(Clone, Debug)]
pub struct Block {
    id: BlockId,
    content: Bytes,
}

impl Block {
    /// Algorithm used for blocks built with [`Block::new`].
    pub const DEFAULT_ALGORITHM: Algorithm = Algorithm::Sha2_256;

    /// Wrap `content`, deriving its identifier with SHA-256.
    pub fn new(content: impl Into<Bytes>) -> Self {
        Self::with_algorithm(Self::DEFAULT_ALGORITHM, content)
    }

    /// Wrap `content`, deriving its identifier with `algorithm`.
    pub fn with_algorithm(algorithm: Algorithm, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        let id = BlockId::of(algorithm, &content);
        Self { id, content }
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn into_parts(self) -> (BlockId, Bytes) {
        (self.id, self.content)
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Block {}

impl Hash for Block {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
