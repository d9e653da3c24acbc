//! Index nodes: blocks whose payload lists child block identifiers.
//!
//! Layout of a node, for every version:
//!
//! ```text
//! prefix (per version) || integrity digest of records || records
//! ```
//!
//! Decoding distinguishes content that is simply not a node of this version
//! (wrong prefix, too short, digest mismatch) from a node that matched its
//! digest but whose records are malformed. Only the second is corruption.

use tracing::trace;
use valya_types::{Block, BlockId};

use crate::error::{FormatError, FormatResult, RecordError};
use crate::record;
use crate::version::{Layout, Version};

/// Classification of raw block content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decoded {
    /// Zero-length content.
    Empty,
    /// Not an index node of the tried version(s); treat as an opaque leaf.
    NotIndexNode,
    /// Prefix and digest matched but a record could not be decoded.
    Corrupted(RecordError),
    /// A valid index node and its children, in order.
    Index(Vec<BlockId>),
}

impl Decoded {
    pub fn is_index_node(&self) -> bool {
        matches!(self, Self::Index(_))
    }

    /// Child identifiers if this is a valid index node.
    pub fn children(&self) -> Option<&[BlockId]> {
        match self {
            Self::Index(ids) => Some(ids),
            _ => None,
        }
    }
}

/// Build an index node listing `ids` in order.
pub fn encode(layout: &Layout, ids: &[BlockId]) -> FormatResult<Block> {
    if ids.is_empty() {
        return Err(FormatError::EmptyNode);
    }

    let capacity = layout.capacity();
    let mut records = Vec::with_capacity(capacity.min(ids.len() * layout.records.max_record_len()));
    for id in ids {
        layout.records.encode_into(id, &mut records)?;
        if records.len() > capacity {
            return Err(FormatError::Overflow {
                size: layout.header_len() + records.len(),
                max: layout.max_block_size,
            });
        }
    }

    let digest = layout.integrity.digest(&records);
    let mut payload = Vec::with_capacity(layout.header_len() + records.len());
    payload.extend_from_slice(layout.prefix);
    payload.extend_from_slice(&digest);
    payload.extend_from_slice(&records);

    if payload.len() > layout.max_block_size {
        return Err(FormatError::Overflow {
            size: payload.len(),
            max: layout.max_block_size,
        });
    }
    Ok(Block::new(payload))
}

/// Classify `bytes` against a single version's layout.
pub fn decode(layout: &Layout, bytes: &[u8]) -> Decoded {
    if bytes.is_empty() {
        return Decoded::Empty;
    }
    if !bytes.starts_with(layout.prefix) || bytes.len() < layout.min_node_len() {
        return Decoded::NotIndexNode;
    }

    let body = &bytes[layout.prefix.len()..];
    let (stored, records) = body.split_at(layout.integrity.digest_len());
    if layout.integrity.digest(records) != stored {
        trace!(version = %layout.version, "prefix matched but digest did not");
        return Decoded::NotIndexNode;
    }

    match record::decode_all(layout.records, records) {
        Ok(ids) => Decoded::Index(ids),
        Err(e) => Decoded::Corrupted(e),
    }
}

/// Classify `bytes`, trying `preferred` first and then, if requested, every
/// other version. The first result other than `NotIndexNode` wins.
pub fn classify(preferred: &Layout, bytes: &[u8], try_other_versions: bool) -> Decoded {
    let first = decode(preferred, bytes);
    if first != Decoded::NotIndexNode || !try_other_versions {
        return first;
    }
    Version::ALL
        .iter()
        .filter(|&&v| v != preferred.version)
        .map(|v| decode(&v.layout(), bytes))
        .find(|d| *d != Decoded::NotIndexNode)
        .unwrap_or(Decoded::NotIndexNode)
}
