//! Valya wire formats.
//!
//! Turns an ordered list of block identifiers into a tree of index nodes
//! with a single root, and classifies raw block content back into index
//! nodes or opaque leaves. Everything here is synchronous and pure; storage
//! lives in `valya-store` and orchestration in `valya-sdk`.
//!
//! # Modules
//!
//! - [`version`] -- closed set of wire versions and their static layouts
//! - [`record`] -- one identifier as a binary or text record
//! - [`node`] -- index-node encode, decode, and classification
//! - [`chunker`] -- FastCDC boundaries for leaves and record streams
//! - [`compress`] -- the level-by-level tree compressor
//!
//! # Wire format 1.1
//!
//! ```text
//! bytes 0..8    "valya" || 0x0001 (major, big-endian) || 0x01 (minor)
//! bytes 8..40   SHA-256 of bytes[40..]
//! bytes 40..    records: family:u32le || subtype:u32le || digest
//! ```

pub mod chunker;
pub mod compress;
pub mod error;
pub mod node;
pub mod record;
pub mod version;

pub use chunker::{split_leaves, ChunkBounds};
pub use compress::{compress, Compressed};
pub use error::{FormatError, FormatResult, RecordError};
pub use node::{classify, Decoded};
pub use record::RecordFormat;
pub use version::{Grouping, Layout, Version, DEFAULT_MAX_BLOCK_SIZE};
