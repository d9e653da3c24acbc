use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use valya_types::Algorithm;

use crate::chunker::ChunkBounds;
use crate::error::{FormatError, FormatResult};
use crate::record::RecordFormat;

/// Default block size ceiling shared by both wire versions (64 KiB).
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 1 << 16;

/// Magic prefix of 1.1 index nodes: `"valya"`, major `0x0001`, minor `0x01`.
pub const PREFIX_V1_1: &[u8] = b"valya\x00\x01\x01";

/// Magic prefix of legacy 1 index nodes: `"valya-1"` and a NUL separator.
pub const PREFIX_V1: &[u8] = b"valya-1\x00";

/// Records per legacy node. A `sha2-256` text record is 41 bytes and
/// `(65536 - 40) / 41 = 1597`.
pub const LEGACY_MAX_RECORDS: usize = 1597;

/// On-wire index-node format revisions.
///
/// Versions are never decodable as one another: each has its own magic
/// prefix and decoding a foreign node yields "not an index node".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Version {
    /// Legacy format: text records, counted batches.
    #[serde(rename = "1")]
    V1,
    /// Primary format: binary records, content-defined batches.
    #[default]
    #[serde(rename = "1.1")]
    V1_1,
}

impl Version {
    /// Every supported version, newest first.
    pub const ALL: &'static [Version] = &[Version::V1_1, Version::V1];

    /// The static layout table for this version.
    pub const fn layout(self) -> Layout {
        match self {
            Self::V1 => Layout::V1,
            Self::V1_1 => Layout::V1_1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::V1 => "1",
            Self::V1_1 => "1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Version {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" | "1.0" | "v1" => Ok(Self::V1),
            "1.1" | "v1.1" => Ok(Self::V1_1),
            other => Err(FormatError::InvalidLayout(format!(
                "unknown version {other:?}"
            ))),
        }
    }
}

/// How a level of identifiers is partitioned into index nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grouping {
    /// FastCDC over the concatenated record stream.
    ContentDefined,
    /// Fixed batches of at most `max_records` identifiers.
    Counted { max_records: usize },
}

/// Static, per-version description of the index-node format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    pub version: Version,
    pub prefix: &'static [u8],
    pub records: RecordFormat,
    pub grouping: Grouping,
    /// Algorithm of the integrity digest following the prefix.
    pub integrity: Algorithm,
    pub max_block_size: usize,
}

impl Layout {
    pub const V1_1: Layout = Layout {
        version: Version::V1_1,
        prefix: PREFIX_V1_1,
        records: RecordFormat::Binary,
        grouping: Grouping::ContentDefined,
        integrity: Algorithm::Sha2_256,
        max_block_size: DEFAULT_MAX_BLOCK_SIZE,
    };

    pub const V1: Layout = Layout {
        version: Version::V1,
        prefix: PREFIX_V1,
        records: RecordFormat::Text,
        grouping: Grouping::Counted {
            max_records: LEGACY_MAX_RECORDS,
        },
        integrity: Algorithm::Sha2_256,
        max_block_size: DEFAULT_MAX_BLOCK_SIZE,
    };

    /// Same format with a different block size ceiling.
    pub const fn with_max_block_size(self, max_block_size: usize) -> Self {
        Self {
            max_block_size,
            ..self
        }
    }

    /// Prefix plus integrity digest.
    pub const fn header_len(&self) -> usize {
        self.prefix.len() + self.integrity.digest_len()
    }

    /// Bytes left for records in one node.
    pub const fn capacity(&self) -> usize {
        self.max_block_size.saturating_sub(self.header_len())
    }

    /// Smallest byte length a node of this version can have. Legacy nodes
    /// carry at least one record byte.
    pub const fn min_node_len(&self) -> usize {
        match self.version {
            Version::V1 => self.header_len() + 1,
            Version::V1_1 => self.header_len(),
        }
    }

    /// Leaf chunk bounds: `max/8`, `max/4`, `max`.
    pub fn leaf_bounds(&self) -> FormatResult<ChunkBounds> {
        let max = self.max_block_size;
        ChunkBounds::new(max / 8, max / 4, max)
    }

    /// Record-stream chunk bounds: `capacity/4`, `capacity/2`, `capacity`.
    pub fn group_bounds(&self) -> FormatResult<ChunkBounds> {
        let capacity = self.capacity();
        let avg = capacity / 2;
        ChunkBounds::new(avg / 2, avg, capacity)
    }

    /// Identifiers per counted batch, bounded by what fits in one node.
    pub fn batch_len(&self) -> usize {
        let fits = self.capacity() / self.records.max_record_len();
        let limit = match self.grouping {
            Grouping::Counted { max_records } => max_records,
            Grouping::ContentDefined => fits,
        };
        limit.min(fits).max(1)
    }

    /// Check that leaves can be chunked and every level can shrink.
    pub fn validate(&self) -> FormatResult<()> {
        self.leaf_bounds()?;
        if self.capacity() < 2 * self.records.max_record_len() {
            return Err(FormatError::InvalidLayout(format!(
                "a {} byte block cannot hold two identifier records",
                self.max_block_size
            )));
        }
        match self.grouping {
            Grouping::ContentDefined => self.group_bounds().map(|_| ()),
            Grouping::Counted { max_records } if max_records < 2 => Err(
                FormatError::InvalidLayout("counted batches need at least two records".into()),
            ),
            Grouping::Counted { .. } => Ok(()),
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Version::default().layout()
    }
}
