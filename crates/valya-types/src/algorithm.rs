use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TypeError;

/// Hash algorithms a block identifier may be derived with.
///
/// Every variant carries a fixed digest length and two stable encodings: a
/// text name (used by identifiers' display form and the legacy index-node
/// records) and a `(family, subtype)` pair (used by the binary index-node
/// records). Adding an algorithm means adding a variant here; the wire
/// formats stay the same.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Algorithm {
    /// SHA-256 (SHA-2 family, 256-bit digest).
    #[serde(rename = "sha2-256")]
    Sha2_256,
}

impl Algorithm {
    /// Every registered algorithm.
    pub const ALL: &'static [Algorithm] = &[Algorithm::Sha2_256];

    /// Digest length in bytes.
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha2_256 => 32,
        }
    }

    /// Numeric `(family, subtype)` tag used by binary records.
    pub const fn numeric_tag(self) -> (u32, u32) {
        match self {
            Self::Sha2_256 => (1, 256),
        }
    }

    /// Stable text name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha2_256 => "sha2-256",
        }
    }

    /// Look up an algorithm by its numeric tag.
    pub fn from_numeric_tag(family: u32, subtype: u32) -> Result<Self, TypeError> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.numeric_tag() == (family, subtype))
            .ok_or(TypeError::UnknownAlgorithmTag { family, subtype })
    }

    /// Look up an algorithm by its text name.
    pub fn from_name(name: &str) -> Result<Self, TypeError> {
        Self::ALL
            .iter()
            .copied()
            .find(|alg| alg.name() == name)
            .ok_or_else(|| TypeError::UnknownAlgorithmName(name.to_string()))
    }

    /// Hash `data` with this algorithm.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha2_256 => Sha256::digest(data).to_vec(),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}
