use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::algorithm::Algorithm;
use crate::error::TypeError;

/// Content-addressed identifier of a block.
///
/// A `BlockId` pairs the hash algorithm with the digest it produced over the
/// block's content. Identical content hashed with the same algorithm always
/// produces the same `BlockId`.
///
/// The digest length is not enforced on construction: identifiers arriving
/// from a backend are carried as-is, and the record encoders reject any whose
/// digest does not match [`Algorithm::digest_len`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId {
    algorithm: Algorithm,
    digest: Vec<u8>,
}

impl BlockId {
    /// Pair an algorithm with pre-computed digest bytes.
    pub fn new(algorithm: Algorithm, digest: Vec<u8>) -> Self {
        Self { algorithm, digest }
    }

    /// Pair an algorithm with digest bytes, checking the length.
    pub fn checked(algorithm: Algorithm, digest: Vec<u8>) -> Result<Self, TypeError> {
        if digest.len() != algorithm.digest_len() {
            return Err(TypeError::InvalidLength {
                algorithm: algorithm.name().to_string(),
                expected: algorithm.digest_len(),
                actual: digest.len(),
            });
        }
        Ok(Self { algorithm, digest })
    }

    /// Derive the identifier of `content` with `algorithm`.
    pub fn of(algorithm: Algorithm, content: &[u8]) -> Self {
        Self {
            algorithm,
            digest: algorithm.digest(content),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Returns `true` if the digest has the length its algorithm demands.
    pub fn is_well_formed(&self) -> bool {
        self.digest.len() == self.algorithm.digest_len()
    }

    /// Hex-encoded digest.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.digest)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.digest[..self.digest.len().min(4)])
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockId({}-{})", self.algorithm, self.short_hex())
    }
}

/// `<algorithm name>-<hex digest>`, e.g. `sha2-256-e3b0c442…`.
impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.algorithm, self.to_hex())
    }
}

impl FromStr for BlockId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, hex_digest) = s
            .rsplit_once('-')
            .ok_or_else(|| TypeError::MalformedId(s.to_string()))?;
        let algorithm = Algorithm::from_name(name)?;
        let digest = hex::decode(hex_digest).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::checked(algorithm, digest)
    }
}
