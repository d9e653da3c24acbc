//! Identifier records: one [`BlockId`] as it appears inside an index node.
//!
//! Binary records (format 1.1) are `family:u32 || subtype:u32 || digest`, with
//! both tag integers little-endian. Text records (legacy format 1) are
//! `name || 0x00 || digest`.

use valya_types::{Algorithm, BlockId, TypeError};

use crate::error::RecordError;

/// Length of the binary `(family, subtype)` tag.
pub const TAG_LEN: usize = 8;

/// Separator between the algorithm name and the digest in text records.
pub const NAME_SEPARATOR: u8 = 0x00;

/// Encoding of a single identifier record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordFormat {
    Binary,
    Text,
}

impl RecordFormat {
    /// Encoded length of a record for `algorithm`.
    pub const fn record_len(self, algorithm: Algorithm) -> usize {
        let tag = match self {
            Self::Binary => TAG_LEN,
            Self::Text => algorithm.name().len() + 1,
        };
        tag + algorithm.digest_len()
    }

    /// Longest record any registered algorithm produces.
    pub fn max_record_len(self) -> usize {
        Algorithm::ALL
            .iter()
            .map(|&alg| self.record_len(alg))
            .max()
            .unwrap_or(0)
    }

    /// Append the record for `id` to `out`.
    ///
    /// Fails without touching `out` if the digest length does not match the
    /// algorithm.
    pub fn encode_into(self, id: &BlockId, out: &mut Vec<u8>) -> Result<(), RecordError> {
        let algorithm = id.algorithm();
        if !id.is_well_formed() {
            return Err(RecordError::DigestLength {
                algorithm,
                expected: algorithm.digest_len(),
                actual: id.digest().len(),
            });
        }
        match self {
            Self::Binary => {
                let (family, subtype) = algorithm.numeric_tag();
                out.extend_from_slice(&family.to_le_bytes());
                out.extend_from_slice(&subtype.to_le_bytes());
            }
            Self::Text => {
                out.extend_from_slice(algorithm.name().as_bytes());
                out.push(NAME_SEPARATOR);
            }
        }
        out.extend_from_slice(id.digest());
        Ok(())
    }

    /// Encode `id` as a standalone record.
    pub fn encode(self, id: &BlockId) -> Result<Vec<u8>, RecordError> {
        let mut out = Vec::with_capacity(self.record_len(id.algorithm()));
        self.encode_into(id, &mut out)?;
        Ok(out)
    }

    /// Decode the record at the front of `bytes`, returning the identifier
    /// and the unread remainder.
    pub fn decode(self, bytes: &[u8]) -> Result<(BlockId, &[u8]), RecordError> {
        let (algorithm, rest) = match self {
            Self::Binary => decode_binary_tag(bytes)?,
            Self::Text => decode_text_tag(bytes)?,
        };
        let len = algorithm.digest_len();
        if rest.len() < len {
            return Err(RecordError::ShortDigest {
                algorithm,
                expected: len,
                available: rest.len(),
            });
        }
        let (digest, rest) = rest.split_at(len);
        Ok((BlockId::new(algorithm, digest.to_vec()), rest))
    }
}

/// Decode a complete record region into identifiers, in order.
///
/// Any record that cannot be completed fails the whole region; nothing is
/// skipped.
pub fn decode_all(format: RecordFormat, mut bytes: &[u8]) -> Result<Vec<BlockId>, RecordError> {
    let mut ids = Vec::with_capacity(bytes.len() / format.max_record_len().max(1));
    while !bytes.is_empty() {
        let (id, rest) = format.decode(bytes)?;
        ids.push(id);
        bytes = rest;
    }
    Ok(ids)
}

fn decode_binary_tag(bytes: &[u8]) -> Result<(Algorithm, &[u8]), RecordError> {
    if bytes.len() < TAG_LEN {
        return Err(RecordError::ShortTag {
            needed: TAG_LEN,
            available: bytes.len(),
        });
    }
    let (tag, rest) = bytes.split_at(TAG_LEN);
    let family = read_u32_le(&tag[..4]);
    let subtype = read_u32_le(&tag[4..]);
    Ok((Algorithm::from_numeric_tag(family, subtype)?, rest))
}

fn decode_text_tag(bytes: &[u8]) -> Result<(Algorithm, &[u8]), RecordError> {
    let split = bytes
        .iter()
        .position(|&b| b == NAME_SEPARATOR)
        .ok_or(RecordError::MissingSeparator)?;
    let raw_name = &bytes[..split];
    let name = std::str::from_utf8(raw_name).map_err(|_| {
        TypeError::UnknownAlgorithmName(String::from_utf8_lossy(raw_name).into_owned())
    })?;
    Ok((Algorithm::from_name(name)?, &bytes[split + 1..]))
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}
