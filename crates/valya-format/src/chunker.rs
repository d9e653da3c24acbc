//! Content-defined chunking using FastCDC.
//!
//! Used twice: once to cut content into leaf blocks, and once to cut the
//! concatenated record stream of an identifier level into index-node groups.
//! Boundaries depend only on the bytes and the bounds, so identical input
//! always chunks identically and local edits only move nearby boundaries.

use std::ops::{Range, RangeInclusive};

use bytes::Bytes;
use fastcdc::v2020::{AVERAGE_MAX, AVERAGE_MIN, MAXIMUM_MAX, MAXIMUM_MIN, MINIMUM_MAX, MINIMUM_MIN};
use valya_types::Block;

use crate::error::{FormatError, FormatResult};
use crate::version::Layout;

/// Minimum chunk sizes FastCDC accepts.
pub const MIN_SIZE_RANGE: RangeInclusive<usize> = MINIMUM_MIN as usize..=MINIMUM_MAX as usize;
/// Average chunk sizes FastCDC accepts.
pub const AVG_SIZE_RANGE: RangeInclusive<usize> = AVERAGE_MIN as usize..=AVERAGE_MAX as usize;
/// Maximum chunk sizes FastCDC accepts.
pub const MAX_SIZE_RANGE: RangeInclusive<usize> = MAXIMUM_MIN as usize..=MAXIMUM_MAX as usize;

/// Validated `{min, avg, max}` chunk size bounds.
///
/// Construction checks the ranges FastCDC supports, so chunking with a
/// `ChunkBounds` never panics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkBounds {
    min: u32,
    avg: u32,
    max: u32,
}

impl ChunkBounds {
    pub fn new(min: usize, avg: usize, max: usize) -> FormatResult<Self> {
        check_range("minimum", min, &MIN_SIZE_RANGE)?;
        check_range("average", avg, &AVG_SIZE_RANGE)?;
        check_range("maximum", max, &MAX_SIZE_RANGE)?;
        if !(min <= avg && avg <= max) {
            return Err(FormatError::InvalidLayout(format!(
                "chunk bounds out of order: {min} / {avg} / {max}"
            )));
        }
        // The ranges above all fit in u32.
        Ok(Self {
            min: min as u32,
            avg: avg as u32,
            max: max as u32,
        })
    }

    pub fn min(&self) -> usize {
        self.min as usize
    }

    pub fn avg(&self) -> usize {
        self.avg as usize
    }

    pub fn max(&self) -> usize {
        self.max as usize
    }

    /// Cut `data` into consecutive ranges covering it exactly once.
    ///
    /// Empty input yields no ranges.
    pub fn split(&self, data: &[u8]) -> Vec<Range<usize>> {
        if data.is_empty() {
            return Vec::new();
        }
        fastcdc::v2020::FastCDC::new(data, self.min, self.avg, self.max)
            .map(|chunk| chunk.offset..chunk.offset + chunk.length)
            .collect()
    }
}

fn check_range(which: &str, value: usize, range: &RangeInclusive<usize>) -> FormatResult<()> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(FormatError::InvalidLayout(format!(
            "{which} chunk size {value} outside {}..={}",
            range.start(),
            range.end()
        )))
    }
}

/// Cut content into leaf blocks using the layout's leaf bounds.
pub fn split_leaves(layout: &Layout, content: &Bytes) -> FormatResult<Vec<Block>> {
    let bounds = layout.leaf_bounds()?;
    Ok(bounds
        .split(content)
        .into_iter()
        .map(|range| Block::new(content.slice(range)))
        .collect())
}

/// Partition a list of encoded records into groups of whole records.
///
/// The records are concatenated and chunked with `bounds`. Each cut is
/// snapped down to the last record boundary at or before it; cuts that land
/// inside the same record as the previous one are dropped. A group whose
/// bytes would still exceed `capacity` is split greedily. Returned ranges
/// index into `records` and cover it exactly once, in order.
pub fn group_records(
    records: &[Vec<u8>],
    bounds: &ChunkBounds,
    capacity: usize,
) -> Vec<Range<usize>> {
    let mut stream = Vec::with_capacity(records.iter().map(Vec::len).sum());
    let mut ends = Vec::with_capacity(records.len());
    for record in records {
        stream.extend_from_slice(record);
        ends.push(stream.len());
    }

    let mut groups = Vec::new();
    let mut start = 0;
    for cut in bounds.split(&stream) {
        let end = ends.partition_point(|&e| e <= cut.end);
        if end > start {
            push_within_capacity(&mut groups, &ends, start..end, capacity);
            start = end;
        }
    }
    if start < records.len() {
        push_within_capacity(&mut groups, &ends, start..records.len(), capacity);
    }
    groups
}

fn push_within_capacity(
    groups: &mut Vec<Range<usize>>,
    ends: &[usize],
    span: Range<usize>,
    capacity: usize,
) {
    let byte_start = |i: usize| if i == 0 { 0 } else { ends[i - 1] };
    let mut first = span.start;
    while first < span.end {
        let base = byte_start(first);
        let mut last = first + 1;
        while last < span.end && ends[last] - base <= capacity {
            last += 1;
        }
        groups.push(first..last);
        first = last;
    }
}
