//! Tree compression: fold an ordered identifier list into one root.
//!
//! Each pass partitions the current level into groups, wraps every group of
//! two or more identifiers in an index node, and carries a lone identifier up
//! unchanged. The next level is the list of those results. The loop stops
//! when a single identifier remains; every node built on the way is returned
//! so the caller can persist the whole tree.

use std::collections::HashSet;
use std::ops::Range;

use tracing::debug;
use valya_types::{Block, BlockId};

use crate::chunker;
use crate::error::{FormatError, FormatResult};
use crate::node;
use crate::version::{Grouping, Layout};

/// Outcome of compressing an identifier list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Compressed {
    /// No identifiers. The caller stores the empty block and uses its ID.
    Empty,
    /// Exactly one identifier, returned without wrapping.
    Single(BlockId),
    /// A tree of index nodes.
    Tree {
        root: BlockId,
        /// Every node built, de-duplicated, children before parents.
        nodes: Vec<Block>,
        /// Number of index-node levels above the input.
        levels: usize,
    },
}

impl Compressed {
    /// The identifier the caller hands back, if one exists without storing
    /// the empty block.
    pub fn root(&self) -> Option<&BlockId> {
        match self {
            Self::Empty => None,
            Self::Single(id) => Some(id),
            Self::Tree { root, .. } => Some(root),
        }
    }

    /// Index nodes that must be stored before the root is handed out.
    pub fn nodes(&self) -> &[Block] {
        match self {
            Self::Tree { nodes, .. } => nodes,
            _ => &[],
        }
    }
}

/// Compress `ids` into a single root identifier.
pub fn compress(layout: &Layout, ids: &[BlockId]) -> FormatResult<Compressed> {
    match ids {
        [] => return Ok(Compressed::Empty),
        [only] => return Ok(Compressed::Single(only.clone())),
        _ => {}
    }

    let mut level = ids.to_vec();
    let mut nodes = Vec::new();
    let mut seen = HashSet::new();
    let mut levels = 0;

    while level.len() > 1 {
        let groups = group(layout, &level)?;
        if groups.len() >= level.len() {
            return Err(FormatError::NoProgress { count: level.len() });
        }

        let mut next = Vec::with_capacity(groups.len());
        for range in groups {
            let members = &level[range];
            if let [only] = members {
                next.push(only.clone());
                continue;
            }
            let node = node::encode(layout, members)?;
            next.push(node.id().clone());
            if seen.insert(node.id().clone()) {
                nodes.push(node);
            }
        }

        levels += 1;
        debug!(
            level = levels,
            inputs = level.len(),
            outputs = next.len(),
            "compressed level"
        );
        level = next;
    }

    let root = level
        .pop()
        .ok_or(FormatError::NoProgress { count: ids.len() })?;
    Ok(Compressed::Tree {
        root,
        nodes,
        levels,
    })
}

/// Partition one level into ranges of identifiers, one range per node.
pub fn group(layout: &Layout, ids: &[BlockId]) -> FormatResult<Vec<Range<usize>>> {
    match layout.grouping {
        Grouping::Counted { .. } => {
            let batch = layout.batch_len();
            Ok((0..ids.len())
                .step_by(batch)
                .map(|start| start..(start + batch).min(ids.len()))
                .collect())
        }
        Grouping::ContentDefined => {
            let records = ids
                .iter()
                .map(|id| layout.records.encode(id))
                .collect::<Result<Vec<_>, _>>()?;
            let bounds = layout.group_bounds()?;
            Ok(chunker::group_records(&records, &bounds, layout.capacity()))
        }
    }
}
