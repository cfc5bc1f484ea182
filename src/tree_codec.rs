//! Fixed-width binary records for the Huffman tree.
//!
//! Each node is one little-endian 64-bit record, written in pre-order:
//!
//! ```text
//!  63      56 55                                   1   0
//! +----------+--------------------------------------+----+
//! |  symbol  |            count (low 55 bits)       |leaf|
//! +----------+--------------------------------------+----+
//! ```
//!
//! The symbol byte is zero for internal nodes. An all-zero record never
//! describes a real node and terminates the tree.

use log::{debug, trace};

use crate::error::{HuffmanError, Result};
use crate::huffman::{HuffmanTree, Node, NodeId, Symbol};

pub const MAGIC: [u8; 8] = [0x7B, 0x68, 0x75, 0x7C, 0x6D, 0x7D, 0x66, 0x66];
pub const RECORD_LEN: usize = 8;

const LEAF_FLAG: u64 = 1;
const COUNT_SHIFT: u32 = 1;
const SYMBOL_SHIFT: u32 = 56;
pub const MAX_COUNT: u64 = (1 << 55) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeRecord(u64);

impl TreeRecord {
    pub const SENTINEL: TreeRecord = TreeRecord(0);

    pub fn leaf(symbol: Symbol, count: u64) -> Self {
        TreeRecord(
            LEAF_FLAG | ((count & MAX_COUNT) << COUNT_SHIFT) | ((symbol as u64) << SYMBOL_SHIFT),
        )
    }

    pub fn internal(count: u64) -> Self {
        TreeRecord((count & MAX_COUNT) << COUNT_SHIFT)
    }

    pub fn from_node(node: &Node) -> Self {
        match *node {
            Node::Leaf { symbol, count } => TreeRecord::leaf(symbol, count),
            Node::Internal { count, .. } => TreeRecord::internal(count),
        }
    }

    pub fn from_le_bytes(bytes: [u8; RECORD_LEN]) -> Self {
        TreeRecord(u64::from_le_bytes(bytes))
    }

    pub fn to_le_bytes(self) -> [u8; RECORD_LEN] {
        self.0.to_le_bytes()
    }

    pub fn is_sentinel(self) -> bool {
        self.0 == 0
    }

    pub fn is_leaf(self) -> bool {
        self.0 & LEAF_FLAG != 0
    }

    pub fn count(self) -> u64 {
        (self.0 >> COUNT_SHIFT) & MAX_COUNT
    }

    pub fn symbol(self) -> Symbol {
        (self.0 >> SYMBOL_SHIFT) as Symbol
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Appends the pre-order records of `tree` and the closing sentinel to `out`.
pub fn serialize(tree: &HuffmanTree, out: &mut Vec<u8>) {
    let order = tree.preorder();
    out.reserve((order.len() + 1) * RECORD_LEN);

    for id in order {
        let record = TreeRecord::from_node(tree.node(id));
        trace!("Record {:#018x} for node {}", record.raw(), id);
        out.extend_from_slice(&record.to_le_bytes());
    }
    out.extend_from_slice(&TreeRecord::SENTINEL.to_le_bytes());

    debug!("Serialized {} tree records", tree.len());
}

/// Reads records from the start of `input` up to the sentinel (or the last
/// whole record) and rebuilds the tree.
///
/// Returns the tree and the number of bytes consumed, sentinel included.
pub fn deserialize(input: &[u8]) -> Result<(HuffmanTree, usize)> {
    let mut records = Vec::new();
    let mut consumed = 0;
    for chunk in input.chunks_exact(RECORD_LEN) {
        consumed += RECORD_LEN;
        let mut bytes = [0u8; RECORD_LEN];
        bytes.copy_from_slice(chunk);
        let record = TreeRecord::from_le_bytes(bytes);
        if record.is_sentinel() {
            break;
        }
        records.push(record);
    }
    debug!(
        "Read {} tree records ({} bytes)",
        records.len(),
        consumed
    );

    let tree = rebuild(&records)?;
    Ok((tree, consumed))
}

/// Pre-order reconstruction without recursion, so a hostile record stream
/// cannot exhaust the call stack.
fn rebuild(records: &[TreeRecord]) -> Result<HuffmanTree> {
    let mut nodes: Vec<Node> = Vec::with_capacity(records.len());
    // Internal nodes still waiting for children; `true` once the left one is attached.
    let mut pending: Vec<(NodeId, bool)> = Vec::new();
    let mut root = None;

    for (index, record) in records.iter().enumerate() {
        if root.is_some() && pending.is_empty() {
            return Err(HuffmanError::TrailingRecords {
                extra: records.len() - index,
            });
        }

        let id = nodes.len();
        if record.is_leaf() {
            nodes.push(Node::Leaf {
                symbol: record.symbol(),
                count: record.count(),
            });
        } else {
            nodes.push(Node::Internal {
                count: record.count(),
                left: id,
                right: id,
            });
        }

        if let Some(&(parent, left_done)) = pending.last() {
            if let Node::Internal { left, right, .. } = &mut nodes[parent] {
                if left_done {
                    *right = id;
                } else {
                    *left = id;
                }
            }
            if left_done {
                pending.pop();
            } else if let Some(top) = pending.last_mut() {
                top.1 = true;
            }
        } else {
            root = Some(id);
        }

        if !record.is_leaf() {
            pending.push((id, false));
        }
    }

    match root {
        Some(root) if pending.is_empty() => Ok(HuffmanTree::from_parts(nodes, root)),
        _ => Err(HuffmanError::TruncatedTree {
            records: records.len(),
        }),
    }
}

/// Checks that every leaf has a positive count and every internal node's
/// count is the sum of its children's.
pub fn validate(tree: &HuffmanTree) -> Result<()> {
    for (id, node) in tree.nodes().iter().enumerate() {
        match *node {
            Node::Leaf { count, .. } => {
                if count == 0 {
                    return Err(HuffmanError::InvalidTreeStructure {
                        node: id,
                        reason: "leaf count is zero",
                    });
                }
            }
            Node::Internal { count, left, right } => {
                let sum = tree
                    .node(left)
                    .count()
                    .checked_add(tree.node(right).count());
                if sum != Some(count) {
                    return Err(HuffmanError::InvalidTreeStructure {
                        node: id,
                        reason: "internal count differs from the sum of its children",
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::huffman::FrequencyTable;

    fn records_to_bytes(records: &[TreeRecord]) -> Vec<u8> {
        records.iter().flat_map(|r| r.to_le_bytes()).collect()
    }

    fn bdaacb_tree() -> HuffmanTree {
        let freq = FrequencyTable::from_bytes(b"BDAACB").unwrap();
        HuffmanTree::build(&freq).unwrap()
    }

    #[test]
    fn record_layout() {
        let leaf = TreeRecord::leaf(b'C', 1);
        assert_eq!(leaf.to_le_bytes(), [0x03, 0, 0, 0, 0, 0, 0, 0x43]);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.count(), 1);
        assert_eq!(leaf.symbol(), b'C');

        let internal = TreeRecord::internal(6);
        assert_eq!(internal.to_le_bytes(), [0x0C, 0, 0, 0, 0, 0, 0, 0]);
        assert!(!internal.is_leaf());
        assert_eq!(internal.symbol(), 0);
    }

    #[test]
    fn counts_are_truncated_to_55_bits() {
        let record = TreeRecord::internal(MAX_COUNT + 2);
        assert_eq!(record.count(), 1);
        assert_eq!(record.symbol(), 0);
        assert_eq!(TreeRecord::leaf(0xFF, MAX_COUNT).count(), MAX_COUNT);
    }

    #[test]
    fn serializes_preorder_with_sentinel() {
        let mut out = Vec::new();
        serialize(&bdaacb_tree(), &mut out);

        let expected = records_to_bytes(&[
            TreeRecord::internal(6),
            TreeRecord::internal(2),
            TreeRecord::leaf(b'C', 1),
            TreeRecord::leaf(b'D', 1),
            TreeRecord::internal(4),
            TreeRecord::leaf(b'A', 2),
            TreeRecord::leaf(b'B', 2),
            TreeRecord::SENTINEL,
        ]);
        assert_eq!(out, expected);
    }

    #[test]
    fn deserialize_rebuilds_same_shape() {
        let tree = bdaacb_tree();
        let mut bytes = Vec::new();
        serialize(&tree, &mut bytes);
        bytes.extend_from_slice(&[0x5B, 0x0C]);

        let (rebuilt, consumed) = deserialize(&bytes).unwrap();
        assert_eq!(consumed, 8 * RECORD_LEN);
        assert_eq!(rebuilt.code_table(), tree.code_table());
        validate(&rebuilt).unwrap();
    }

    #[test]
    fn single_leaf_round_trips() {
        let bytes = records_to_bytes(&[TreeRecord::leaf(b'x', 5), TreeRecord::SENTINEL]);
        let (tree, consumed) = deserialize(&bytes).unwrap();
        assert_eq!(consumed, 16);
        assert_eq!(*tree.node(tree.root()), Node::Leaf { symbol: b'x', count: 5 });
    }

    #[test]
    fn missing_children_are_truncation() {
        let bytes = records_to_bytes(&[
            TreeRecord::internal(2),
            TreeRecord::leaf(b'a', 1),
            TreeRecord::SENTINEL,
        ]);
        assert!(matches!(
            deserialize(&bytes),
            Err(HuffmanError::TruncatedTree { records: 2 })
        ));
    }

    #[test]
    fn no_records_is_truncation() {
        assert!(matches!(
            deserialize(&[0u8; 8]),
            Err(HuffmanError::TruncatedTree { records: 0 })
        ));
        assert!(matches!(
            deserialize(&[]),
            Err(HuffmanError::TruncatedTree { records: 0 })
        ));
    }

    #[test]
    fn stream_ending_without_sentinel_is_truncation() {
        let mut bytes = records_to_bytes(&[TreeRecord::internal(2), TreeRecord::leaf(b'a', 1)]);
        bytes.extend_from_slice(&[1, 2, 3]);
        assert!(matches!(
            deserialize(&bytes),
            Err(HuffmanError::TruncatedTree { .. })
        ));
    }

    #[test]
    fn extra_records_are_rejected() {
        let bytes = records_to_bytes(&[
            TreeRecord::leaf(b'a', 1),
            TreeRecord::leaf(b'b', 1),
            TreeRecord::leaf(b'c', 1),
            TreeRecord::SENTINEL,
        ]);
        assert!(matches!(
            deserialize(&bytes),
            Err(HuffmanError::TrailingRecords { extra: 2 })
        ));
    }

    #[test]
    fn validate_rejects_wrong_sum() {
        let bytes = records_to_bytes(&[
            TreeRecord::internal(3),
            TreeRecord::leaf(b'a', 1),
            TreeRecord::leaf(b'b', 1),
            TreeRecord::SENTINEL,
        ]);
        let (tree, _) = deserialize(&bytes).unwrap();
        assert!(matches!(
            validate(&tree),
            Err(HuffmanError::InvalidTreeStructure { node: 0, .. })
        ));
    }

    #[test]
    fn validate_rejects_zero_leaf() {
        let bytes = records_to_bytes(&[
            TreeRecord::internal(1),
            TreeRecord::leaf(b'a', 1),
            TreeRecord::leaf(b'b', 0),
            TreeRecord::SENTINEL,
        ]);
        let (tree, _) = deserialize(&bytes).unwrap();
        assert!(matches!(
            validate(&tree),
            Err(HuffmanError::InvalidTreeStructure { node: 2, .. })
        ));
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let depth = 100_000;
        let mut records = Vec::with_capacity(depth + 2);
        for _ in 0..depth {
            records.push(TreeRecord::internal(1));
        }
        records.push(TreeRecord::SENTINEL);
        assert!(matches!(
            deserialize(&records_to_bytes(&records)),
            Err(HuffmanError::TruncatedTree { .. })
        ));
    }
}
