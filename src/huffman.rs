use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::{debug, trace};

use crate::error::{HuffmanError, Result};

pub type Symbol = u8;
pub type NodeId = usize;
pub type CodeWord = Vec<bool>;

const ALPHABET: usize = 256;

/// Occurrence count of every byte value in one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; ALPHABET],
}

impl FrequencyTable {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(HuffmanError::EmptyInput);
        }

        let mut counts = [0u64; ALPHABET];
        for &byte in data {
            counts[byte as usize] += 1;
        }

        let table = FrequencyTable { counts };
        debug!(
            "Counted {} bytes, {} unique symbols",
            data.len(),
            table.distinct()
        );
        Ok(table)
    }

    pub fn count(&self, symbol: Symbol) -> u64 {
        self.counts[symbol as usize]
    }

    /// Symbols that occur at least once, in byte-value order.
    pub fn symbols(&self) -> impl Iterator<Item = (Symbol, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            .map(|(symbol, count)| (symbol as Symbol, *count))
    }

    pub fn distinct(&self) -> usize {
        self.symbols().count()
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Shannon entropy in bits/symbol.
    pub fn entropy(&self) -> f64 {
        let total = self.total() as f64;
        if total == 0.0 {
            return 0.0;
        }

        self.symbols()
            .map(|(_, count)| {
                let p = count as f64 / total;
                -p * p.log2()
            })
            .sum()
    }

    /// Leaves in merge order: count ascending, then byte value ascending.
    pub fn sorted_leaves(&self) -> Vec<(Symbol, u64)> {
        let mut leaves: Vec<_> = self.symbols().collect();
        leaves.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
        leaves
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Leaf {
        symbol: Symbol,
        count: u64,
    },
    Internal {
        count: u64,
        left: NodeId,
        right: NodeId,
    },
}

impl Node {
    pub fn count(&self) -> u64 {
        match self {
            Node::Leaf { count, .. } => *count,
            Node::Internal { count, .. } => *count,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// Huffman tree stored as an arena; children are addressed by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: NodeId,
}

#[derive(Eq, PartialEq)]
struct HeapNode {
    count: u64,
    rank: usize,
    id: NodeId,
}

impl Ord for HeapNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap and we want the smallest (count, rank).
        other
            .count
            .cmp(&self.count)
            .then(other.rank.cmp(&self.rank))
    }
}

impl PartialOrd for HeapNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl HuffmanTree {
    pub fn build(frequencies: &FrequencyTable) -> Result<Self> {
        Self::from_sorted_leaves(&frequencies.sorted_leaves())
    }

    /// Builds the tree from leaves already sorted by (count, symbol).
    ///
    /// Leaves are ranked by their position and merged nodes are ranked after
    /// every leaf in creation order, so on equal counts a leaf is always taken
    /// before a merged subtree and older subtrees before newer ones.
    pub fn from_sorted_leaves(leaves: &[(Symbol, u64)]) -> Result<Self> {
        debug!("Building Huffman tree from {} leaves", leaves.len());
        if leaves.is_empty() {
            return Err(HuffmanError::EmptyForest);
        }

        let mut nodes = Vec::with_capacity(2 * leaves.len() - 1);
        let mut heap = BinaryHeap::with_capacity(leaves.len());

        for (rank, &(symbol, count)) in leaves.iter().enumerate() {
            let id = nodes.len();
            nodes.push(Node::Leaf { symbol, count });
            heap.push(HeapNode { count, rank, id });
        }

        let mut next_rank = leaves.len();
        while heap.len() > 1 {
            let (Some(left), Some(right)) = (heap.pop(), heap.pop()) else {
                break;
            };

            let count = left.count + right.count;
            let id = nodes.len();
            nodes.push(Node::Internal {
                count,
                left: left.id,
                right: right.id,
            });
            heap.push(HeapNode {
                count,
                rank: next_rank,
                id,
            });
            next_rank += 1;
        }

        let root = heap.pop().map(|n| n.id).ok_or(HuffmanError::EmptyForest)?;
        debug!("Tree construction complete: {} nodes", nodes.len());
        Ok(HuffmanTree { nodes, root })
    }

    pub(crate) fn from_parts(nodes: Vec<Node>, root: NodeId) -> Self {
        HuffmanTree { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Node ids in pre-order: node, then left subtree, then right subtree.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            order.push(id);
            if let Node::Internal { left, right, .. } = self.nodes[id] {
                stack.push(right);
                stack.push(left);
            }
        }
        order
    }

    pub fn code_table(&self) -> CodeTable {
        CodeTable::from_tree(self)
    }
}

/// Root-to-leaf path of every symbol present in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: Vec<Option<CodeWord>>,
}

impl CodeTable {
    pub fn from_tree(tree: &HuffmanTree) -> Self {
        let mut codes: Vec<Option<CodeWord>> = vec![None; ALPHABET];

        // Left is explored before right, so the first leaf found for a
        // symbol wins, exactly as a per-symbol depth-first search would.
        let mut stack = vec![(tree.root(), CodeWord::new())];
        while let Some((id, path)) = stack.pop() {
            match *tree.node(id) {
                Node::Leaf { symbol, .. } => {
                    let slot = &mut codes[symbol as usize];
                    if slot.is_none() {
                        trace!(
                            "Assigning code to byte {:#04x} ('{}') : '{}'",
                            symbol,
                            (symbol as char).escape_default(),
                            bits_to_string(&path)
                        );
                        *slot = Some(path);
                    }
                }
                Node::Internal { left, right, .. } => {
                    let mut right_path = path.clone();
                    right_path.push(true);
                    stack.push((right, right_path));

                    let mut left_path = path;
                    left_path.push(false);
                    stack.push((left, left_path));
                }
            }
        }

        CodeTable { codes }
    }

    pub fn get(&self, symbol: Symbol) -> Option<&[bool]> {
        self.codes[symbol as usize].as_deref()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &[bool])> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(symbol, code)| code.as_deref().map(|c| (symbol as Symbol, c)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn bits_to_string(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}
