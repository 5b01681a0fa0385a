use log::{debug, trace};
use rustc_hash::FxHashMap;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::error::{Error, Result};
use crate::tools::freq_count::FrequencyTable;

/// Byte value carried by internal nodes (and by absence markers in the archive).
pub const SENTINEL: u8 = 0;

/// Index of a node in the tree arena.
pub type NodeId = usize;

/// A vertex of the Huffman tree. A node is a leaf iff it has no children; internal
/// nodes always have both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub byte: u8,
    pub weight: u32,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

impl Node {
    /// Create a new leaf
    pub fn leaf(byte: u8, weight: u32) -> Self {
        Node {
            byte,
            weight,
            left: None,
            right: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Huffman tree stored as an arena. Dropping the tree drops the arena in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffTree {
    nodes: Vec<Node>,
    root: NodeId,
}

/// Heap key: lowest weight first, then lowest insertion sequence.
#[derive(Debug, PartialEq, Eq)]
struct Pending {
    weight: u32,
    seq: usize,
    id: NodeId,
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl HuffTree {
    /// Build the tree by greedily merging the two lightest nodes until one is left.
    ///
    /// Leaves enter the queue in ascending byte order and merged nodes get the next
    /// sequence number, so equal weights always resolve the same way. The first node
    /// popped becomes the left child.
    pub fn from_frequencies(table: &FrequencyTable) -> Result<Self> {
        let mut nodes: Vec<Node> = Vec::with_capacity(511);
        let mut heap = BinaryHeap::with_capacity(256);

        for (byte, count) in table.present() {
            let weight = u32::try_from(count).map_err(|_| Error::InputTooLarge(count))?;
            heap.push(Reverse(Pending {
                weight,
                seq: nodes.len(),
                id: nodes.len(),
            }));
            nodes.push(Node::leaf(byte, weight));
        }

        if nodes.is_empty() {
            return Err(Error::EmptyInput);
        }
        debug!("Building tree from {} distinct bytes", nodes.len());

        while heap.len() > 1 {
            // The loop guard leaves at least two
            let Reverse(min1) = heap.pop().ok_or(Error::EmptyInput)?;
            let Reverse(min2) = heap.pop().ok_or(Error::EmptyInput)?;
            let weight = min1
                .weight
                .checked_add(min2.weight)
                .ok_or_else(|| Error::InputTooLarge(min1.weight as u64 + min2.weight as u64))?;
            let id = nodes.len();
            nodes.push(Node {
                byte: SENTINEL,
                weight,
                left: Some(min1.id),
                right: Some(min2.id),
            });
            heap.push(Reverse(Pending { weight, seq: id, id }));
        }

        let root = heap.pop().ok_or(Error::EmptyInput)?.0.id;
        Ok(HuffTree { nodes, root })
    }

    /// Assemble a tree from an arena. Used by the tree codec once it has checked the shape.
    pub(crate) fn from_parts(nodes: Vec<Node>, root: NodeId) -> Self {
        HuffTree { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    /// Number of vertices (leaves and internal nodes).
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True when the whole tree is a single leaf (one distinct byte in the input).
    pub fn is_single_leaf(&self) -> bool {
        self.nodes[self.root].is_leaf()
    }

    /// Leaf weight for `byte`, if the byte is in the tree.
    pub fn leaf_weight(&self, byte: u8) -> Option<u32> {
        self.nodes
            .iter()
            .find(|n| n.is_leaf() && n.byte == byte)
            .map(|n| n.weight)
    }

    /// Walk the tree and return the code for every leaf. Left adds a 0 bit, right a 1.
    ///
    /// A tree that is a single leaf would give its byte an empty code, which cannot be
    /// counted on the way back in. That byte gets the one bit code `0` instead.
    pub fn code_table(&self) -> CodeTable {
        let mut codes = CodeTable::default();

        if self.is_single_leaf() {
            codes.insert(self.nodes[self.root].byte, Code::new(0, 1));
            return codes;
        }

        let mut stack = vec![(self.root, Code::new(0, 0))];
        while let Some((id, code)) = stack.pop() {
            let node = &self.nodes[id];
            if node.is_leaf() {
                trace!("{:>3} -> {}", node.byte, code);
                codes.insert(node.byte, code);
                continue;
            }
            // Push right first so the left branch is visited first
            if let Some(right) = node.right {
                stack.push((right, code.push(1)));
            }
            if let Some(left) = node.left {
                stack.push((left, code.push(0)));
            }
        }
        codes
    }
}

/// A root-to-leaf path. The path sits in the low `len` bits of `bits`, first step
/// in the most significant of those bits.
///
/// Weights are 32 bit, so no path can be longer than 46 steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub bits: u64,
    pub len: u8,
}

impl Code {
    pub fn new(bits: u64, len: u8) -> Self {
        Code { bits, len }
    }

    /// This code extended by one more step.
    pub fn push(self, bit: u64) -> Self {
        debug_assert!(self.len < 64);
        Code {
            bits: (self.bits << 1) | bit,
            len: self.len + 1,
        }
    }

    /// True if `self` is a prefix of `other` (or equal to it).
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len && other.bits >> (other.len - self.len) == self.bits
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in (0..self.len).rev() {
            write!(f, "{}", (self.bits >> i) & 1)?;
        }
        Ok(())
    }
}

/// byte -> code
pub type CodeTable = FxHashMap<u8, Code>;
