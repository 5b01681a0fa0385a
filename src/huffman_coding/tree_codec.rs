//! Serialized form of the Huffman tree, as stored in the archive header.
//!
//! The tree is written in preorder (node, left subtree, right subtree). Every record is a
//! byte followed by a little endian u32 frequency. A missing child is written as a marker
//! record carrying `SENTINEL` and `FLAG`, so every leaf is followed by two markers and the
//! tree occupies `RECORD_SIZE * (2 * vertices + 1)` bytes.
//!
//! Real frequencies are never zero (leaves count at least one occurrence, internal nodes
//! sum their children), which is what frees zero up to act as the marker.

use log::trace;
use std::io::{self, Read, Write};

use super::huffman::{HuffTree, Node, NodeId, SENTINEL};
use crate::error::{Error, Result};

/// Frequency value of a "no node here" record.
pub const FLAG: u32 = 0;
/// Bytes taken by one record (or marker) on disk.
pub const RECORD_SIZE: u32 = 5;
/// Largest possible strict binary tree over 256 leaves.
pub const MAX_VERTICES: u32 = 511;

/// Write the tree. Returns (bytes written, vertices written).
pub fn write_tree<W: Write>(tree: &HuffTree, writer: &mut W) -> io::Result<(u32, u32)> {
    let mut bytes = 0_u32;
    let mut vertices = 0_u32;

    let mut stack: Vec<Option<NodeId>> = vec![Some(tree.root())];
    while let Some(slot) = stack.pop() {
        match slot {
            None => write_record(writer, SENTINEL, FLAG)?,
            Some(id) => {
                let node = tree.node(id);
                write_record(writer, node.byte, node.weight)?;
                vertices += 1;
                // Right goes on the stack first so the left subtree is written first
                stack.push(node.right);
                stack.push(node.left);
            }
        }
        bytes += RECORD_SIZE;
    }
    trace!("Wrote tree: {} vertices in {} bytes", vertices, bytes);
    Ok((bytes, vertices))
}

fn write_record<W: Write>(writer: &mut W, byte: u8, freq: u32) -> io::Result<()> {
    writer.write_all(&[byte])?;
    writer.write_all(&freq.to_le_bytes())
}

/// Which child pointer a record read from the stream belongs to.
enum Slot {
    Root,
    Left(NodeId),
    Right(NodeId),
}

/// Read a tree of `vertices` nodes. The vertex count bounds the read: a stream that tries
/// to carry more nodes than declared is rejected instead of being followed.
pub fn read_tree<R: Read>(reader: &mut R, vertices: u32) -> Result<HuffTree> {
    if vertices == 0 || vertices > MAX_VERTICES {
        return Err(Error::CorruptTree(format!(
            "invalid vertex count {}",
            vertices
        )));
    }

    let mut nodes: Vec<Node> = Vec::with_capacity(vertices as usize);
    let mut root = None;

    let mut pending = vec![Slot::Root];
    while let Some(slot) = pending.pop() {
        let (byte, freq) = read_record(reader)?;
        if freq == FLAG {
            // Nothing to attach, the slot stays empty
            continue;
        }
        if nodes.len() as u32 == vertices {
            return Err(Error::CorruptTree(format!(
                "more than the declared {} vertices",
                vertices
            )));
        }

        let id = nodes.len();
        nodes.push(Node::leaf(byte, freq));
        match slot {
            Slot::Root => root = Some(id),
            Slot::Left(parent) => nodes[parent].left = Some(id),
            Slot::Right(parent) => nodes[parent].right = Some(id),
        }
        pending.push(Slot::Right(id));
        pending.push(Slot::Left(id));
    }

    let root = root.ok_or_else(|| Error::CorruptTree("empty tree".to_string()))?;
    if nodes.len() as u32 != vertices {
        return Err(Error::CorruptTree(format!(
            "declared {} vertices, found {}",
            vertices,
            nodes.len()
        )));
    }
    if let Some(bad) = nodes.iter().position(|n| n.left.is_some() != n.right.is_some()) {
        return Err(Error::CorruptTree(format!(
            "vertex {} has a single child",
            bad
        )));
    }
    Ok(HuffTree::from_parts(nodes, root))
}

fn read_record<R: Read>(reader: &mut R) -> Result<(u8, u32)> {
    let mut record = [0_u8; RECORD_SIZE as usize];
    reader.read_exact(&mut record).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::Truncated,
        _ => Error::Io(e),
    })?;
    let freq = u32::from_le_bytes([record[1], record[2], record[3], record[4]]);
    Ok((record[0], freq))
}
