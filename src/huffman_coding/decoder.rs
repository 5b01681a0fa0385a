use log::trace;
use std::io::{Read, Write};

use super::huffman::HuffTree;
use crate::bitstream::bitreader::BitReader;
use crate::error::{Error, Result};

/// Walk the tree one bit at a time (0 = left, 1 = right), writing a byte every time a
/// leaf is reached, until `original_size` bytes have come out. Pad bits after the last
/// symbol are never looked at.
///
/// A tree that is a single leaf has no branches to walk: every bit stands for one copy of
/// its byte, matching the one bit code the encoder gives it.
///
/// Returns the number of bytes written.
pub fn decode<R: Read, W: Write>(
    tree: &HuffTree,
    br: &mut BitReader<R>,
    original_size: u32,
    out: &mut W,
) -> Result<u32> {
    let root = tree.root();
    let mut written = 0_u32;

    if tree.is_single_leaf() {
        let byte = tree.node(root).byte;
        while written < original_size {
            br.bit()?.ok_or(Error::Truncated)?;
            out.write_all(&[byte])?;
            written += 1;
        }
        return Ok(written);
    }

    let mut pos = root;
    while written < original_size {
        let bit = br.bit()?.ok_or(Error::Truncated)?;
        let node = tree.node(pos);
        let next = if bit == 0 { node.left } else { node.right };
        // The tree codec only hands out strict binary trees, so an internal node always
        // has both children
        pos = next.ok_or_else(|| Error::CorruptTree("walked off the tree".to_string()))?;

        let node = tree.node(pos);
        if node.is_leaf() {
            out.write_all(&[node.byte])?;
            pos = root;
            written += 1;
        }
    }
    trace!("Decoded {} bytes from {} payload bytes", written, br.consumed());
    Ok(written)
}
