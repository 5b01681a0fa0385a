use log::error;
use std::io::{self, Write};

use crate::huffman_coding::huffman::Code;

/// Packs Huffman codes into bytes, most significant bit first, and writes every full
/// byte to the underlying writer. Call flush() at the end of each file to pad and write
/// the last partial byte.
pub struct BitPacker<W: Write> {
    writer: W,
    /// Bits waiting to be written as bytes, newest in the least significant bits.
    queue: u64,
    /// Count of valid bits in the queue.
    q_bits: u8,
    /// Bytes written so far.
    written: u64,
}

impl<W: Write> BitPacker<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            queue: 0,
            q_bits: 0,
            written: 0,
        }
    }

    /// Write out every full byte in the queue.
    fn write_stream(&mut self) -> io::Result<()> {
        while self.q_bits > 7 {
            let byte = (self.queue >> (self.q_bits - 8)) as u8;
            self.writer.write_all(&[byte])?; //push the packed byte out
            self.written += 1;
            self.q_bits -= 8; //adjust the count of bits left in the queue
        }
        // Drop the bits we already wrote so the queue never overflows
        self.queue &= (1_u64 << self.q_bits) - 1;
        Ok(())
    }

    /// Put one code on the stream. Codes are at most 46 bits and the queue holds fewer
    /// than 8 bits between calls, so the u64 queue cannot overflow.
    pub fn out_code(&mut self, code: Code) -> io::Result<()> {
        self.queue <<= code.len; //shift queue by bit length
        self.queue |= code.bits & ((1_u64 << code.len) - 1); //add the code to the queue
        self.q_bits += code.len; //update depth of queue bits
        self.write_stream()
    }

    /// Flushes the remaining bits (1-7) from the queue, padding with 0s in the least
    /// signficant bits. Returns the total number of bytes written.
    pub fn flush(&mut self) -> io::Result<u64> {
        if self.q_bits > 0 {
            self.queue <<= 8 - self.q_bits; //pad the queue with zeros
            self.q_bits += 8 - self.q_bits;
            self.write_stream()?; // write out all that is left
            if self.q_bits > 0 {
                error!("Stuff left in the BitPacker queue.");
            }
        }
        self.writer.flush()?;
        Ok(self.written)
    }

    /// Bytes written so far (not counting bits still in the queue).
    pub fn written(&self) -> u64 {
        self.written
    }
}
