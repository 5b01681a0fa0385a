//! BitReader: reads the packed payload of one archived file, most significant bit first.
//!
//! NOTE: The payload length is not stored in the archive. The reader therefore pulls one
//! byte at a time from its source and never reads ahead, so that when decoding stops the
//! source sits exactly at the start of the next file section. Wrap the source in a
//! BufReader to keep that cheap.

use std::io::{self, Read};

/// Reads single bits from a byte source.
#[derive(Debug)]
pub struct BitReader<R> {
    source: R,
    /// Byte currently being read.
    byte: u8,
    /// Next bit to read from `byte`. 8 means the byte is used up.
    bit_index: u8,
    /// Bytes pulled from the source so far.
    consumed: u64,
}

impl<R: Read> BitReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            byte: 0,
            bit_index: 8,
            consumed: 0,
        }
    }

    /// Fetch the next byte. Returns false if there is no more data.
    fn have_data(&mut self) -> io::Result<bool> {
        let mut buf = [0_u8; 1];
        loop {
            match self.source.read(&mut buf) {
                Ok(0) => return Ok(false),
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        self.byte = buf[0];
        self.bit_index = 0;
        self.consumed += 1;
        Ok(true)
    }

    /// Return the next bit (1 or 0), or None if there is no more data to read.
    pub fn bit(&mut self) -> io::Result<Option<u8>> {
        if self.bit_index == 8 && !self.have_data()? {
            return Ok(None);
        }
        let bit = (self.byte >> (7 - self.bit_index)) & 1;
        self.bit_index += 1;
        Ok(Some(bit))
    }

    /// Number of whole bytes taken from the source so far. A partly read byte counts,
    /// its remaining bits are padding as far as the archive is concerned.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }
}
