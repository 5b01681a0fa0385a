//! Layout of a hufzip archive.
//!
//! ```text
//! [u32 archive_size][u32 header_size][u32 vertex_count]
//!   { [u8 byte][u32 freq-or-FLAG] }*          preorder tree
//! per file, repeated:
//!   [u32 original_size][u32 file_header_size]
//!   [u32 name_len][name_bytes]
//!   [u32 relpath_len][relpath_bytes]
//!   <bit-packed payload, zero padded to a whole byte>
//! ```
//!
//! All integers are little endian. `header_size` counts the first three fields plus the
//! tree. `file_header_size` counts everything in a section before the payload.

use std::io::{self, Read, Write};

use crate::error::{Error, Result};

/// File extension of archives.
pub const ARCHIVE_EXT: &str = "huf";
/// archive_size + header_size + vertex_count
pub const GLOBAL_FIXED_SIZE: u32 = 12;
/// original_size + file_header_size + name_len + relpath_len
pub const SECTION_FIXED_SIZE: u32 = 16;

pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Read a u32. Running out of data means the archive was cut short.
pub fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0_u8; 4];
    reader.read_exact(&mut buf).map_err(eof_is_truncated)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a u32 length followed by that many bytes.
pub fn read_blob<R: Read>(reader: &mut R) -> Result<Vec<u8>> {
    let len = read_u32(reader)? as u64;
    let mut blob = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut blob)?;
    if (blob.len() as u64) < len {
        return Err(Error::Truncated);
    }
    Ok(blob)
}

pub fn write_blob<W: Write>(writer: &mut W, blob: &[u8]) -> io::Result<()> {
    write_u32(writer, blob.len() as u32)?;
    writer.write_all(blob)
}

/// Turn an end of file into Error::Truncated, anything else into Error::Io.
pub fn eof_is_truncated(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::Truncated,
        _ => Error::Io(e),
    }
}

/// The fixed part of a file section as read back from an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionHeader {
    pub original_size: u32,
    pub header_size: u32,
    pub name: Vec<u8>,
    pub rel_path: Vec<u8>,
}

impl SectionHeader {
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let original_size = read_u32(reader)?;
        let header_size = read_u32(reader)?;
        let name = read_blob(reader)?;
        let rel_path = read_blob(reader)?;
        Ok(SectionHeader {
            original_size,
            header_size,
            name,
            rel_path,
        })
    }

    /// Bytes the header actually took on disk.
    pub fn encoded_len(&self) -> u64 {
        SECTION_FIXED_SIZE as u64 + self.name.len() as u64 + self.rel_path.len() as u64
    }

    /// Name for messages, whatever bytes it holds.
    pub fn display_name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn section_header_test() {
        let mut buf: Vec<u8> = vec![];
        write_u32(&mut buf, 4).unwrap();
        write_u32(&mut buf, 16 + 5 + 3).unwrap();
        write_blob(&mut buf, b"a.txt").unwrap();
        write_blob(&mut buf, b"sub").unwrap();
        let header = SectionHeader::read_from(&mut Cursor::new(buf.as_slice())).unwrap();
        assert_eq!(header.original_size, 4);
        assert_eq!(header.header_size as u64, header.encoded_len());
        assert_eq!(header.display_name(), "a.txt");
        assert_eq!(header.rel_path, b"sub".to_vec());
    }

    #[test]
    fn short_blob_test() {
        let mut buf: Vec<u8> = vec![];
        write_u32(&mut buf, 100).unwrap();
        buf.extend_from_slice(b"abc");
        assert!(matches!(
            read_blob(&mut Cursor::new(buf.as_slice())),
            Err(Error::Truncated)
        ));
    }

    #[test]
    fn short_u32_test() {
        let buf = [1_u8, 2];
        assert!(matches!(
            read_u32(&mut Cursor::new(&buf[..])),
            Err(Error::Truncated)
        ));
    }
}
