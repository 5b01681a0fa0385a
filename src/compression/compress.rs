use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};

use log::{debug, error, info};

use super::container::{write_blob, write_u32, GLOBAL_FIXED_SIZE};
use super::entry::Entry;
use crate::bitstream::bitpacker::BitPacker;
use crate::error::{Error, Result};
use crate::huffman_coding::huffman::{CodeTable, HuffTree};
use crate::huffman_coding::tree_codec::write_tree;
use crate::tools::freq_count::count_entries;

const READ_CHUNK: usize = 64 * 1024;

/// What happened to one archived file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub name: String,
    pub rel_path: String,
    pub original_size: u32,
    pub compressed_size: u32,
    pub header_size: u32,
}

/// Summary of one compression run.
#[derive(Debug)]
pub struct CompressReport {
    pub files: Vec<FileReport>,
    /// Files left out of the archive, with the reason.
    pub skipped: Vec<(String, Error)>,
    pub header_size: u32,
    pub vertices: u32,
    pub archive_size: u32,
}

/// Writes an archive: global header and tree first, then one section per file. The
/// global header is written as zeros and patched in finish(), once the sizes are known.
pub struct ContainerWriter<W: Write + Seek> {
    writer: W,
    /// Offset of the archive within the writer
    start: u64,
    archive_size: u64,
    header_size: u32,
    vertices: u32,
}

impl<W: Write + Seek> ContainerWriter<W> {
    /// Start an archive: reserve room for the global header and write the tree.
    pub fn begin(mut writer: W, tree: &HuffTree) -> Result<Self> {
        // Placeholder for (archive size, header size, vertex count)
        let start = writer.stream_position()?;
        writer.write_all(&[0_u8; GLOBAL_FIXED_SIZE as usize])?;
        let (tree_bytes, vertices) = write_tree(tree, &mut writer)?;
        let header_size = GLOBAL_FIXED_SIZE + tree_bytes;
        debug!("Tree written, {} vertices", tree.len());

        Ok(Self {
            writer,
            start,
            archive_size: header_size as u64,
            header_size,
            vertices,
        })
    }

    pub fn header_size(&self) -> u32 {
        self.header_size
    }

    pub fn vertices(&self) -> u32 {
        self.vertices
    }

    /// Pack one entry and append its section.
    ///
    /// The section is assembled in memory and only appended once the whole entry packed
    /// cleanly, so an entry that fails part way leaves nothing behind in the archive.
    pub fn add_entry(&mut self, entry: &Entry, codes: &CodeTable) -> Result<FileReport> {
        let mut input = entry.open()?;

        let mut section = Cursor::new(Vec::new());
        // Placeholder for (original size, header size)
        write_u32(&mut section, 0)?;
        write_u32(&mut section, 0)?;
        write_blob(&mut section, entry.name.as_bytes())?;
        write_blob(&mut section, entry.rel_path.as_bytes())?;
        let header_size = section.position() as u32;

        let mut original_size = 0_u64;
        let compressed_size = {
            let mut bp = BitPacker::new(&mut section);
            let mut buf = vec![0_u8; READ_CHUNK];
            loop {
                let n = match input.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(entry.unreadable(e)),
                };
                for &byte in &buf[..n] {
                    let code = codes.get(&byte).ok_or_else(|| Error::MissingCode {
                        byte,
                        name: entry.name.clone(),
                    })?;
                    bp.out_code(*code)?;
                }
                original_size += n as u64;
            }
            bp.flush()?
        };

        let original_size = u32::try_from(original_size).map_err(|_| Error::FileTooLarge {
            name: entry.name.clone(),
            size: original_size,
        })?;
        let section_size = header_size as u64 + compressed_size;
        if self.archive_size + section_size > u32::MAX as u64 {
            return Err(Error::FileTooLarge {
                name: entry.name.clone(),
                size: original_size as u64,
            });
        }

        // Patch the section header now that the sizes are known
        section.seek(SeekFrom::Start(0))?;
        write_u32(&mut section, original_size)?;
        write_u32(&mut section, header_size)?;

        self.writer.write_all(section.get_ref())?;
        self.archive_size += section_size;

        Ok(FileReport {
            name: entry.name.clone(),
            rel_path: entry.rel_path.clone(),
            original_size,
            compressed_size: compressed_size as u32,
            header_size,
        })
    }

    /// Patch the global header and hand back the writer along with the archive size.
    pub fn finish(mut self) -> Result<(W, u32)> {
        let archive_size = self.archive_size as u32;
        let end = self.writer.stream_position()?;
        self.writer.seek(SeekFrom::Start(self.start))?;
        write_u32(&mut self.writer, archive_size)?;
        write_u32(&mut self.writer, self.header_size)?;
        write_u32(&mut self.writer, self.vertices)?;
        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;
        Ok((self.writer, archive_size))
    }
}

/// Compress `entries` into one archive written to `writer`.
///
/// Every entry is read once to count bytes and once more to pack it. Entries that cannot
/// be read, or that fail while packing, are reported and left out; the rest of the batch
/// carries on. Returns an error only when no archive could be produced at all.
pub fn compress<W: Write + Seek>(entries: Vec<Entry>, writer: W) -> Result<CompressReport> {
    let pass = count_entries(entries)?;
    let mut skipped = pass.skipped;
    if pass.entries.is_empty() {
        return Err(Error::EmptyInput);
    }

    let tree = HuffTree::from_frequencies(&pass.table)?;
    let codes = tree.code_table();
    debug!(
        "{} distinct bytes over {} bytes of input",
        pass.table.distinct(),
        pass.table.total()
    );

    let mut cw = ContainerWriter::begin(writer, &tree)?;
    info!("Header size:\t\t\t{} bytes", cw.header_size());

    let mut files = Vec::with_capacity(pass.entries.len());
    for entry in &pass.entries {
        match cw.add_entry(entry, &codes) {
            Ok(report) => {
                info!("Compressed file {}", report.name);
                info!("Size before compression:\t{} bytes", report.original_size);
                info!("Size after compression:\t\t{} bytes", report.compressed_size);
                info!("Individual header:\t\t{} bytes\n", report.header_size);
                files.push(report);
            }
            Err(e) if e.is_local() => {
                error!("Ran into a problem while archiving file {}! {}", entry.name, e);
                skipped.push((entry.name.clone(), e));
            }
            Err(e) => return Err(e),
        }
    }

    let header_size = cw.header_size();
    let vertices = cw.vertices();
    let (_, archive_size) = cw.finish()?;
    info!("Total size of archive:\t\t{} bytes", archive_size);

    Ok(CompressReport {
        files,
        skipped,
        header_size,
        vertices,
        archive_size,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::huffman_coding::tree_codec::RECORD_SIZE;
    use crate::tools::freq_count::FrequencyTable;

    fn u32_at(buf: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
    }

    #[test]
    fn aaab_archive_layout_test() {
        let entries = vec![Entry::from_bytes("a.txt", "", b"aaab".to_vec())];
        let mut out = Cursor::new(Vec::new());
        let report = compress(entries, &mut out).unwrap();
        let buf = out.into_inner();

        let tree_bytes = RECORD_SIZE * 7;
        assert_eq!(report.header_size, 12 + tree_bytes);
        assert_eq!(report.vertices, 3);
        assert_eq!(report.archive_size as usize, buf.len());

        assert_eq!(u32_at(&buf, 0) as usize, buf.len());
        assert_eq!(u32_at(&buf, 4), 12 + tree_bytes);
        assert_eq!(u32_at(&buf, 8), 3);

        let s = report.header_size as usize;
        assert_eq!(u32_at(&buf, s), 4); // original size
        assert_eq!(u32_at(&buf, s + 4), 16 + 5); // header size
        assert_eq!(u32_at(&buf, s + 8), 5);
        assert_eq!(&buf[s + 12..s + 17], b"a.txt");
        assert_eq!(u32_at(&buf, s + 17), 0);
        // a = 1, b = 0
        assert_eq!(&buf[s + 21..], &[0b1110_0000]);

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].compressed_size, 1);
    }

    #[test]
    fn missing_code_leaves_no_section_test() {
        // Build codes for a tree that does not know about 'z'
        let tree = HuffTree::from_frequencies(&FrequencyTable::from_bytes(b"ab")).unwrap();
        let codes = tree.code_table();
        let mut cw = ContainerWriter::begin(Cursor::new(Vec::new()), &tree).unwrap();
        let good = Entry::from_bytes("good", "", b"abba".to_vec());
        let bad = Entry::from_bytes("bad", "", b"abz".to_vec());

        let first = cw.add_entry(&good, &codes).unwrap();
        assert!(matches!(
            cw.add_entry(&bad, &codes),
            Err(Error::MissingCode { byte: b'z', .. })
        ));
        let (out, size) = cw.finish().unwrap();
        let buf = out.into_inner();
        assert_eq!(size as usize, buf.len());
        assert_eq!(
            buf.len() as u32,
            cw_header(&buf) + first.header_size + first.compressed_size
        );
    }

    fn cw_header(buf: &[u8]) -> u32 {
        u32_at(buf, 4)
    }

    #[test]
    fn skips_unreadable_test() {
        let entries = vec![
            Entry::from_file("ghost", "", std::path::PathBuf::from("/no/such/ghost")),
            Entry::from_bytes("real", "", b"hello".to_vec()),
        ];
        let mut out = Cursor::new(Vec::new());
        let report = compress(entries, &mut out).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].0, "ghost");
    }

    #[test]
    fn empty_input_test() {
        let mut out = Cursor::new(Vec::new());
        assert!(matches!(
            compress(vec![], &mut out),
            Err(Error::EmptyInput)
        ));
        let entries = vec![Entry::from_bytes("empty", "", vec![])];
        assert!(matches!(
            compress(entries, &mut out),
            Err(Error::EmptyInput)
        ));
    }
}
