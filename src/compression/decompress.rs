use log::{debug, error, info, warn};

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::{Component, Path, PathBuf},
};

use super::container::{read_u32, SectionHeader};
use crate::bitstream::bitreader::BitReader;
use crate::error::{Error, Result};
use crate::huffman_coding::decoder::decode;
use crate::huffman_coding::huffman::HuffTree;
use crate::huffman_coding::tree_codec::read_tree;

/// One file that came out of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    pub name: String,
    pub rel_path: String,
    pub path: PathBuf,
    /// Size recorded in the archive
    pub expected: u32,
    /// Bytes actually written
    pub extracted: u32,
}

/// Summary of one extraction run.
#[derive(Debug, Default)]
pub struct ExtractReport {
    pub files: Vec<ExtractedFile>,
    /// Sections that were passed over, with the reason.
    pub skipped: Vec<(String, Error)>,
}

/// Extract every file of the archive read from `reader` into `root`.
///
/// The archive is checked as a whole before anything is written: the stored archive size
/// must match the real one and the tree must end exactly where the header says. Either
/// failure aborts the run. After that, each file section is checked on its own; a section
/// whose header does not line up, or whose destination cannot be written, is skipped and
/// the next one is tried.
pub fn extract<R: Read + Seek>(reader: R, root: &Path) -> Result<ExtractReport> {
    let mut fi = BufReader::new(reader);

    // Check the archive size first
    let actual = fi.seek(SeekFrom::End(0))?;
    fi.seek(SeekFrom::Start(0))?;
    let expected = match read_u32(&mut fi) {
        Ok(size) => size as u64,
        Err(Error::Truncated) => {
            return Err(Error::SizeMismatch {
                expected: 0,
                actual,
            })
        }
        Err(e) => return Err(e),
    };
    if expected != actual {
        error!("Possible archive corruption!");
        error!("Expected file size\t\t{}", expected);
        error!("Current file size\t\t{}", actual);
        return Err(Error::SizeMismatch { expected, actual });
    }

    let header_size = read_u32(&mut fi)? as u64;
    let vertices = read_u32(&mut fi)?;
    let tree = read_tree(&mut fi, vertices)?;
    let pos = fi.stream_position()?;
    if pos != header_size {
        error!("Unexpected number of bytes read from archive header!");
        return Err(Error::HeaderMismatch {
            expected: header_size,
            actual: pos,
        });
    }
    debug!("Archive header ok: {} bytes, {} vertices", header_size, vertices);

    let mut report = ExtractReport::default();
    let mut end_of_prev = header_size;
    while fi.stream_position()? < actual {
        let header = SectionHeader::read_from(&mut fi)?;
        let name = header.display_name();
        end_of_prev += header.header_size as u64;
        let here = fi.stream_position()?;

        let target = if here != end_of_prev {
            debug!(
                "Header of {} spans {} bytes, {} recorded",
                name,
                header.encoded_len(),
                header.header_size
            );
            Err(Error::Desynchronized {
                name: name.clone(),
                expected: end_of_prev,
                actual: here,
            })
        } else {
            destination(root, &header)
                .and_then(|(rel_path, path)| Ok((create_file(&path)?, rel_path, path)))
        };

        match target {
            Ok((fo, rel_path, path)) => {
                let mut out = BufWriter::new(fo);
                let extracted = {
                    let mut br = BitReader::new(&mut fi);
                    decode(&tree, &mut br, header.original_size, &mut out)?
                };
                out.flush()?;
                info!("Extracted file\t\t{}", name);
                info!("Expected size\t\t{}", header.original_size);
                info!("Current size\t\t{}\n", extracted);
                report.files.push(ExtractedFile {
                    name,
                    rel_path,
                    path,
                    expected: header.original_size,
                    extracted,
                });
            }
            Err(e) if e.is_local() => {
                warn!("{}", e);
                warn!("Proceeding with next file...");
                skip_payload(&tree, &mut fi, &header)?;
                report.skipped.push((name, e));
            }
            Err(e) => return Err(e),
        }
        end_of_prev = fi.stream_position()?;
    }

    Ok(report)
}

/// Create the destination file along with any missing directories.
fn create_file(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| Error::Unwritable {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    File::create(path).map_err(|source| Error::Unwritable {
        path: path.to_path_buf(),
        source,
    })
}

/// Walk past a section's payload without keeping it. The payload length is not stored,
/// so the only way to find its end is to decode it.
fn skip_payload<R: Read>(tree: &HuffTree, fi: &mut R, header: &SectionHeader) -> Result<()> {
    let mut br = BitReader::new(fi);
    decode(tree, &mut br, header.original_size, &mut io::sink())?;
    Ok(())
}

/// Work out where a section goes. Names and paths must be UTF-8 and must stay inside the
/// extraction root.
fn destination(root: &Path, header: &SectionHeader) -> Result<(String, PathBuf)> {
    let name = String::from_utf8(header.name.clone())
        .map_err(|_| Error::UnsafePath(header.display_name()))?;
    let rel_path = String::from_utf8(header.rel_path.clone())
        .map_err(|_| Error::UnsafePath(String::from_utf8_lossy(&header.rel_path).into_owned()))?;

    let name_ok = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\');
    if !name_ok {
        return Err(Error::UnsafePath(name));
    }
    let rel_ok = Path::new(&rel_path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
        && !rel_path.contains('\\');
    if !rel_ok {
        return Err(Error::UnsafePath(format!("{}/{}", rel_path, name)));
    }

    let path = root.join(&rel_path).join(&name);
    Ok((rel_path, path))
}
