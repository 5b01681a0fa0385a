//! hufzip, a Huffman coding file archiver.
//!
//! Packs a single file, every file of one type in a directory, or a whole directory tree
//! into one `.huf` archive. All files share a single Huffman tree, built from the byte
//! counts of the whole input and stored once in the archive header.
//!
//! Basic usage:
//!
//! `$> hufzip zip docs`
//!
//! This writes `docs_archive/docs.huf`. `$> hufzip unzip docs_archive/docs.huf` restores
//! the files into `docs_extracted`. Run without a command for an interactive prompt.
//!
pub mod bitstream;
pub mod compression;
pub mod error;
pub mod huffman_coding;
pub mod tools;

pub use compression::compress::{compress, CompressReport, ContainerWriter, FileReport};
pub use compression::decompress::{extract, ExtractReport, ExtractedFile};
pub use compression::entry::Entry;
pub use error::{Error, Result};
