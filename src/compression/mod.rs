//! The compression module reads and writes hufzip archives.
//!
//! Compression happens in the following steps:
//! - Count the bytes of every input file and merge the counts.
//! - Build one Huffman tree from the merged counts and derive the code table.
//! - Write the global header and the serialized tree.
//! - Pack each file into its own section, then patch the header with the final sizes.
//!
//! Extraction checks the archive size and the header before writing anything, then decodes
//! the sections one after the other. A section that does not line up is skipped.
//!
pub mod compress;
pub mod container;
pub mod decompress;
pub mod entry;
