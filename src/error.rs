//! Error types for the hufzip archiver.
//!
//! Errors that concern a single file (an input that cannot be read, a section whose
//! header does not line up) are reported and the run continues with the next file.
//! Errors that concern the container itself abort the whole run.

use std::io;
use std::path::PathBuf;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while archiving or extracting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input file could not be opened or read.
    #[error("Error opening file {name} for reading: {source}")]
    Unreadable {
        name: String,
        #[source]
        source: io::Error,
    },

    /// A single input does not fit the 32 bit size fields of the container.
    #[error("File {name} is too large to archive ({size} bytes)")]
    FileTooLarge { name: String, size: u64 },

    /// The combined input does not fit the 32 bit frequency counts.
    #[error("Combined input of {0} bytes is too large to archive")]
    InputTooLarge(u64),

    /// Nothing left to compress.
    #[error("No readable input to compress")]
    EmptyInput,

    /// A byte showed up during packing that was never counted.
    #[error("Byte {byte:#04x} of file {name} has no code")]
    MissingCode { byte: u8, name: String },

    /// Declared archive size differs from the real one.
    #[error("Possible archive corruption! Expected file size {expected}, current file size {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// The tree did not end where the global header said it would.
    #[error("Unexpected number of bytes read from archive header (expected {expected}, read {actual})")]
    HeaderMismatch { expected: u64, actual: u64 },

    /// The serialized tree is malformed.
    #[error("Corrupt tree in archive header: {0}")]
    CorruptTree(String),

    /// The container ended in the middle of a section.
    #[error("Archive ended unexpectedly")]
    Truncated,

    /// A file section header does not sit where the running offset says it should.
    #[error("Unexpected number of bytes read from archived file {name} header (expected offset {expected}, found {actual})")]
    Desynchronized {
        name: String,
        expected: u64,
        actual: u64,
    },

    /// A stored name or path would land outside the extraction root.
    #[error("Refusing to extract unsafe path {0}")]
    UnsafePath(String),

    /// Destination file could not be created.
    #[error("Error opening file {} for writing: {source}", .path.display())]
    Unwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Bad path handed to the command layer.
    #[error("{0}")]
    BadPath(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True for errors that only affect one file of a batch.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::Unreadable { .. }
                | Error::FileTooLarge { .. }
                | Error::MissingCode { .. }
                | Error::Desynchronized { .. }
                | Error::UnsafePath(_)
                | Error::Unwritable { .. }
        )
    }
}
