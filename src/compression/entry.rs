use std::fs::File;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Where the bytes of an entry come from. Entries are read twice (once to count
/// frequencies, once to pack), so a source must be re-openable.
#[derive(Debug, Clone)]
pub enum Source {
    /// A file on disk, opened on demand.
    File(PathBuf),
    /// Bytes already in memory.
    Memory(Vec<u8>),
}

/// One file to be archived: its bytes plus the name and relative directory that
/// will be recorded in its section header.
#[derive(Debug, Clone)]
pub struct Entry {
    /// File name, without directories
    pub name: String,
    /// Directory of the file relative to the compression root, `/` separated. Empty at the root.
    pub rel_path: String,
    pub source: Source,
}

impl Entry {
    /// An entry backed by a file on disk.
    pub fn from_file(name: &str, rel_path: &str, path: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            rel_path: rel_path.to_string(),
            source: Source::File(path),
        }
    }

    /// An entry backed by bytes in memory.
    pub fn from_bytes(name: &str, rel_path: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            rel_path: rel_path.to_string(),
            source: Source::Memory(data),
        }
    }

    /// Open a fresh reader over the entry's bytes.
    pub fn open(&self) -> Result<Box<dyn Read + '_>> {
        match &self.source {
            Source::File(path) => match File::open(path) {
                Ok(file) => Ok(Box::new(file)),
                Err(source) => Err(self.unreadable(source)),
            },
            Source::Memory(data) => Ok(Box::new(Cursor::new(data.as_slice()))),
        }
    }

    /// Read the whole entry into memory.
    pub fn read_all(&self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.open()?
            .read_to_end(&mut data)
            .map_err(|source| self.unreadable(source))?;
        Ok(data)
    }

    /// Wrap an io error as an unreadable-input error for this entry.
    pub fn unreadable(&self, source: std::io::Error) -> Error {
        Error::Unreadable {
            name: self.name.clone(),
            source,
        }
    }
}
