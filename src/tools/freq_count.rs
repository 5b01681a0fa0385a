use log::{debug, error};
use rayon::prelude::*;

use crate::compression::entry::Entry;
use crate::error::{Error, Result};

/// Byte counts across every input of one compression run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u64; 256],
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self { counts: [0; 256] }
    }

    /// Count the bytes of one buffer into a fresh table.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            counts: freqs(data),
        }
    }

    /// Add another table into this one.
    pub fn merge(&mut self, other: &FrequencyTable) {
        self.counts
            .iter_mut()
            .zip(other.counts.iter())
            .for_each(|(a, b)| *a += b);
    }

    /// Occurrences of `byte`.
    pub fn count(&self, byte: u8) -> u64 {
        self.counts[byte as usize]
    }

    /// Total number of bytes counted.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Number of distinct byte values seen.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// (byte, count) for every byte seen, in ascending byte order.
    pub fn present(&self) -> impl Iterator<Item = (u8, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c > 0)
            .map(|(b, &c)| (b as u8, c))
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns a frequency count of the input data. Uses parallelism when data set is over 64k.
pub fn freqs(data: &[u8]) -> [u64; 256] {
    if data.len() > 64_000 {
        // 16k is pretty much the sweet spot for chunk size.
        data.par_chunks(16_000)
            .fold(
                || [0_u64; 256],
                |mut freqs, chunk| {
                    chunk.iter().for_each(|&el| freqs[el as usize] += 1);
                    freqs
                },
            )
            .reduce(
                || [0_u64; 256],
                |mut s, f| {
                    s.iter_mut().zip(f.iter()).for_each(|(a, b)| *a += b);
                    s
                },
            )
    } else {
        let mut freqs = [0_u64; 256];
        data.iter().for_each(|&el| freqs[el as usize] += 1);
        freqs
    }
}

/// Result of the counting pass: the combined table, the entries that survived,
/// and the ones that had to be left out.
#[derive(Debug)]
pub struct FrequencyPass {
    pub table: FrequencyTable,
    pub entries: Vec<Entry>,
    pub skipped: Vec<(String, Error)>,
}

/// Count every entry. Entries are counted in parallel, then merged in their original
/// order so the table (and the tree built from it) does not depend on scheduling.
/// An entry that cannot be read is logged and dropped from the run.
pub fn count_entries(entries: Vec<Entry>) -> Result<FrequencyPass> {
    let counted: Vec<Result<FrequencyTable>> = entries
        .par_iter()
        .map(|entry| {
            let data = entry.read_all()?;
            if data.len() as u64 > u32::MAX as u64 {
                return Err(Error::FileTooLarge {
                    name: entry.name.clone(),
                    size: data.len() as u64,
                });
            }
            Ok(FrequencyTable::from_bytes(&data))
        })
        .collect();

    let mut pass = FrequencyPass {
        table: FrequencyTable::new(),
        entries: Vec::with_capacity(entries.len()),
        skipped: vec![],
    };
    for (entry, result) in entries.into_iter().zip(counted) {
        match result {
            Ok(table) => {
                debug!("Counted {} bytes in {}", table.total(), entry.name);
                pass.table.merge(&table);
                pass.entries.push(entry);
            }
            Err(e) => {
                error!("{} File not added to archive!", e);
                pass.skipped.push((entry.name, e));
            }
        }
    }

    // Frequencies are stored as u32 in the archive header
    let total = pass.table.total();
    if total > u32::MAX as u64 {
        return Err(Error::InputTooLarge(total));
    }
    Ok(pass)
}
