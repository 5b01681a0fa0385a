//! Turning the paths a user types into archive inputs and outputs.
//!
//! - `zip <file>` archives one file; its directory becomes the root.
//! - `zip <dir>/*.<ext>` archives every `.ext` file directly inside `dir`.
//! - `zip <dir>` archives every file below `dir`, keeping subdirectories.
//!
//! The archive for root `R` is written to `R_archive/<name of R>.huf`. Extracting
//! `X_archive/X.huf` produces `X_extracted` next to `X_archive`.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::{debug, error, info};

use crate::compression::compress::{compress, CompressReport};
use crate::compression::container::ARCHIVE_EXT;
use crate::compression::decompress::{extract, ExtractReport};
use crate::compression::entry::Entry;
use crate::error::{Error, Result};

/// Files to archive, together with the directory their relative paths start from.
#[derive(Debug)]
pub struct CompressPlan {
    pub root: PathBuf,
    pub entries: Vec<Entry>,
    /// Files whose names cannot be stored faithfully.
    pub skipped: Vec<(String, Error)>,
}

/// Outcome of extracting one archive found by `unzip_path`.
#[derive(Debug)]
pub struct UnzipOutcome {
    pub archive: PathBuf,
    pub result: Result<ExtractReport>,
}

/// True for the `*.ext` form.
fn is_glob(path: &Path) -> bool {
    path.file_stem().map_or(false, |stem| stem == "*") && path.extension().is_some()
}

/// Make `path` absolute and check that it exists. A glob keeps its last component.
fn resolve(path: &Path) -> Result<PathBuf> {
    let missing = || Error::BadPath("Requested path or file does not exist!".to_string());
    if is_glob(path) {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let dir = fs::canonicalize(dir).map_err(|_| missing())?;
        if !dir.is_dir() {
            return Err(missing());
        }
        Ok(dir.join(path.file_name().unwrap_or_default()))
    } else {
        fs::canonicalize(path).map_err(|_| missing())
    }
}

/// Every regular file below `dir`, in no particular order.
fn walk(dir: &Path, mut keep: impl FnMut(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut dirs_to_visit = vec![dir.to_path_buf()];
    while let Some(dir) = dirs_to_visit.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                dirs_to_visit.push(path);
            } else if file_type.is_file() && keep(&path) {
                found.push(path);
            }
        }
    }
    Ok(found)
}

/// Directory of `file` relative to `root`, `/` separated. Empty when `file` sits in `root`.
/// None when a component is not UTF-8.
fn relative_dir(root: &Path, file: &Path) -> Option<String> {
    let rel = match file.parent().and_then(|dir| dir.strip_prefix(root).ok()) {
        Some(rel) => rel,
        None => return Some(String::new()),
    };
    let parts = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Build the entry for `file`. Names that would not come back out of the archive under
/// the same name (not UTF-8, or holding a backslash) are refused here.
fn to_entry(root: &Path, file: PathBuf) -> Result<Entry> {
    let name = file.file_name().and_then(|n| n.to_str());
    let rel_path = relative_dir(root, &file);
    match (name, rel_path) {
        (Some(name), Some(rel_path)) if !name.contains('\\') && !rel_path.contains('\\') => {
            Ok(Entry::from_file(name, &rel_path, file.clone()))
        }
        _ => Err(Error::UnsafePath(file.display().to_string())),
    }
}

/// Work out which files `path` asks to archive.
pub fn compress_inputs(path: &Path) -> Result<CompressPlan> {
    let path = resolve(path)?;

    let (root, mut files) = if is_glob(&path) {
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let ext = path.extension().map(|e| e.to_os_string());
        let mut files = Vec::new();
        for entry in fs::read_dir(&root)? {
            let entry = entry?;
            let file = entry.path();
            if entry.file_type()?.is_file() && file.extension().map(|e| e.to_os_string()) == ext {
                files.push(file);
            }
        }
        (root, files)
    } else if path.is_dir() {
        let files = walk(&path, |_| true)?;
        (path, files)
    } else {
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        (root, vec![path])
    };

    if files.is_empty() {
        return Err(Error::BadPath("Path is empty!".to_string()));
    }
    files.sort();
    debug!("{} files to archive under {}", files.len(), root.display());

    let mut entries = Vec::with_capacity(files.len());
    let mut skipped = vec![];
    for file in files {
        let shown = file.to_string_lossy().into_owned();
        match to_entry(&root, file) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                error!("{} File not added to archive!", e);
                skipped.push((shown, e));
            }
        }
    }
    Ok(CompressPlan {
        root,
        entries,
        skipped,
    })
}

/// Where the archive for `root` goes: `<root>_archive/<root name>.huf`. Creates the directory.
pub fn archive_location(root: &Path) -> Result<PathBuf> {
    let name = root
        .file_name()
        .ok_or_else(|| Error::BadPath(format!("Cannot archive {}", root.display())))?;
    let mut dir = OsString::from(root.as_os_str());
    dir.push("_archive");
    let dir = PathBuf::from(dir);
    fs::create_dir_all(&dir).map_err(|source| Error::Unwritable {
        path: dir.clone(),
        source,
    })?;

    let mut file = name.to_os_string();
    file.push(".");
    file.push(ARCHIVE_EXT);
    Ok(dir.join(file))
}

/// Work out which archives `path` asks to extract.
pub fn decompress_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    let path = resolve(path)?;
    let is_archive = |p: &Path| p.extension().map_or(false, |e| e == ARCHIVE_EXT);

    if path.is_dir() {
        let mut archives = walk(&path, is_archive)?;
        if archives.is_empty() {
            return Err(Error::BadPath(format!(
                "Path is empty or has no .{} files!",
                ARCHIVE_EXT
            )));
        }
        archives.sort();
        Ok(archives)
    } else if is_archive(&path) {
        Ok(vec![path])
    } else {
        Err(Error::BadPath(format!(
            "File must have a .{} extension!",
            ARCHIVE_EXT
        )))
    }
}

/// Where archive `X_archive/X.huf` is extracted to: `X_extracted`, next to `X_archive`.
pub fn extraction_root(archive: &Path) -> PathBuf {
    let dir = archive.parent().unwrap_or_else(|| Path::new(""));
    let base = dir.parent().unwrap_or(dir);
    let mut name = archive.file_stem().unwrap_or_default().to_os_string();
    name.push("_extracted");
    base.join(name)
}

/// Archive whatever `path` names. Returns the archive location and the run report.
pub fn zip_path(path: &Path) -> Result<(PathBuf, CompressReport)> {
    let plan = compress_inputs(path)?;
    let archive = archive_location(&plan.root)?;
    info!("Compressing {}", plan.root.display());

    let fo = File::create(&archive).map_err(|source| Error::Unwritable {
        path: archive.clone(),
        source,
    })?;
    match compress(plan.entries, BufWriter::new(fo)) {
        Ok(mut report) => {
            let mut skipped = plan.skipped;
            skipped.append(&mut report.skipped);
            report.skipped = skipped;
            info!("Archive written to {}", archive.display());
            Ok((archive, report))
        }
        Err(e) => {
            // Don't leave a half written archive behind
            if let Err(rm) = fs::remove_file(&archive) {
                error!("Could not remove {}: {}", archive.display(), rm);
            }
            Err(e)
        }
    }
}

/// Extract every archive `path` names. Each archive succeeds or fails on its own.
pub fn unzip_path(path: &Path) -> Result<Vec<UnzipOutcome>> {
    let archives = decompress_inputs(path)?;
    let outcomes = archives
        .into_iter()
        .map(|archive| {
            info!("Decompressing {}", archive.display());
            let result = File::open(&archive)
                .map_err(|source| Error::Unreadable {
                    name: archive.display().to_string(),
                    source,
                })
                .and_then(|fi| extract(fi, &extraction_root(&archive)));
            if let Err(e) = &result {
                error!("{}", e);
            }
            UnzipOutcome { archive, result }
        })
        .collect();
    Ok(outcomes)
}
