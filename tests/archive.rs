use std::fs;
use std::io::Cursor;
use std::path::Path;

use hufzip::tools::paths::{unzip_path, zip_path};
use hufzip::{compress, extract, Entry, Error};

fn archive_bytes(entries: Vec<Entry>) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    compress(entries, &mut out).unwrap();
    out.into_inner()
}

fn u32_at(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

/// Compress `data` as one file, extract it again and return what came out.
fn round_trip(data: &[u8]) -> Vec<u8> {
    let archive = archive_bytes(vec![Entry::from_bytes("data.bin", "", data.to_vec())]);
    let tmp = tempfile::tempdir().unwrap();
    let report = extract(Cursor::new(archive), tmp.path()).unwrap();
    assert_eq!(report.files.len(), 1);
    assert!(report.skipped.is_empty());
    assert_eq!(report.files[0].expected as usize, data.len());
    assert_eq!(report.files[0].extracted as usize, data.len());
    fs::read(tmp.path().join("data.bin")).unwrap()
}

#[test]
fn aaab_test() {
    assert_eq!(round_trip(b"aaab"), b"aaab".to_vec());
}

#[test]
fn single_value_test() {
    for n in [1, 7, 8, 9, 1000] {
        let data = vec![b'z'; n];
        assert_eq!(round_trip(&data), data);
    }
}

#[test]
fn two_values_test() {
    let data: Vec<u8> = (0..1001).map(|i| if i % 5 == 0 { 0 } else { 255 }).collect();
    assert_eq!(round_trip(&data), data);
}

#[test]
fn all_values_test() {
    let data: Vec<u8> = (0..70_000_u32).map(|i| (i.wrapping_mul(7919) >> 3) as u8).collect();
    assert!((0..=255_u8).all(|b| data.contains(&b)));
    assert_eq!(round_trip(&data), data);
}

#[test]
fn declared_size_test() {
    let archive = archive_bytes(vec![
        Entry::from_bytes("one", "", b"first file".to_vec()),
        Entry::from_bytes("two", "nested/dir", b"second file, a bit longer".to_vec()),
    ]);
    assert_eq!(u32_at(&archive, 0) as usize, archive.len());
}

#[test]
fn multi_file_test() {
    let files: Vec<(&str, &str, Vec<u8>)> = vec![
        ("a.txt", "", b"hello hello hello".to_vec()),
        ("empty", "", vec![]),
        ("b.bin", "x", (0..=255).collect()),
        ("c.txt", "x/y", b"the quick brown fox".to_vec()),
    ];
    let entries = files
        .iter()
        .map(|(name, rel, data)| Entry::from_bytes(name, rel, data.clone()))
        .collect();
    let archive = archive_bytes(entries);

    let tmp = tempfile::tempdir().unwrap();
    let report = extract(Cursor::new(archive), tmp.path()).unwrap();
    assert_eq!(report.files.len(), files.len());
    for (name, rel, data) in &files {
        let path = tmp.path().join(rel).join(name);
        assert_eq!(&fs::read(&path).unwrap(), data, "{}", path.display());
    }
}

#[test]
fn truncated_archive_test() {
    let archive = archive_bytes(vec![Entry::from_bytes("a.txt", "", b"some text".to_vec())]);
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("out");

    for cut in [1, archive.len() / 2, archive.len() - 1] {
        let short = archive[..archive.len() - cut].to_vec();
        assert!(matches!(
            extract(Cursor::new(short), &root),
            Err(Error::SizeMismatch { .. })
        ));
    }
    assert!(!root.exists());
}

#[test]
fn desynchronized_section_test() {
    let mut out = Cursor::new(Vec::new());
    let report = compress(
        vec![
            Entry::from_bytes("first", "", b"abcabcabc".to_vec()),
            Entry::from_bytes("second", "", b"cabbage".to_vec()),
            Entry::from_bytes("third", "", b"baccab".to_vec()),
        ],
        &mut out,
    )
    .unwrap();
    let mut archive = out.into_inner();

    // Bump the header size field of the second section
    let first = &report.files[0];
    let at = (report.header_size + first.header_size + first.compressed_size) as usize + 4;
    let size = u32_at(&archive, at) + 1;
    archive[at..at + 4].copy_from_slice(&size.to_le_bytes());

    let tmp = tempfile::tempdir().unwrap();
    let extracted = extract(Cursor::new(archive), tmp.path()).unwrap();
    let names: Vec<_> = extracted.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["first", "third"]);
    assert_eq!(extracted.skipped.len(), 1);
    assert!(matches!(
        extracted.skipped[0].1,
        Error::Desynchronized { .. }
    ));
    assert!(!tmp.path().join("second").exists());
    assert_eq!(fs::read(tmp.path().join("third")).unwrap(), b"baccab".to_vec());
}

#[test]
fn header_mismatch_test() {
    let mut archive = archive_bytes(vec![Entry::from_bytes("a.txt", "", b"header".to_vec())]);
    let size = u32_at(&archive, 4) + 1;
    archive[4..8].copy_from_slice(&size.to_le_bytes());

    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("out");
    assert!(matches!(
        extract(Cursor::new(archive), &root),
        Err(Error::HeaderMismatch { .. })
    ));
    assert!(!root.exists());
}

#[test]
fn unwritable_destination_test() {
    let archive = archive_bytes(vec![
        Entry::from_bytes("f", "blocked", b"cannot land".to_vec()),
        Entry::from_bytes("g", "", b"lands fine".to_vec()),
    ]);
    let tmp = tempfile::tempdir().unwrap();
    // A plain file where the directory should go
    fs::write(tmp.path().join("blocked"), b"in the way").unwrap();

    let report = extract(Cursor::new(archive), tmp.path()).unwrap();
    let names: Vec<_> = report.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["g"]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, "f");
    assert!(matches!(report.skipped[0].1, Error::Unwritable { .. }));
    assert_eq!(fs::read(tmp.path().join("g")).unwrap(), b"lands fine".to_vec());
    assert_eq!(fs::read(tmp.path().join("blocked")).unwrap(), b"in the way".to_vec());
}

#[test]
fn unsafe_path_section_test() {
    let archive = archive_bytes(vec![
        Entry::from_bytes("evil", "../outside", b"nope".to_vec()),
        Entry::from_bytes("fine", "", b"yes".to_vec()),
    ]);
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("out");
    let report = extract(Cursor::new(archive), &root).unwrap();
    assert_eq!(report.files.len(), 1);
    assert!(matches!(report.skipped[0].1, Error::UnsafePath(_)));
    assert!(!tmp.path().join("outside").exists());
    assert_eq!(fs::read(root.join("fine")).unwrap(), b"yes".to_vec());
}

fn write(path: &Path, data: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, data).unwrap();
}

#[test]
fn zip_unzip_directory_test() {
    let tmp = tempfile::tempdir().unwrap();
    let docs = tmp.path().join("docs");
    write(&docs.join("readme.txt"), b"read me, please");
    write(&docs.join("src/main.rs"), b"fn main() {}\n");
    write(&docs.join("src/deep/data.bin"), &[0, 1, 2, 3, 250, 251, 252]);

    let (archive, report) = zip_path(&docs).unwrap();
    assert_eq!(report.files.len(), 3);
    assert!(archive.ends_with("docs_archive/docs.huf"));
    assert_eq!(fs::metadata(&archive).unwrap().len(), report.archive_size as u64);

    let outcomes = unzip_path(&archive).unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].result.is_ok());

    let out = tmp.path().join("docs_extracted");
    assert_eq!(fs::read(out.join("readme.txt")).unwrap(), b"read me, please".to_vec());
    assert_eq!(fs::read(out.join("src/main.rs")).unwrap(), b"fn main() {}\n".to_vec());
    assert_eq!(
        fs::read(out.join("src/deep/data.bin")).unwrap(),
        vec![0, 1, 2, 3, 250, 251, 252]
    );
}

#[test]
fn zip_glob_test() {
    let tmp = tempfile::tempdir().unwrap();
    let docs = tmp.path().join("docs");
    write(&docs.join("a.txt"), b"alpha");
    write(&docs.join("b.txt"), b"beta");
    write(&docs.join("c.md"), b"gamma");

    let (archive, report) = zip_path(&docs.join("*.txt")).unwrap();
    let names: Vec<_> = report.files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);

    // Unzipping the archive directory finds the archive inside it
    let outcomes = unzip_path(archive.parent().unwrap()).unwrap();
    assert!(outcomes[0].result.is_ok());
    let out = tmp.path().join("docs_extracted");
    assert_eq!(fs::read(out.join("b.txt")).unwrap(), b"beta".to_vec());
    assert!(!out.join("c.md").exists());
}
