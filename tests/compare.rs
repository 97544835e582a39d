use std::fs;

use mhx::buffer::FileStore;
use mhx::highlight::project;
use mhx::layout::{self, Slot};
use mhx::{BufferError, CompareMode, DiffError};
use tempfile::TempDir;

fn store_with(files: &[(&str, &[u8])]) -> FileStore {
    let mut store = FileStore::new();
    for (id, data) in files {
        store.load(*id, data).unwrap();
    }
    store
}

fn lengths(store: &FileStore) -> Vec<(&str, usize)> {
    store.documents().map(|(h, d)| (h.id(), d.len())).collect()
}

#[test]
fn test_three_file_scenario_end_to_end() {
    let store = store_with(&[
        ("A", &[0x00, 0x01, 0x02]),
        ("B", &[0x00, 0x01, 0xFF]),
        ("C", &[0x00, 0x01, 0x02]),
    ]);

    for mode in [CompareMode::Pairwise, CompareMode::Multi] {
        let diffs = store.compare(mode).unwrap();
        assert_eq!(diffs.iter().collect::<Vec<_>>(), [2], "{mode}");

        let projection = project(&diffs, lengths(&store));
        for id in ["A", "B", "C"] {
            assert!(projection.is_line_highlighted(id, 0));
            assert!(projection.is_byte_different(id, 2));
            assert!(!projection.is_byte_different(id, 1));
        }
    }
}

#[test]
fn test_open_reads_files_from_disk() {
    let dir = TempDir::new().unwrap();
    let left = dir.path().join("left.bin");
    let right = dir.path().join("right.bin");
    fs::write(&left, b"ABCD").unwrap();
    fs::write(&right, b"ABXD").unwrap();

    let mut store = FileStore::new();
    let handle = store.open(&left).unwrap();
    store.open(&right).unwrap();

    assert_eq!(handle.name(), "left.bin");
    assert_eq!(handle.size(), 4);
    let diffs = store.compare(CompareMode::Pairwise).unwrap();
    assert_eq!(diffs.iter().collect::<Vec<_>>(), [2]);
}

#[test]
fn test_open_rejects_same_file_by_another_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("same.bin");
    fs::write(&path, [1, 2, 3]).unwrap();

    let mut store = FileStore::new();
    store.open(&path).unwrap();
    let alias = dir.path().join(".").join("same.bin");

    assert!(matches!(
        store.open(&alias),
        Err(BufferError::DuplicateFile(_))
    ));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_open_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let mut store = FileStore::new();

    assert!(matches!(
        store.open(dir.path().join("missing.bin")),
        Err(BufferError::Io(_))
    ));
    assert!(store.is_empty());
}

#[test]
fn test_mode_minimums() {
    let store = store_with(&[("A", &[1]), ("B", &[2])]);

    assert!(store.compare(CompareMode::Pairwise).is_ok());
    assert_eq!(
        store.compare(CompareMode::Multi),
        Err(DiffError::InsufficientFiles {
            mode: CompareMode::Multi,
            required: 3,
            actual: 2,
        })
    );
}

#[test]
fn test_length_mismatch_flags_tail() {
    let store = store_with(&[("A", &[0x41]), ("B", &[0x41, 0x42]), ("C", &[0x41, 0x42])]);
    let diffs = store.compare(CompareMode::Multi).unwrap();
    assert_eq!(diffs.iter().collect::<Vec<_>>(), [1]);

    // 短いファイルの空きスロットにも印が付く
    let projection = project(&diffs, lengths(&store));
    assert!(projection.is_byte_different("A", 1));
    let line = layout::line_at(&[0x41], 0).unwrap();
    assert_eq!(line.slots().nth(1), Some(Slot::Empty));
}

#[test]
fn test_edit_then_recompare() {
    let mut store = store_with(&[("A", &[0u8; 40]), ("B", &[0u8; 40])]);
    assert!(store.compare(CompareMode::Pairwise).unwrap().is_empty());

    assert!(store.apply_hex_edit("B", 33, "7f").unwrap());
    assert!(!store.apply_hex_edit("B", 34, "g0").unwrap());
    let diffs = store.compare(CompareMode::Pairwise).unwrap();
    assert_eq!(diffs.iter().collect::<Vec<_>>(), [33]);

    let projection = project(&diffs, lengths(&store));
    assert!(projection.is_line_highlighted("A", 32));
    assert!(!projection.is_line_highlighted("A", 16));
}

#[test]
fn test_rejected_writes_leave_content() {
    let mut store = store_with(&[("A", &[1, 2, 3])]);

    assert!(matches!(
        store.set_byte("A", 0, 256),
        Err(BufferError::InvalidByteValue(256))
    ));
    assert!(matches!(
        store.set_byte("A", 0, -1),
        Err(BufferError::InvalidByteValue(-1))
    ));
    assert!(matches!(
        store.set_byte("A", 3, 0),
        Err(BufferError::OffsetOutOfRange { offset: 3, len: 3 })
    ));
    assert!(matches!(
        store.set_byte("Z", 0, 0),
        Err(BufferError::UnknownFile(_))
    ));
    assert_eq!(store.get("A").unwrap().data(), &[1, 2, 3]);
}

#[test]
fn test_layout_covers_every_byte() {
    let data: Vec<u8> = (0..=255).cycle().take(1000).collect();
    let lines: Vec<_> = layout::layout(&data).collect();

    assert_eq!(lines.len(), layout::line_count(data.len()));
    assert_eq!(lines.iter().map(|l| l.byte_count()).sum::<usize>(), data.len());
    assert!(lines[..lines.len() - 1].iter().all(|l| l.byte_count() == 16));
    assert_eq!(lines.last().unwrap().byte_count(), 1000 % 16);
}
