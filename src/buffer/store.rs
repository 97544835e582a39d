use std::fs;
use std::path::Path;

use tracing::debug;

use super::{BufferError, Document};
use crate::diff::{CompareMode, DiffError, DifferenceSet};

/// 読み込み済みファイルの識別情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// 識別子（正規化済みパス）
    id: String,
    /// 表示名
    name: String,
    /// 読み込み時のサイズ
    size: usize,
}

impl FileHandle {
    fn new(id: String, size: usize) -> Self {
        let name = Path::new(&id)
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(&id)
            .to_string();
        Self { id, name, size }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// 表示用のサイズ文字列
    pub fn display_size(&self) -> String {
        format_size(self.size as u64)
    }
}

struct Entry {
    handle: FileHandle,
    document: Document,
}

/// 比較対象のバイト列を読み込み順に保持する
///
/// 最初に読み込んだファイルが2ファイル比較の基準になる。
#[derive(Default)]
pub struct FileStore {
    entries: Vec<Entry>,
}

impl FileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// バイト列を登録
    ///
    /// `id` は呼び出し側で正規化済みであること。
    pub fn load(&mut self, id: impl Into<String>, raw: &[u8]) -> Result<FileHandle, BufferError> {
        let id = id.into();
        if self.contains(&id) {
            return Err(BufferError::DuplicateFile(id));
        }

        let handle = FileHandle::new(id, raw.len());
        debug!(id = handle.id(), size = handle.size(), "loaded buffer");
        self.entries.push(Entry {
            handle: handle.clone(),
            document: Document::from_bytes(raw),
        });
        Ok(handle)
    }

    /// ファイルを読み込んで登録（パスは正規化してから比較する）
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<FileHandle, BufferError> {
        let canonical = fs::canonicalize(path.as_ref())?;
        let id = canonical.to_string_lossy().into_owned();
        if self.contains(&id) {
            return Err(BufferError::DuplicateFile(id));
        }
        let data = fs::read(&canonical)?;
        self.load(id, &data)
    }

    /// 登録済みかどうか
    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.handle.id == id)
    }

    fn entry(&self, id: &str) -> Result<&Entry, BufferError> {
        self.entries
            .iter()
            .find(|e| e.handle.id == id)
            .ok_or_else(|| BufferError::UnknownFile(id.to_string()))
    }

    /// バッファを取得
    pub fn get(&self, id: &str) -> Result<&Document, BufferError> {
        self.entry(id).map(|e| &e.document)
    }

    /// ハンドルを取得
    pub fn handle(&self, id: &str) -> Result<&FileHandle, BufferError> {
        self.entry(id).map(|e| &e.handle)
    }

    /// 1バイトを上書き
    ///
    /// 失敗した場合、バッファは一切変更されない。
    pub fn set_byte(&mut self, id: &str, offset: usize, value: i64) -> Result<(), BufferError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.handle.id == id)
            .ok_or_else(|| BufferError::UnknownFile(id.to_string()))?;
        let value = u8::try_from(value).map_err(|_| BufferError::InvalidByteValue(value))?;
        entry.document.set(offset, value)?;
        debug!(id, offset, value, "set byte");
        Ok(())
    }

    /// 2桁のHEX文字列による編集
    ///
    /// 不正な文字列は無視して `Ok(false)` を返す。
    pub fn apply_hex_edit(&mut self, id: &str, offset: usize, text: &str) -> Result<bool, BufferError> {
        let Some(value) = parse_hex_byte(text) else {
            return Ok(false);
        };
        self.set_byte(id, offset, i64::from(value))?;
        Ok(true)
    }

    /// 全ファイルを破棄
    pub fn clear(&mut self) {
        debug!(count = self.entries.len(), "cleared all buffers");
        self.entries.clear();
    }

    /// 読み込み順のハンドル一覧
    pub fn files(&self) -> impl Iterator<Item = &FileHandle> {
        self.entries.iter().map(|e| &e.handle)
    }

    /// 読み込み順のハンドルとバッファ
    pub fn documents(&self) -> impl Iterator<Item = (&FileHandle, &Document)> {
        self.entries.iter().map(|e| (&e.handle, &e.document))
    }

    /// 位置指定でハンドルを取得
    pub fn handle_at(&self, index: usize) -> Option<&FileHandle> {
        self.entries.get(index).map(|e| &e.handle)
    }

    /// 位置指定でバッファを取得
    pub fn document_at(&self, index: usize) -> Option<&Document> {
        self.entries.get(index).map(|e| &e.document)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 現在の内容で比較を実行（読み込み順、先頭が基準）
    pub fn compare(&self, mode: CompareMode) -> Result<DifferenceSet, DiffError> {
        let buffers: Vec<&[u8]> = self.entries.iter().map(|e| e.document.data()).collect();
        mode.run(&buffers)
    }
}

/// 2桁のHEX文字列をバイトに変換
pub fn parse_hex_byte(text: &str) -> Option<u8> {
    if text.len() != 2 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(text, 16).ok()
}

/// ファイルサイズを表示用に整形
pub fn format_size(size: u64) -> String {
    let mut size = size as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{:.2} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.2} TB", size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(files: &[(&str, &[u8])]) -> FileStore {
        let mut store = FileStore::new();
        for (id, data) in files {
            store.load(*id, data).unwrap();
        }
        store
    }

    #[test]
    fn test_load_and_get() {
        let store = store_with(&[("/tmp/a.bin", &[1, 2, 3])]);

        let handle = store.handle("/tmp/a.bin").unwrap();
        assert_eq!(handle.name(), "a.bin");
        assert_eq!(handle.size(), 3);
        assert_eq!(store.get("/tmp/a.bin").unwrap().data(), &[1, 2, 3]);
    }

    #[test]
    fn test_load_copies_input() {
        let mut raw = vec![0x10, 0x20];
        let mut store = FileStore::new();
        store.load("a", &raw).unwrap();
        raw[0] = 0xFF;

        assert_eq!(store.get("a").unwrap().data(), &[0x10, 0x20]);
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let mut store = store_with(&[("a", &[1])]);
        let err = store.load("a", &[2]).unwrap_err();

        assert!(matches!(err, BufferError::DuplicateFile(ref id) if id == "a"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().data(), &[1]);
    }

    #[test]
    fn test_unknown_file() {
        let mut store = FileStore::new();

        assert!(matches!(store.get("nope"), Err(BufferError::UnknownFile(_))));
        assert!(matches!(
            store.set_byte("nope", 0, 1),
            Err(BufferError::UnknownFile(_))
        ));
    }

    #[test]
    fn test_set_byte_rejects_out_of_range_values() {
        let mut store = store_with(&[("a", &[0x41, 0x42])]);

        for value in [256, -1] {
            let err = store.set_byte("a", 0, value).unwrap_err();
            assert!(matches!(err, BufferError::InvalidByteValue(v) if v == value));
        }
        assert_eq!(store.get("a").unwrap().data(), &[0x41, 0x42]);
        assert!(!store.get("a").unwrap().is_modified());
    }

    #[test]
    fn test_set_byte_offset_out_of_range() {
        let mut store = store_with(&[("a", &[0x41, 0x42])]);
        let err = store.set_byte("a", 2, 0).unwrap_err();

        assert!(matches!(err, BufferError::OffsetOutOfRange { offset: 2, len: 2 }));
        assert_eq!(store.get("a").unwrap().len(), 2);
    }

    #[test]
    fn test_set_byte_changes_exactly_one_byte() {
        let mut store = store_with(&[("a", &[0, 0, 0])]);
        store.set_byte("a", 1, 255).unwrap();

        assert_eq!(store.get("a").unwrap().data(), &[0, 255, 0]);
    }

    #[test]
    fn test_apply_hex_edit() {
        let mut store = store_with(&[("a", &[0, 0])]);

        assert!(store.apply_hex_edit("a", 0, "fF").unwrap());
        for bad in ["F", "FFF", "G1", "+F", " 1", ""] {
            assert!(!store.apply_hex_edit("a", 1, bad).unwrap(), "{bad:?}");
        }
        assert_eq!(store.get("a").unwrap().data(), &[0xFF, 0]);
        assert!(store.apply_hex_edit("a", 5, "00").is_err());
    }

    #[test]
    fn test_clear() {
        let mut store = store_with(&[("a", &[1]), ("b", &[2])]);
        store.clear();

        assert!(store.is_empty());
        assert!(matches!(store.get("a"), Err(BufferError::UnknownFile(_))));
        store.load("a", &[3]).unwrap();
        assert_eq!(store.get("a").unwrap().data(), &[3]);
    }

    #[test]
    fn test_files_keep_load_order() {
        let store = store_with(&[("c", &[]), ("a", &[]), ("b", &[])]);
        let ids: Vec<&str> = store.files().map(|h| h.id()).collect();

        assert_eq!(ids, ["c", "a", "b"]);
        assert_eq!(store.handle_at(1).map(|h| h.id()), Some("a"));
    }

    #[test]
    fn test_compare_uses_first_file_as_baseline() {
        let store = store_with(&[("a", &[0x41, 0x42]), ("b", &[0x41, 0x42, 0x43])]);
        let diffs = store.compare(CompareMode::Pairwise).unwrap();

        assert_eq!(diffs.iter().collect::<Vec<_>>(), [2]);
    }

    #[test]
    fn test_compare_reflects_edits() {
        let mut store = store_with(&[("a", &[1, 2]), ("b", &[1, 2])]);
        assert!(store.compare(CompareMode::Pairwise).unwrap().is_empty());

        store.set_byte("b", 0, 9).unwrap();
        let diffs = store.compare(CompareMode::Pairwise).unwrap();
        assert_eq!(diffs.iter().collect::<Vec<_>>(), [0]);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0.00 B");
        assert_eq!(format_size(1023), "1023.00 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(2 * 1024 * 1024 * 1024 * 1024), "2.00 TB");
    }
}
