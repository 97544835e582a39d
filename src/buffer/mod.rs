mod document;
mod store;

pub use document::Document;
pub use store::{format_size, parse_hex_byte, FileHandle, FileStore};

use thiserror::Error;

/// バッファ操作のエラー
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("File already loaded: {0}")]
    DuplicateFile(String),
    #[error("File not loaded: {0}")]
    UnknownFile(String),
    #[error("Invalid byte value: {0} (expected 0-255)")]
    InvalidByteValue(i64),
    #[error("Offset 0x{offset:X} out of range (size 0x{len:X})")]
    OffsetOutOfRange { offset: usize, len: usize },
    /// ファイル読み込みの失敗（比較エンジン自体のエラーではない）
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
