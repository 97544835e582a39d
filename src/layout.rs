//! 16バイト単位の行レイアウト
//!
//! 描画側はここで生成した行を並べるだけでよい。最終行が16バイトに満たない場合も、
//! 各行は常に16スロットを持ち、データのない位置は [`Slot::Empty`] になる。

use std::iter::{Enumerate, FusedIterator};
use std::ops::Range;
use std::slice::Chunks;

/// 1行あたりのバイト数
pub const BYTES_PER_LINE: usize = 16;

/// 1行内の1スロット
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Byte(u8),
    /// 最終行の末尾でデータがない位置
    Empty,
}

impl Slot {
    /// HEX表示（空きは空白2文字）
    pub fn hex(self) -> String {
        match self {
            Slot::Byte(b) => format!("{:02X}", b),
            Slot::Empty => "  ".to_string(),
        }
    }

    /// ASCII表示（空きは空白1文字）
    pub fn ascii(self) -> char {
        match self {
            Slot::Byte(b) => ascii_char(b),
            Slot::Empty => ' ',
        }
    }

    pub fn byte(self) -> Option<u8> {
        match self {
            Slot::Byte(b) => Some(b),
            Slot::Empty => None,
        }
    }
}

/// 表示可能な文字はそのまま、それ以外は '.'
pub fn ascii_char(b: u8) -> char {
    if (0x20..=0x7E).contains(&b) {
        b as char
    } else {
        '.'
    }
}

/// アドレス文字列（8桁以上、大文字16進）
pub fn format_address(offset: usize) -> String {
    format!("{:08X}", offset)
}

/// 1行分のレコード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRecord<'a> {
    offset: usize,
    bytes: &'a [u8],
}

impl<'a> LineRecord<'a> {
    /// 行頭のオフセット（16の倍数）
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 行の番号
    pub fn index(&self) -> usize {
        self.offset / BYTES_PER_LINE
    }

    /// 実データのバイト数（1〜16）
    pub fn byte_count(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// 実データの絶対オフセット範囲
    pub fn offsets(&self) -> Range<usize> {
        self.offset..self.offset + self.bytes.len()
    }

    /// 16スロット分の絶対オフセット範囲（空きスロットを含む）
    pub fn slot_offsets(&self) -> Range<usize> {
        self.offset..self.offset + BYTES_PER_LINE
    }

    pub fn address(&self) -> String {
        format_address(self.offset)
    }

    /// 常に16個のスロット
    pub fn slots(&self) -> impl Iterator<Item = Slot> + 'a {
        let bytes = self.bytes;
        (0..BYTES_PER_LINE).map(move |i| bytes.get(i).map_or(Slot::Empty, |&b| Slot::Byte(b)))
    }

    pub fn hex_tokens(&self) -> Vec<String> {
        self.slots().map(Slot::hex).collect()
    }

    pub fn ascii_tokens(&self) -> Vec<char> {
        self.slots().map(Slot::ascii).collect()
    }

    /// "41 42 43 ..." 形式（空きスロットも幅を保つ）
    pub fn hex_string(&self) -> String {
        self.hex_tokens().join(" ")
    }

    pub fn ascii_string(&self) -> String {
        self.slots().map(Slot::ascii).collect()
    }
}

/// 行レコードのイテレータ
///
/// `Clone` すれば同じ列を最初から取り直せる。
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    chunks: Enumerate<Chunks<'a, u8>>,
}

impl<'a> Iterator for Lines<'a> {
    type Item = LineRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.next().map(|(i, bytes)| LineRecord {
            offset: i * BYTES_PER_LINE,
            bytes,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.chunks.nth(n).map(|(i, bytes)| LineRecord {
            offset: i * BYTES_PER_LINE,
            bytes,
        })
    }
}

impl ExactSizeIterator for Lines<'_> {}
impl FusedIterator for Lines<'_> {}

/// バッファ全体の行レイアウト
pub fn layout(data: &[u8]) -> Lines<'_> {
    Lines {
        chunks: data.chunks(BYTES_PER_LINE).enumerate(),
    }
}

/// 行数
pub fn line_count(len: usize) -> usize {
    len.div_ceil(BYTES_PER_LINE)
}

/// 指定行だけを取り出す（表示範囲のみ描画する用）
pub fn line_at(data: &[u8], index: usize) -> Option<LineRecord<'_>> {
    let start = index.checked_mul(BYTES_PER_LINE)?;
    if start >= data.len() {
        return None;
    }
    let end = (start + BYTES_PER_LINE).min(data.len());
    Some(LineRecord {
        offset: start,
        bytes: &data[start..end],
    })
}

/// 列見出し
pub fn header() -> String {
    format!(
        "{:8}  {}  {}",
        "Offset",
        (0..BYTES_PER_LINE)
            .map(|i| format!("{:02X}", i))
            .collect::<Vec<_>>()
            .join(" "),
        "ASCII"
    )
}
