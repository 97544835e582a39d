//! 差異集合を各ファイルの行・バイトに投影する
//!
//! 結果はファイルIDとオフセットで引くだけのデータ。描画方法は描画側が決める。

use std::collections::{BTreeSet, HashMap};

use crate::diff::DifferenceSet;
use crate::layout::{line_count, BYTES_PER_LINE};

/// 1ファイル分のハイライト
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileHighlight {
    lines: BTreeSet<usize>,
    bytes: BTreeSet<usize>,
}

impl FileHighlight {
    /// `line_offset` は行頭バイトのオフセット
    pub fn is_line_highlighted(&self, line_offset: usize) -> bool {
        self.lines.contains(&line_offset)
    }

    /// 最終行の空きスロットも差異なら含む
    pub fn is_byte_different(&self, offset: usize) -> bool {
        self.bytes.contains(&offset)
    }

    pub fn lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.lines.iter().copied()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
}

/// 1回の比較結果の全ファイル分ハイライト
#[derive(Debug, Clone, Default)]
pub struct Projection {
    files: HashMap<String, FileHighlight>,
    differences: usize,
}

impl Projection {
    pub fn file(&self, id: &str) -> Option<&FileHighlight> {
        self.files.get(id)
    }

    pub fn is_line_highlighted(&self, id: &str, line_offset: usize) -> bool {
        self.file(id).is_some_and(|f| f.is_line_highlighted(line_offset))
    }

    pub fn is_byte_different(&self, id: &str, offset: usize) -> bool {
        self.file(id).is_some_and(|f| f.is_byte_different(offset))
    }

    /// 元になった差異の数
    pub fn differences(&self) -> usize {
        self.differences
    }
}

/// `diffs` を `(id, 長さ)` で与えたファイルに投影
///
/// ファイルに存在する行だけが対象。16スロットのどれかが差異なら行をハイライト
/// するので、短いファイルでも他のファイルが続く位置がわかる。
pub fn project<'a, I>(diffs: &DifferenceSet, files: I) -> Projection
where
    I: IntoIterator<Item = (&'a str, usize)>,
{
    let files = files
        .into_iter()
        .map(|(id, len)| {
            let end = line_count(len) * BYTES_PER_LINE;
            let mut highlight = FileHighlight::default();
            for offset in diffs.range(..end) {
                highlight.lines.insert(offset - offset % BYTES_PER_LINE);
                highlight.bytes.insert(offset);
            }
            (id.to_string(), highlight)
        })
        .collect();

    Projection {
        files,
        differences: diffs.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_multi_baseline;

    #[test]
    fn test_three_file_scenario() {
        let a = [0x00, 0x01, 0x02];
        let b = [0x00, 0x01, 0xFF];
        let c = [0x00, 0x01, 0x02];
        let diffs = diff_multi_baseline(&[&a, &b, &c]).unwrap();
        assert_eq!(diffs.iter().collect::<Vec<_>>(), [2]);

        let projection = project(&diffs, [("a", 3), ("b", 3), ("c", 3)]);
        for id in ["a", "b", "c"] {
            assert!(projection.is_line_highlighted(id, 0));
            assert!(projection.is_byte_different(id, 2));
            assert!(!projection.is_byte_different(id, 1));
        }
        assert_eq!(projection.differences(), 1);
    }

    #[test]
    fn test_only_lines_with_differences_are_highlighted() {
        let diffs: DifferenceSet = [5, 40].into_iter().collect();
        let projection = project(&diffs, [("a", 64)]);
        let file = projection.file("a").unwrap();

        assert_eq!(file.lines().collect::<Vec<_>>(), [0, 32]);
        assert!(!file.is_line_highlighted(16));
        assert!(file.is_byte_different(40));
        assert!(!file.is_byte_different(41));
    }

    #[test]
    fn test_lines_past_end_of_file_are_skipped() {
        let diffs: DifferenceSet = [2, 20].into_iter().collect();
        let projection = project(&diffs, [("short", 2), ("long", 21)]);

        // 短いファイルは0行目のみ存在し、欠落位置(2)が空きスロットとして示される
        let short = projection.file("short").unwrap();
        assert_eq!(short.lines().collect::<Vec<_>>(), [0]);
        assert!(short.is_byte_different(2));
        assert!(!short.is_byte_different(20));

        let long = projection.file("long").unwrap();
        assert_eq!(long.lines().collect::<Vec<_>>(), [0, 16]);
    }

    #[test]
    fn test_unknown_file_has_no_highlights() {
        let diffs: DifferenceSet = [0].into_iter().collect();
        let projection = project(&diffs, [("a", 1)]);

        assert!(projection.file("b").is_none());
        assert!(!projection.is_line_highlighted("b", 0));
    }

    #[test]
    fn test_empty_difference_set() {
        let projection = project(&DifferenceSet::new(), [("a", 100)]);

        assert_eq!(projection.file("a").unwrap().line_count(), 0);
        assert_eq!(projection.differences(), 0);
    }
}
