//! バイト列の位置比較
//!
//! どちらのエンジンも同じオフセット同士を比べる。位置合わせはしないので、
//! 1バイト挿入されるとそれ以降はすべて差異になる。

use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeBounds;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    #[error("{mode} compare needs at least {required} files, got {actual}")]
    InsufficientFiles {
        mode: CompareMode,
        required: usize,
        actual: usize,
    },
}

/// 比較モード
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CompareMode {
    /// 先頭を基準に、残りをそれぞれ比較
    #[default]
    Pairwise,
    /// 基準なし。全バッファが一致しない位置が差異
    #[serde(alias = "multi-baseline")]
    #[value(alias = "multi-baseline")]
    Multi,
}

impl CompareMode {
    /// 必要な最小ファイル数
    pub fn min_files(self) -> usize {
        match self {
            CompareMode::Pairwise => 2,
            CompareMode::Multi => 3,
        }
    }

    /// 読み込み順のバッファで比較を実行
    pub fn run(self, buffers: &[&[u8]]) -> Result<DifferenceSet, DiffError> {
        let diffs = match self {
            CompareMode::Pairwise => match buffers.split_first() {
                Some((baseline, others)) => diff_pairwise(baseline, others)?,
                None => return Err(self.insufficient(0)),
            },
            CompareMode::Multi => diff_multi_baseline(buffers)?,
        };
        info!(mode = %self, files = buffers.len(), differences = diffs.len(), "compare finished");
        Ok(diffs)
    }

    fn insufficient(self, actual: usize) -> DiffError {
        DiffError::InsufficientFiles {
            mode: self,
            required: self.min_files(),
            actual,
        }
    }
}

impl fmt::Display for CompareMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareMode::Pairwise => write!(f, "Pairwise"),
            CompareMode::Multi => write!(f, "Multi-baseline"),
        }
    }
}

/// 1回の比較で見つかった差異オフセット
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DifferenceSet {
    offsets: BTreeSet<usize>,
}

impl DifferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, offset: usize) -> bool {
        self.offsets.contains(&offset)
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// 昇順のオフセット
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.offsets.iter().copied()
    }

    /// `range` 内のオフセット（昇順）
    pub fn range<R: RangeBounds<usize>>(&self, range: R) -> impl DoubleEndedIterator<Item = usize> + '_ {
        self.offsets.range(range).copied()
    }

    /// `offset` より後の最初の差異
    pub fn next_after(&self, offset: usize) -> Option<usize> {
        self.range(offset.saturating_add(1)..).next()
    }

    /// `offset` より前の最後の差異
    pub fn prev_before(&self, offset: usize) -> Option<usize> {
        self.range(..offset).next_back()
    }
}

impl FromIterator<usize> for DifferenceSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            offsets: iter.into_iter().collect(),
        }
    }
}

/// `baseline` と `others` を比較
///
/// 基準側にバイトがない位置、または他のどれかが短いか値が違う位置が差異。
pub fn diff_pairwise(baseline: &[u8], others: &[&[u8]]) -> Result<DifferenceSet, DiffError> {
    if others.is_empty() {
        return Err(CompareMode::Pairwise.insufficient(1));
    }

    let len = others.iter().map(|o| o.len()).fold(baseline.len(), usize::max);
    Ok((0..len)
        .filter(|&i| match baseline.get(i) {
            None => true,
            Some(b) => others.iter().any(|o| o.get(i) != Some(b)),
        })
        .collect())
}

/// 3つ以上のバッファを基準なしで比較
///
/// 途中で終わるバッファはその位置で `None` となり、実在のバイトとは一致しない。
pub fn diff_multi_baseline(buffers: &[&[u8]]) -> Result<DifferenceSet, DiffError> {
    if buffers.len() < CompareMode::Multi.min_files() {
        return Err(CompareMode::Multi.insufficient(buffers.len()));
    }

    let len = buffers.iter().map(|b| b.len()).max().unwrap_or(0);
    Ok((0..len)
        .filter(|&i| {
            let first = buffers[0].get(i);
            buffers[1..].iter().any(|b| b.get(i) != first)
        })
        .collect())
}
