use super::BufferError;

/// 1ファイル分のバイト列
///
/// 長さは読み込み時に固定され、変更は位置指定の上書きのみ。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// バッファデータ
    data: Vec<u8>,
    /// 変更フラグ
    modified: bool,
}

impl Document {
    /// バイト列から作成（呼び出し元とは独立したコピーを持つ）
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            modified: false,
        }
    }

    /// データの長さを取得
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// データが空かどうか
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 指定位置のバイトを取得
    pub fn get(&self, pos: usize) -> Option<u8> {
        self.data.get(pos).copied()
    }

    /// 指定範囲のバイト列を取得
    pub fn get_range(&self, start: usize, end: usize) -> Option<&[u8]> {
        if start <= end && end <= self.data.len() {
            Some(&self.data[start..end])
        } else {
            None
        }
    }

    /// 指定位置のバイトを上書き
    pub fn set(&mut self, pos: usize, value: u8) -> Result<(), BufferError> {
        let len = self.data.len();
        let slot = self
            .data
            .get_mut(pos)
            .ok_or(BufferError::OffsetOutOfRange { offset: pos, len })?;
        if *slot != value {
            *slot = value;
            self.modified = true;
        }
        Ok(())
    }

    /// 変更されているかどうか
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// 生データへの参照を取得
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_in_place() {
        let mut doc = Document::from_bytes(vec![0x00, 0x01, 0x02]);
        doc.set(1, 0xAB).unwrap();

        assert_eq!(doc.data(), &[0x00, 0xAB, 0x02]);
        assert_eq!(doc.len(), 3);
        assert!(doc.is_modified());
    }

    #[test]
    fn test_set_same_value_is_not_a_modification() {
        let mut doc = Document::from_bytes(vec![0x41]);
        doc.set(0, 0x41).unwrap();

        assert!(!doc.is_modified());
    }

    #[test]
    fn test_set_past_end_fails() {
        let mut doc = Document::from_bytes(vec![0x41, 0x42]);
        let err = doc.set(2, 0x00).unwrap_err();

        assert!(matches!(err, BufferError::OffsetOutOfRange { offset: 2, len: 2 }));
        assert_eq!(doc.data(), &[0x41, 0x42]);
    }

    #[test]
    fn test_get_range() {
        let doc = Document::from_bytes(b"hello".to_vec());

        assert_eq!(doc.get_range(1, 3), Some(&b"el"[..]));
        assert_eq!(doc.get_range(3, 6), None);
        assert_eq!(doc.get(5), None);
    }
}
