use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Widget},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::{Colors, RenderMode};
use crate::highlight::FileHighlight;
use crate::layout::{self, LineRecord, Slot, BYTES_PER_LINE};

/// アドレス欄の幅（区切り込み）
const ADDR_WIDTH: u16 = 10;
/// HEX 1バイト分の幅（区切り込み）
const HEX_CELL_WIDTH: u16 = 3;
/// HEX欄の末尾位置
const HEX_END: u16 = ADDR_WIDTH + HEX_CELL_WIDTH * BYTES_PER_LINE as u16;
/// ASCII欄まで表示するのに必要な幅
pub const FULL_WIDTH: u16 = HEX_END + 1 + BYTES_PER_LINE as u16;

/// 1ファイル分のHEX/ASCII表示ウィジェット
pub struct HexPane<'a> {
    /// 表示するデータ
    data: &'a [u8],
    /// ファイル名
    title: &'a str,
    /// 変更フラグ
    modified: bool,
    /// 表示開始行
    top_line: usize,
    /// カーソル位置（フォーカス中のペインのみ）
    cursor: Option<usize>,
    /// 入力途中のHEX 1桁目
    pending: Option<char>,
    /// 描画モード
    mode: RenderMode,
    /// 比較結果のハイライト
    highlight: Option<&'a FileHighlight>,
    /// フォーカス中かどうか
    focused: bool,
}

impl<'a> HexPane<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            title: "",
            modified: false,
            top_line: 0,
            cursor: None,
            pending: None,
            mode: RenderMode::View,
            highlight: None,
            focused: false,
        }
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    pub fn modified(mut self, modified: bool) -> Self {
        self.modified = modified;
        self
    }

    pub fn top_line(mut self, line: usize) -> Self {
        self.top_line = line;
        self
    }

    pub fn cursor(mut self, cursor: Option<usize>) -> Self {
        self.cursor = cursor;
        self
    }

    pub fn pending(mut self, pending: Option<char>) -> Self {
        self.pending = pending;
        self
    }

    pub fn mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn highlight(mut self, highlight: Option<&'a FileHighlight>) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// バイト値に応じた色を取得
    fn byte_style(&self, slot: Slot) -> Style {
        let fg = match slot {
            Slot::Byte(0x00) => Colors::HEX_ZERO,
            Slot::Byte(0xFF) => Colors::HEX_HIGH,
            Slot::Byte(0x20..=0x7E) => Colors::HEX_PRINTABLE,
            _ => Colors::HEX_NORMAL,
        };
        let style = Style::default().fg(fg);
        // 編集モードでは入力欄であることを示す
        if self.mode == RenderMode::Edit && slot != Slot::Empty {
            style.add_modifier(Modifier::UNDERLINED)
        } else {
            style
        }
    }

    fn is_byte_different(&self, offset: usize) -> bool {
        self.highlight.is_some_and(|h| h.is_byte_different(offset))
    }

    /// 差異・カーソルを重ねたスタイル
    fn cell_style(&self, base: Style, offset: usize) -> Style {
        let mut style = base;
        if self.is_byte_different(offset) {
            style = style.fg(Colors::BYTE_DIFF).bg(Colors::BYTE_DIFF_BG);
        }
        if self.cursor == Some(offset) {
            style = match self.mode {
                RenderMode::Edit => style.fg(Colors::CURSOR).bg(Colors::CURSOR_BG),
                RenderMode::View => style.add_modifier(Modifier::REVERSED),
            };
        }
        style
    }

    fn block_title(&self, width: u16) -> String {
        let suffix = if self.modified { " [+]" } else { "" };
        let max = (width as usize).saturating_sub(4 + suffix.len());
        format!(" {}{} ", truncate_to_width(self.title, max), suffix)
    }

    /// 1行分のデータを描画
    fn render_row(&self, line: &LineRecord<'_>, area: Rect, show_ascii: bool, buf: &mut Buffer) {
        let right = area.right();
        let y = area.y;
        let line_highlighted = self
            .highlight
            .is_some_and(|h| h.is_line_highlighted(line.offset()));
        let row_style = if line_highlighted {
            buf.set_style(area, Style::default().bg(Colors::LINE_DIFF_BG));
            Style::default().bg(Colors::LINE_DIFF_BG)
        } else {
            Style::default()
        };

        let mut x = area.x;

        // アドレス表示
        put(buf, x, y, &line.address(), row_style.fg(Colors::ADDR), right);
        x += ADDR_WIDTH;

        // HEX表示
        for (i, slot) in line.slots().enumerate() {
            let offset = line.offset() + i;
            let text = match self.pending {
                Some(digit) if self.cursor == Some(offset) && self.mode == RenderMode::Edit => {
                    format!("{}_", digit)
                }
                _ => slot.hex(),
            };
            let style = self.cell_style(row_style.patch(self.byte_style(slot)), offset);
            put(buf, x, y, &text, style, right);
            x += HEX_CELL_WIDTH;
        }

        if !show_ascii {
            return;
        }
        x += 1; // 区切りスペース

        // ASCII表示
        for (i, slot) in line.slots().enumerate() {
            let offset = line.offset() + i;
            let style = self.cell_style(row_style.fg(Colors::ASCII_NORMAL), offset);
            put(buf, x, y, &slot.ascii().to_string(), style, right);
            x += 1;
        }
    }
}

impl Widget for HexPane<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border = if self.focused {
            Colors::BORDER_FOCUSED
        } else {
            Colors::BORDER
        };
        let block = Block::bordered()
            .title(self.block_title(area.width))
            .border_style(Style::default().fg(border));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let show_ascii = inner.width >= FULL_WIDTH;
        let right = inner.right();

        // ヘッダー行を描画
        let mut header = layout::header();
        if !show_ascii {
            header.truncate(HEX_END as usize);
        }
        put(
            buf,
            inner.x,
            inner.y,
            &header,
            Style::default()
                .fg(Colors::HEADER)
                .add_modifier(Modifier::BOLD),
            right,
        );

        if self.data.is_empty() {
            if inner.height > 1 {
                put(buf, inner.x, inner.y + 1, "(empty)", Style::default().fg(Colors::HEX_ZERO), right);
            }
            return;
        }

        // データ行を描画
        for row in 0..inner.height.saturating_sub(1) {
            let Some(line) = layout::line_at(self.data, self.top_line + row as usize) else {
                break;
            };
            let row_area = Rect {
                x: inner.x,
                y: inner.y + 1 + row,
                width: inner.width,
                height: 1,
            };
            self.render_row(&line, row_area, show_ascii, buf);
        }
    }
}

/// ペインの右端で切り詰めて書き込む
fn put(buf: &mut Buffer, x: u16, y: u16, s: &str, style: Style, right: u16) {
    if x >= right {
        return;
    }
    buf.set_stringn(x, y, s, (right - x) as usize, style);
}

/// 表示幅に収まるよう切り詰める
fn truncate_to_width(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut width = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max - 1 {
            break;
        }
        width += w;
        out.push(ch);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DifferenceSet;
    use crate::highlight::project;

    fn render(pane: HexPane<'_>, width: u16, height: u16) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        pane.render(area, &mut buf);
        buf
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_renders_address_hex_and_ascii() {
        let data = b"Hello, world!\x00\x01\x02more";
        let buf = render(HexPane::new(data).title("a.bin"), FULL_WIDTH + 2, 5);

        let header = row_text(&buf, 1);
        assert!(header.contains("Offset    00 01 02"));
        let first = row_text(&buf, 2);
        assert!(first.starts_with("│00000000  48 65 6C 6C 6F"));
        assert!(first.contains("Hello, world!..."));
        let second = row_text(&buf, 3);
        assert!(second.starts_with("│00000010  6D 6F 72 65      "));
        assert!(second.contains("more            │"));
    }

    #[test]
    fn test_narrow_pane_hides_ascii() {
        let data = b"ABCDEFGHIJKLMNOP";
        let buf = render(HexPane::new(data), HEX_END + 2, 4);

        let row = row_text(&buf, 2);
        assert!(row.contains("41 42"));
        assert!(!row.contains("ABCD"));
    }

    #[test]
    fn test_difference_highlight() {
        let data = [0x00, 0x01, 0x02];
        let diffs: DifferenceSet = [2].into_iter().collect();
        let projection = project(&diffs, [("a", data.len())]);
        let buf = render(
            HexPane::new(&data).highlight(projection.file("a")),
            FULL_WIDTH + 2,
            4,
        );

        // 枠(1) + アドレス(10) + 2バイト目(3*2)
        let diff_x = 1 + ADDR_WIDTH + HEX_CELL_WIDTH * 2;
        assert_eq!(buf[(diff_x, 2)].bg, Colors::BYTE_DIFF_BG);
        assert_eq!(buf[(diff_x - HEX_CELL_WIDTH, 2)].bg, Colors::LINE_DIFF_BG);
        let ascii_x = 1 + HEX_END + 1 + 2;
        assert_eq!(buf[(ascii_x, 2)].bg, Colors::BYTE_DIFF_BG);
    }

    #[test]
    fn test_pending_digit_in_edit_mode() {
        let data = [0xAB, 0xCD];
        let pane = HexPane::new(&data)
            .mode(RenderMode::Edit)
            .cursor(Some(1))
            .pending(Some('7'))
            .focused(true);
        let buf = render(pane, FULL_WIDTH + 2, 4);

        let row = row_text(&buf, 2);
        assert!(row.contains("AB 7_"));
        let cursor_x = 1 + ADDR_WIDTH + HEX_CELL_WIDTH;
        assert_eq!(buf[(cursor_x, 2)].bg, Colors::CURSOR_BG);
    }

    #[test]
    fn test_title_marks_modified() {
        let buf = render(HexPane::new(&[1]).title("b.bin").modified(true), 40, 3);

        assert!(row_text(&buf, 0).contains(" b.bin [+] "));
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("a_long_file_name.bin", 6), "a_lon…");
        assert_eq!(truncate_to_width("ファイル", 5), "ファ…");
        assert_eq!(truncate_to_width("abc", 0), "");
    }
}
