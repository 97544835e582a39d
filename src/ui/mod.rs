mod file_list;
mod hex_view;

pub use file_list::file_table;
pub use hex_view::{HexPane, FULL_WIDTH};

use ratatui::style::Color;

/// 描画モード（編集可能な表示かどうか）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    View,
    Edit,
}

impl RenderMode {
    pub fn toggle(self) -> Self {
        match self {
            RenderMode::View => RenderMode::Edit,
            RenderMode::Edit => RenderMode::View,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RenderMode::View => "VIEW",
            RenderMode::Edit => "EDIT",
        }
    }
}

/// 配色
pub struct Colors;

impl Colors {
    pub const ADDR: Color = Color::Cyan;
    pub const HEADER: Color = Color::Yellow;
    pub const HEX_ZERO: Color = Color::DarkGray;
    pub const HEX_HIGH: Color = Color::Magenta;
    pub const HEX_PRINTABLE: Color = Color::Green;
    pub const HEX_NORMAL: Color = Color::White;
    pub const ASCII_NORMAL: Color = Color::Gray;
    pub const CURSOR: Color = Color::Black;
    pub const CURSOR_BG: Color = Color::Yellow;
    /// 差異を含む行
    pub const LINE_DIFF_BG: Color = Color::Rgb(64, 64, 32);
    /// 差異のあるバイト
    pub const BYTE_DIFF: Color = Color::Black;
    pub const BYTE_DIFF_BG: Color = Color::Rgb(255, 200, 200);
    pub const BORDER: Color = Color::DarkGray;
    pub const BORDER_FOCUSED: Color = Color::Yellow;
    pub const SELECTED_BG: Color = Color::DarkGray;
}
