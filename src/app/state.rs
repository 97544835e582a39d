use std::path::{Path, PathBuf};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Paragraph},
    Frame,
};
use tracing::{debug, warn};

use super::{Action, InputState, KeyMod, PrefixKey};
use crate::buffer::{BufferError, FileHandle, FileStore};
use crate::config::Config;
use crate::diff::{CompareMode, DifferenceSet};
use crate::highlight::{project, Projection};
use crate::layout::BYTES_PER_LINE;
use crate::ui::{file_table, HexPane, RenderMode};

/// プロンプト入力モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptMode {
    #[default]
    Off,
    /// アドレスジャンプ入力中
    GotoAddress,
    /// ファイルパス入力中（開く）
    OpenFile,
}

/// 直近の比較結果
struct CompareResult {
    mode: CompareMode,
    diffs: DifferenceSet,
    projection: Projection,
}

/// アプリケーション状態
pub struct App {
    /// 読み込み済みファイル
    store: FileStore,
    /// 設定
    config: Config,
    /// 直近の比較結果（ファイル構成が変わると破棄）
    result: Option<CompareResult>,
    /// フォーカス中のペイン
    focus: usize,
    /// カーソル位置（全ペイン共通のオフセット）
    cursor: usize,
    /// 表示開始行（全ペインで同期）
    top_line: usize,
    /// 表示可能な行数
    visible_rows: usize,
    /// 描画モード
    render_mode: RenderMode,
    /// 入力状態
    input_state: InputState,
    /// プレフィックスキー状態（C-x等）
    prefix_key: PrefixKey,
    /// プロンプト入力モード
    prompt_mode: PromptMode,
    /// プロンプト入力内容
    prompt_input: String,
    /// 終了フラグ
    should_quit: bool,
    /// ステータスメッセージ
    status_message: Option<String>,
}

impl App {
    /// 新しいアプリケーションを作成
    pub fn new(config: Config) -> Self {
        let render_mode = if config.start_in_edit_mode {
            RenderMode::Edit
        } else {
            RenderMode::View
        };
        Self {
            store: FileStore::new(),
            config,
            result: None,
            focus: 0,
            cursor: 0,
            top_line: 0,
            visible_rows: 24,
            render_mode,
            input_state: InputState::Normal,
            prefix_key: PrefixKey::None,
            prompt_mode: PromptMode::Off,
            prompt_input: String::new(),
            should_quit: false,
            status_message: None,
        }
    }

    /// 全角英数記号（U+FF01〜U+FF5E）を半角（U+0021〜U+007E）に変換
    fn normalize_fullwidth(c: char) -> char {
        let cp = c as u32;
        if (0xFF01..=0xFF5E).contains(&cp) {
            char::from_u32(cp - 0xFF00 + 0x20).unwrap_or(c)
        } else if c == '　' {
            ' ' // 全角スペース → 半角スペース
        } else {
            c
        }
    }

    /// ファイルを開く
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<FileHandle> {
        let handle = self.store.open(path)?;
        self.files_changed();
        Ok(handle)
    }

    /// バイト列から読み込み
    pub fn load_bytes(&mut self, id: &str, data: &[u8]) -> Result<FileHandle, BufferError> {
        let handle = self.store.load(id, data)?;
        self.files_changed();
        Ok(handle)
    }

    /// ファイル構成が変わったら古い比較結果は使えない
    fn files_changed(&mut self) {
        self.result = None;
        self.clamp_cursor();
    }

    /// 終了すべきかどうか
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn store(&self) -> &FileStore {
        &self.store
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// ステータスメッセージを設定
    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// 直近の比較結果
    pub fn differences(&self) -> Option<&DifferenceSet> {
        self.result.as_ref().map(|r| &r.diffs)
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.result.as_ref().map(|r| &r.projection)
    }

    /// フォーカス中のファイル
    fn focused(&self) -> Option<&FileHandle> {
        self.store.handle_at(self.focus)
    }

    /// フォーカス中のファイルサイズ
    fn focused_len(&self) -> usize {
        self.store.document_at(self.focus).map_or(0, |d| d.len())
    }

    /// 表示可能行数を設定
    pub fn set_visible_rows(&mut self, rows: usize) {
        self.visible_rows = rows.max(1);
    }

    /// カーソルをフォーカス中のファイル内に収める
    fn clamp_cursor(&mut self) {
        self.cursor = self.cursor.min(self.focused_len().saturating_sub(1));
        self.ensure_cursor_visible();
    }

    /// カーソルを上に移動
    fn cursor_up(&mut self) {
        if self.cursor >= BYTES_PER_LINE {
            self.cursor -= BYTES_PER_LINE;
            self.ensure_cursor_visible();
        }
    }

    /// カーソルを下に移動
    fn cursor_down(&mut self) {
        let new_pos = self.cursor + BYTES_PER_LINE;
        if new_pos < self.focused_len() {
            self.cursor = new_pos;
            self.ensure_cursor_visible();
        }
    }

    /// カーソルを左に移動
    fn cursor_left(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.ensure_cursor_visible();
        }
    }

    /// カーソルを右に移動
    fn cursor_right(&mut self) {
        if self.cursor + 1 < self.focused_len() {
            self.cursor += 1;
            self.ensure_cursor_visible();
        }
    }

    /// カーソル位置が表示範囲内になるようにスクロール
    fn ensure_cursor_visible(&mut self) {
        let cursor_line = self.cursor / BYTES_PER_LINE;

        if cursor_line < self.top_line {
            self.top_line = cursor_line;
        } else if cursor_line >= self.top_line + self.visible_rows {
            self.top_line = cursor_line + 1 - self.visible_rows;
        }
    }

    /// ページアップ
    fn page_up(&mut self) {
        let page_size = self.visible_rows * BYTES_PER_LINE;
        self.cursor = self.cursor.saturating_sub(page_size);
        self.top_line = self.top_line.saturating_sub(self.visible_rows);
        self.ensure_cursor_visible();
    }

    /// ページダウン
    fn page_down(&mut self) {
        let page_size = self.visible_rows * BYTES_PER_LINE;
        let max_pos = self.focused_len().saturating_sub(1);
        self.cursor = (self.cursor + page_size).min(max_pos);
        self.top_line += self.visible_rows;
        self.ensure_cursor_visible();
        let last_line = max_pos / BYTES_PER_LINE;
        self.top_line = self
            .top_line
            .min((last_line + 1).saturating_sub(self.visible_rows));
    }

    /// 行頭に移動
    fn cursor_home(&mut self) {
        self.cursor = (self.cursor / BYTES_PER_LINE) * BYTES_PER_LINE;
    }

    /// 行末に移動
    fn cursor_end(&mut self) {
        let row_start = (self.cursor / BYTES_PER_LINE) * BYTES_PER_LINE;
        let row_end = (row_start + BYTES_PER_LINE).min(self.focused_len());
        self.cursor = row_end.saturating_sub(1).max(row_start);
    }

    /// フォーカスを移動
    fn move_focus(&mut self, forward: bool) {
        let count = self.store.len();
        if count == 0 {
            return;
        }
        self.focus = if forward {
            (self.focus + 1) % count
        } else {
            (self.focus + count - 1) % count
        };
        self.input_state = InputState::Normal;
        self.clamp_cursor();
    }

    /// HEX入力処理（2桁そろった時点で書き込む）
    fn input_hex(&mut self, ch: char) {
        if self.render_mode != RenderMode::Edit {
            self.status_message = Some("View mode (F2 to edit)".to_string());
            return;
        }
        let ch = Self::normalize_fullwidth(ch);

        match self.input_state {
            InputState::Normal => {
                self.input_state = InputState::HexFirstDigit(ch);
            }
            InputState::HexFirstDigit(first) => {
                self.input_state = InputState::Normal;
                let text: String = [first, ch].iter().collect();
                let Some(id) = self.focused().map(|h| h.id().to_string()) else {
                    return;
                };
                // 不正なHEX文字列は黙って無視する
                match self.store.apply_hex_edit(&id, self.cursor, &text) {
                    Ok(true) => self.cursor_right(),
                    Ok(false) => debug!(text, "ignored invalid hex input"),
                    Err(e) => self.status_message = Some(e.to_string()),
                }
            }
        }
    }

    /// 比較を実行
    fn compare(&mut self, mode: CompareMode) {
        match self.store.compare(mode) {
            Ok(diffs) => {
                let projection = project(
                    &diffs,
                    self.store.documents().map(|(h, d)| (h.id(), d.len())),
                );
                self.status_message = Some(format!(
                    "{} compare finished: {} differences",
                    mode,
                    diffs.len()
                ));
                self.result = Some(CompareResult {
                    mode,
                    diffs,
                    projection,
                });
            }
            Err(e) => {
                warn!(error = %e, "compare rejected");
                self.status_message = Some(e.to_string());
            }
        }
    }

    /// 次/前の差異へ移動
    fn jump_to_diff(&mut self, forward: bool) {
        let Some(result) = &self.result else {
            self.status_message = Some("Not compared yet".to_string());
            return;
        };
        // フォーカス中のファイルに存在する位置だけが移動先になる
        let len = self.focused_len();
        let target = if !forward {
            result.diffs.prev_before(self.cursor)
        } else if self.cursor < len {
            result.diffs.range(self.cursor + 1..len).next()
        } else {
            None
        };
        match target {
            Some(offset) => {
                self.cursor = offset;
                self.ensure_cursor_visible();
                self.status_message = Some(format!("Difference at {:08X}", offset));
            }
            None => {
                self.status_message = Some("No more differences".to_string());
            }
        }
    }

    /// 全ファイルを閉じる
    fn clear_all(&mut self) {
        self.store.clear();
        self.result = None;
        self.focus = 0;
        self.cursor = 0;
        self.top_line = 0;
        self.render_mode = RenderMode::View;
        self.input_state = InputState::Normal;
        self.status_message = Some("Cleared all files".to_string());
    }

    /// アクションを実行
    pub fn execute(&mut self, action: Action) {
        // ステータスメッセージをクリア（一部のアクションを除く）
        if !matches!(action, Action::EnterCtrlX) {
            self.status_message = None;
        }
        // HEX入力以外の操作で入力途中の桁は破棄
        if !matches!(action, Action::InputHex(_) | Action::EnterCtrlX) {
            self.input_state = InputState::Normal;
        }

        match action {
            Action::Quit => self.should_quit = true,
            // カーソル移動
            Action::CursorUp => self.cursor_up(),
            Action::CursorDown => self.cursor_down(),
            Action::CursorLeft => self.cursor_left(),
            Action::CursorRight => self.cursor_right(),
            Action::CursorHome => self.cursor_home(),
            Action::CursorEnd => self.cursor_end(),
            Action::PageUp => self.page_up(),
            Action::PageDown => self.page_down(),
            Action::GotoBeginning => {
                self.cursor = 0;
                self.top_line = 0;
            }
            Action::GotoEnd => {
                self.cursor = self.focused_len().saturating_sub(1);
                self.ensure_cursor_visible();
            }
            Action::StartGoto => {
                self.prompt_mode = PromptMode::GotoAddress;
                self.prompt_input.clear();
            }
            // ペイン切替
            Action::NextPane => self.move_focus(true),
            Action::PrevPane => self.move_focus(false),
            // 入力
            Action::InputHex(ch) => self.input_hex(ch),
            Action::ToggleRenderMode => {
                self.render_mode = self.render_mode.toggle();
                self.status_message = Some(match self.render_mode {
                    RenderMode::Edit => "Edit mode enabled".to_string(),
                    RenderMode::View => "Edit mode disabled".to_string(),
                });
            }
            // 比較
            Action::Compare(mode) => self.compare(mode),
            Action::CompareDefault => self.compare(self.config.default_mode),
            Action::NextDiff => self.jump_to_diff(true),
            Action::PrevDiff => self.jump_to_diff(false),
            // ファイル
            Action::OpenFile => {
                self.prompt_mode = PromptMode::OpenFile;
                self.prompt_input.clear();
            }
            Action::ClearAll => self.clear_all(),
            // プレフィックスキー
            Action::EnterCtrlX => {
                self.prefix_key = PrefixKey::CtrlX;
                self.status_message = Some("C-x-".to_string());
            }
            Action::Cancel => {
                self.prefix_key = PrefixKey::None;
                self.status_message = Some("Quit".to_string());
            }
            Action::None => {}
        }
    }

    /// イベントを処理
    pub fn handle_event(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))? {
            match event::read()? {
                // ペーストイベント（Bracketed Paste Mode）
                Event::Paste(content) => {
                    if self.prompt_mode != PromptMode::Off {
                        self.prompt_input.push_str(content.trim_end_matches(['\r', '\n']));
                    }
                }
                // キーイベント
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        return Ok(());
                    }
                    self.handle_key(key);
                }
                // その他のイベントは無視
                _ => {}
            }
        }
        Ok(())
    }

    /// キー入力を処理
    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
        // プロンプトモード中は特別な処理
        if self.prompt_mode != PromptMode::Off {
            self.handle_prompt_key(key);
            return;
        }

        let mods = KeyMod {
            ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
            shift: key.modifiers.contains(KeyModifiers::SHIFT),
            alt: key.modifiers.contains(KeyModifiers::ALT),
        };

        // プレフィックスキー状態に応じて処理を分岐
        let action = match self.prefix_key {
            PrefixKey::None => Action::from_key(key.code, mods),
            PrefixKey::CtrlX => {
                self.prefix_key = PrefixKey::None; // プレフィックス状態をリセット
                Action::from_key_after_ctrl_x(key.code, mods)
            }
        };

        if action != Action::None {
            self.execute(action);
        } else if let KeyCode::Char(ch) = key.code {
            // 修飾キーがなければHEX入力
            if !mods.ctrl && !mods.alt {
                self.execute(Action::InputHex(ch));
            }
        }
    }

    /// プロンプトモード中のキー処理
    fn handle_prompt_key(&mut self, key: crossterm::event::KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            // Escape / C-g: キャンセル
            KeyCode::Esc => self.cancel_prompt(),
            KeyCode::Char('g') if ctrl => self.cancel_prompt(),
            // Enter: 確定
            KeyCode::Enter => self.execute_prompt(),
            KeyCode::Backspace => {
                self.prompt_input.pop();
            }
            // 文字入力
            KeyCode::Char(ch) if !ctrl => {
                self.prompt_input.push(ch);
            }
            _ => {}
        }
    }

    fn cancel_prompt(&mut self) {
        self.prompt_mode = PromptMode::Off;
        self.status_message = Some("Cancelled".to_string());
    }

    /// プロンプト入力を実行
    fn execute_prompt(&mut self) {
        let input = std::mem::take(&mut self.prompt_input);
        let mode = self.prompt_mode;
        self.prompt_mode = PromptMode::Off;

        match mode {
            PromptMode::GotoAddress => self.goto_address(&input),
            PromptMode::OpenFile => self.open_file(&input),
            PromptMode::Off => {}
        }
    }

    /// アドレス文字列をパース
    fn parse_address(input: &str) -> Option<usize> {
        // 0x プレフィックスまたは h サフィックスで16進数
        if let Some(hex) = input.strip_prefix("0x").or_else(|| input.strip_prefix("0X")) {
            usize::from_str_radix(hex, 16).ok()
        } else if let Some(hex) = input.strip_suffix(['h', 'H']) {
            usize::from_str_radix(hex, 16).ok()
        } else if input.chars().all(|c| c.is_ascii_hexdigit())
            && input.chars().any(|c| c.is_ascii_alphabetic())
        {
            // A-Fを含む場合は16進数として解釈
            usize::from_str_radix(input, 16).ok()
        } else {
            // 10進数
            input.parse().ok()
        }
    }

    /// アドレスにジャンプ
    fn goto_address(&mut self, input: &str) {
        let input = input.trim();
        if input.is_empty() {
            self.status_message = Some("No address".to_string());
            return;
        }

        match Self::parse_address(input) {
            Some(addr) if addr < self.focused_len() => {
                self.cursor = addr;
                self.ensure_cursor_visible();
                self.status_message = Some(format!("Jumped to {:08X}", addr));
            }
            Some(addr) => {
                self.status_message = Some(format!(
                    "Address {:X} exceeds file size {:X}",
                    addr,
                    self.focused_len()
                ));
            }
            None => {
                self.status_message = Some("Invalid address".to_string());
            }
        }
    }

    /// ファイルを開く
    fn open_file(&mut self, path: &str) {
        let path = path.trim();
        if path.is_empty() {
            self.status_message = Some("No file specified".to_string());
            return;
        }

        // チルダ展開
        let expanded = match path.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(path)),
            None => PathBuf::from(path),
        };

        match self.open(&expanded) {
            Ok(handle) => {
                self.status_message = Some(format!("Opened: {}", handle.id()));
            }
            Err(e) => {
                self.status_message = Some(format!("Failed to open: {}", e));
            }
        }
    }

    /// ステータス行の内容
    fn status_line(&self) -> String {
        match self.prompt_mode {
            PromptMode::GotoAddress => return format!("Goto address: {}_", self.prompt_input),
            PromptMode::OpenFile => return format!("Open file: {}_", self.prompt_input),
            PromptMode::Off => {}
        }

        let name = self.focused().map_or("[No file]", |h| h.name());
        if let Some(ref msg) = self.status_message {
            return format!(" {} | {}", name, msg);
        }

        let compare = match &self.result {
            Some(r) => format!("{}: {} differences", r.mode, r.diffs.len()),
            None => "not compared".to_string(),
        };
        let pending = match self.input_state {
            InputState::HexFirstDigit(c) => format!(" [{}_]", c),
            InputState::Normal => String::new(),
        };
        format!(
            " {} | {:08X}/{:08X} | {}{} | {} files | {}",
            name,
            self.cursor,
            self.focused_len(),
            self.render_mode.name(),
            pending,
            self.store.len(),
            compare,
        )
    }

    /// UIを描画
    pub fn draw(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(self.config.file_list_height), // ファイル一覧
                Constraint::Min(1),                               // ペイン
                Constraint::Length(1),                            // ステータス
            ])
            .split(size);

        // 枠とヘッダー行の分を引く
        self.set_visible_rows((layout[1].height as usize).saturating_sub(3));

        frame.render_widget(
            file_table(self.store.files(), (!self.store.is_empty()).then_some(self.focus)),
            layout[0],
        );
        self.draw_panes(frame, layout[1]);

        let status_widget = Paragraph::new(self.status_line())
            .style(Style::default().bg(Color::DarkGray).fg(Color::White));
        frame.render_widget(status_widget, layout[2]);
    }

    /// ファイルごとのペインを横に並べて描画
    fn draw_panes(&self, frame: &mut Frame, area: Rect) {
        let count = self.store.len();
        if count == 0 {
            let hint = Paragraph::new(" No files. C-x C-f to open a file, C-x C-c to quit.")
                .block(Block::bordered());
            frame.render_widget(hint, area);
            return;
        }

        let areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, count as u32); count])
            .split(area);

        let pending = match self.input_state {
            InputState::HexFirstDigit(c) => Some(c),
            InputState::Normal => None,
        };

        for (i, (handle, document)) in self.store.documents().enumerate() {
            let focused = i == self.focus;
            let pane = HexPane::new(document.data())
                .title(handle.name())
                .modified(document.is_modified())
                .top_line(self.top_line)
                .cursor(focused.then_some(self.cursor))
                .pending(if focused { pending } else { None })
                .mode(self.render_mode)
                .highlight(self.projection().and_then(|p| p.file(handle.id())))
                .focused(focused);
            frame.render_widget(pane, areas[i]);
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
