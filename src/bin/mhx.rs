use std::io::{self, IsTerminal, Read, Write as _};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableBracketedPaste, DisableFocusChange, EnableBracketedPaste, EnableFocusChange},
    execute, queue,
    terminal::{
        disable_raw_mode, enable_raw_mode, BeginSynchronizedUpdate, EndSynchronizedUpdate,
        EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};

use mhx::app::App;
use mhx::config::Config;
use mhx::diff::CompareMode;
use mhx::logging;

/// 標準入力から読み込んだデータの識別子
const STDIN_ID: &str = "<stdin>";

/// Compare several binary files side by side
#[derive(Parser, Debug)]
#[command(name = "mhx")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Files to compare (the first one is the baseline)
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Use multi-baseline compare for Enter
    #[arg(short, long)]
    multi: bool,

    /// Start in edit mode
    #[arg(short, long)]
    edit: bool,

    /// Config file (default: $CONFIG_DIR/mhx/config.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write logs to this file (filter from MHX_LOG)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(ref path) = args.log_file {
        logging::init_file(path, "info")?;
    }

    let mut config = Config::load(args.config.as_deref())?;
    if args.multi {
        config.default_mode = CompareMode::Multi;
    }
    if args.edit {
        config.start_in_edit_mode = true;
    }

    // 標準入力からデータを読み込む（パイプされている場合）
    let stdin_data = if !io::stdin().is_terminal() {
        let mut data = Vec::new();
        io::stdin()
            .read_to_end(&mut data)
            .context("Failed to read stdin")?;
        Some(data)
    } else {
        None
    };

    // ターミナルの初期化
    // Alternate Screenでトラックパッドスクロールによるバッファ移動を防止
    // Bracketed Pasteでパス入力のペーストを一括取り込み
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // アプリケーションの実行
    let result = run_app(&mut terminal, args.files, config, stdin_data);

    // ターミナルの後処理
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    files: Vec<PathBuf>,
    config: Config,
    stdin_data: Option<Vec<u8>>,
) -> Result<()> {
    let mut app = App::new(config);

    // 読み込みに失敗したファイルはステータス行で知らせる
    let mut failures = Vec::new();
    for path in &files {
        if let Err(e) = app.open(path) {
            failures.push(format!("{}: {}", path.display(), e));
        }
    }
    if let Some(data) = stdin_data {
        if let Err(e) = app.load_bytes(STDIN_ID, &data) {
            failures.push(e.to_string());
        }
    }
    if !failures.is_empty() {
        app.set_status_message(format!("Failed to open {}", failures.join(", ")));
    }

    // ウィンドウタイトルを設定
    update_title(terminal.backend_mut(), &app)?;
    let mut shown = file_ids(&app);

    // メインループ
    loop {
        // Synchronized Update: 描画のちらつきを防止
        queue!(terminal.backend_mut(), BeginSynchronizedUpdate)?;
        terminal.draw(|f| app.draw(f))?;
        queue!(terminal.backend_mut(), EndSynchronizedUpdate)?;
        terminal.backend_mut().flush()?;

        app.handle_event()?;

        if app.should_quit() {
            break;
        }

        let ids = file_ids(&app);
        if ids != shown {
            shown = ids;
            update_title(terminal.backend_mut(), &app)?;
        }
    }

    Ok(())
}

/// 読み込み済みファイルの識別子（タイトル更新の判定用）
fn file_ids(app: &App) -> Vec<String> {
    app.store().files().map(|h| h.id().to_string()).collect()
}

/// ウィンドウタイトルの文字列
fn window_title(app: &App) -> String {
    let names: Vec<&str> = app.store().files().map(|h| h.name()).collect();
    if names.is_empty() {
        "mhx".to_string()
    } else {
        format!("mhx - {}", names.join(" | "))
    }
}

/// ウィンドウタイトルを更新
fn update_title(backend: &mut CrosstermBackend<io::Stdout>, app: &App) -> Result<()> {
    execute!(backend, SetTitle(window_title(app)))?;
    Ok(())
}
