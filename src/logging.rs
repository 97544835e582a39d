//! ログ出力の初期化
//!
//! フィルタは `MHX_LOG`（`RUST_LOG` と同じ書式）、未設定なら引数のレベル。

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// ログフィルタの環境変数
pub const LOG_ENV: &str = "MHX_LOG";

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// 標準エラーに出力（CLI用）
pub fn init_stderr(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .try_init();
}

/// ファイルに出力（TUIは端末を使うため）
pub fn init_file(path: &Path, default_level: &str) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}
