//! 設定ファイル
//!
//! コマンドラインで指定がなければ `$CONFIG_DIR/mhx/config.toml` を読む。
//! キーはすべて省略可能。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diff::CompareMode;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// mhx の設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Enter で実行する比較モード
    pub default_mode: CompareMode,
    /// 編集モードで起動
    pub start_in_edit_mode: bool,
    /// ファイル一覧の高さ（枠込み）
    pub file_list_height: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_mode: CompareMode::Pairwise,
            start_in_edit_mode: false,
            file_list_height: 6,
        }
    }
}

impl Config {
    /// 設定を読み込む（`None` なら既定の場所）
    ///
    /// 既定の場所にファイルがなければ既定値。明示したパスは存在必須。
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    /// 既定の設定ファイルパス
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("mhx").join("config.toml"))
    }
}
