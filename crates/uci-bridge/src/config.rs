//! スーパーバイザの設定。TOML から読み込め、全フィールドに既定値がある。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[cfg(windows)]
const ENGINE_NAMES: [&str; 1] = ["engine.exe"];
#[cfg(not(windows))]
const ENGINE_NAMES: [&str; 1] = ["engine"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorConfig {
    /// エンジンバイナリ。未指定なら実行ファイルの周辺とカレントディレクトリを探す。
    pub engine_path: Option<PathBuf>,
    /// 行プロトコルで話させるための起動引数
    pub engine_args: Vec<String>,
    /// 起動後、ハンドシェイク前に待つ時間
    pub boot_grace_ms: u64,
    /// `uciok` / `readyok` それぞれの待ち時間
    pub handshake_timeout_ms: u64,
    /// 探索時間に上乗せする待ち時間
    pub search_margin_ms: u64,
    /// `quit` 送信後に自発終了を待つ時間。過ぎたら kill する。
    pub quit_timeout_ms: u64,
    /// 指し手が得られなかったとき合法手で埋めるか
    pub fallback: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            engine_path: None,
            engine_args: vec!["--uci".to_string()],
            boot_grace_ms: 300,
            handshake_timeout_ms: 5_000,
            search_margin_ms: 10_000,
            quit_timeout_ms: 300,
            fallback: true,
        }
    }
}

impl SupervisorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn boot_grace(&self) -> Duration {
        Duration::from_millis(self.boot_grace_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    pub fn search_margin(&self) -> Duration {
        Duration::from_millis(self.search_margin_ms)
    }

    pub fn quit_timeout(&self) -> Duration {
        Duration::from_millis(self.quit_timeout_ms)
    }

    /// 起動するバイナリを決める。見つからなければ `None`。
    pub fn resolve_engine_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.engine_path {
            return path.is_file().then(|| path.clone());
        }
        default_search_dirs().iter().find_map(|dir| find_engine_in_dir(dir))
    }
}

/// 実行ファイルのディレクトリ、その親、カレントディレクトリの順。
fn default_search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            dirs.push(dir.to_path_buf());
            if let Some(parent) = dir.parent() {
                dirs.push(parent.to_path_buf());
            }
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    dirs
}

/// エンジンバイナリを指定ディレクトリから探す。
pub fn find_engine_in_dir(dir: &Path) -> Option<PathBuf> {
    ENGINE_NAMES.iter().map(|name| dir.join(name)).find(|candidate| candidate.is_file())
}
