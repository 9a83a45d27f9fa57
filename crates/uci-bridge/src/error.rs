use std::path::PathBuf;

/// `compute_best_move` が返すエラー。
///
/// 探索のタイムアウトや指し手なしはエラーではなく [`crate::SearchResult`] で表す。
#[derive(thiserror::Error, Debug)]
pub enum SupervisorError {
    /// 起動に失敗しており、探索を受け付けられない
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// エンジンプロセスが既に終了している（自動再起動はしない）
    #[error("engine process terminated")]
    ProcessTerminated,

    /// 別の探索が進行中
    #[error("engine is busy with another search")]
    Busy,

    #[error("search time budget must be positive")]
    InvalidBudget,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// 設定ファイルの読み込みエラー。
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// エンジンの起動失敗。`EngineSupervisor::start` ではログに出して利用不可状態になる。
#[derive(thiserror::Error, Debug)]
pub enum StartupError {
    #[error("engine binary not found (configured: {configured:?})")]
    EngineNotFound { configured: Option<PathBuf> },

    #[error("failed to spawn engine at {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine process has no {0} pipe")]
    MissingPipe(&'static str),

    #[error("failed to start output reader: {0}")]
    Reader(#[source] std::io::Error),
}
