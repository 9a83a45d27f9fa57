//! 長寿命の UCI チェスエンジンプロセスを監督するクライアント。
//!
//! エンジンの stdout は専用スレッド（[`demux`]）が無制限キューへ流し、
//! ハンドシェイク（[`handshake`]）と結果収集（[`collector`]）は呼び出し側の
//! スレッドでそのキューを読む。公開の入口は [`EngineSupervisor::compute_best_move`]。
//!
//! ```no_run
//! use std::time::Duration;
//! use uci_bridge::{EngineSupervisor, SupervisorConfig};
//!
//! let supervisor = EngineSupervisor::start(SupervisorConfig::default());
//! let moves = vec!["e2e4".to_string(), "e7e5".to_string()];
//! match supervisor.compute_best_move(&moves, Duration::from_millis(500)) {
//!     Ok(result) => println!("{:?} {}", result.best_move, result.eval),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

pub mod collector;
pub mod config;
pub mod demux;
pub mod error;
pub mod fallback;
pub mod handshake;
pub mod line_channel;
pub mod protocol;
pub mod session;
pub mod supervisor;

pub use collector::{
    ScoreAccumulator, SearchResult, collect_search_result, collect_search_result_after,
};
pub use config::SupervisorConfig;
pub use error::{ConfigError, StartupError, SupervisorError};
pub use fallback::{FallbackMoves, LegalMoveFallback};
pub use handshake::{EngineIdentity, HandshakeReport, wait_for_token};
pub use protocol::{MATE_SCORE_PAWNS, Score};
pub use session::EngineSession;
pub use supervisor::{BestMoveSource, EngineSupervisor};
