//! エンジンプロセスの寿命管理と、同期的な「この手順での最善手」呼び出し。

use std::io::{self, BufReader};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::collector::SearchResult;
use crate::config::SupervisorConfig;
use crate::demux::spawn_output_reader;
use crate::error::{StartupError, SupervisorError};
use crate::fallback::{FallbackMoves, LegalMoveFallback};
use crate::handshake::{EngineIdentity, HandshakeReport};
use crate::protocol::{CMD_QUIT, to_white_perspective};
use crate::session::EngineSession;

const ENGINE_QUIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// HTTP 層など、最善手を問い合わせる側が依存する境界。
pub trait BestMoveSource: Send + Sync {
    fn compute_best_move(
        &self,
        moves: &[String],
        budget: Duration,
    ) -> Result<SearchResult, SupervisorError>;

    fn identity(&self) -> EngineIdentity;

    fn is_alive(&self) -> bool;
}

/// 起動済みエンジン 1 本。
///
/// `session` のロックが「同時に 1 探索まで」の排他を兼ねる。`child` は生存確認が
/// 探索中でも待たされないよう別ロックにしている。
struct EngineProcess {
    child: Mutex<Child>,
    session: Mutex<EngineSession<ChildStdin>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl EngineProcess {
    fn is_alive(&self) -> bool {
        matches!(lock_or_recover(&self.child).try_wait(), Ok(None))
    }
}

/// 長寿命のエンジンプロセスを 1 本所有し、探索要求を直列化して処理する。
///
/// 起動に失敗しても panic やエラーにはせず、以降の呼び出しが
/// [`SupervisorError::Unavailable`] を返す状態になる。プロセスが途中で落ちても
/// 自動再起動はしない。
pub struct EngineSupervisor {
    config: SupervisorConfig,
    engine: Result<EngineProcess, String>,
    handshake: HandshakeReport,
    fallback: Option<Box<dyn FallbackMoves>>,
    shut_down: AtomicBool,
}

impl EngineSupervisor {
    /// 起動してハンドシェイクまで行う。失敗はログに出し、利用不可状態で返す。
    pub fn start(config: SupervisorConfig) -> Self {
        match Self::try_start(config.clone()) {
            Ok(supervisor) => supervisor,
            Err(e) => {
                log::error!("engine startup failed: {e}");
                Self::unavailable(config, e.to_string())
            }
        }
    }

    /// [`Self::start`] と同じだが、起動失敗をそのまま返す。
    pub fn try_start(config: SupervisorConfig) -> Result<Self, StartupError> {
        let path = config.resolve_engine_path().ok_or_else(|| StartupError::EngineNotFound {
            configured: config.engine_path.clone(),
        })?;
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "engine".to_string());

        let mut child = Command::new(&path)
            .args(&config.engine_args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| StartupError::Spawn {
                path: path.clone(),
                source,
            })?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            (stdin, _) => {
                reap(&mut child);
                let missing = if stdin.is_none() { "stdin" } else { "stdout" };
                return Err(StartupError::MissingPipe(missing));
            }
        };
        let (rx, reader) = match spawn_output_reader(BufReader::new(stdout), &label) {
            Ok(pair) => pair,
            Err(e) => {
                reap(&mut child);
                return Err(StartupError::Reader(e));
            }
        };
        log::info!("spawned engine {} (pid {})", path.display(), child.id());

        thread::sleep(config.boot_grace());

        let mut session = EngineSession::new(stdin, rx);
        let handshake = match session.handshake(config.handshake_timeout()) {
            Ok(report) => report,
            Err(e) => {
                log::warn!("handshake could not be sent: {e}");
                HandshakeReport::default()
            }
        };
        if handshake.completed() {
            log::info!(
                "handshake completed: {}",
                handshake.identity.name.as_deref().unwrap_or("(unnamed engine)")
            );
        } else {
            log::warn!("handshake incomplete, continuing in degraded mode");
        }

        let fallback = config
            .fallback
            .then(|| Box::new(LegalMoveFallback) as Box<dyn FallbackMoves>);

        Ok(Self {
            config,
            engine: Ok(EngineProcess {
                child: Mutex::new(child),
                session: Mutex::new(session),
                reader: Mutex::new(Some(reader)),
            }),
            handshake,
            fallback,
            shut_down: AtomicBool::new(false),
        })
    }

    fn unavailable(config: SupervisorConfig, reason: String) -> Self {
        Self {
            config,
            engine: Err(reason),
            handshake: HandshakeReport::default(),
            fallback: None,
            shut_down: AtomicBool::new(false),
        }
    }

    /// フォールバック手生成を差し替える。
    pub fn with_fallback<F: FallbackMoves + 'static>(mut self, fallback: F) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn handshake(&self) -> &HandshakeReport {
        &self.handshake
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_ok() && !self.shut_down.load(Ordering::Acquire)
    }

    fn engine(&self) -> Result<&EngineProcess, SupervisorError> {
        if self.shut_down.load(Ordering::Acquire) {
            return Err(SupervisorError::Unavailable("supervisor has been shut down".into()));
        }
        self.engine.as_ref().map_err(|reason| SupervisorError::Unavailable(reason.clone()))
    }

    /// 手順 `moves`（初期局面から）で `budget` だけ考えさせ、最善手と評価値を返す。
    ///
    /// 評価値は白番側から見たポーン単位。
    /// 期限切れや指し手なしはエラーにしない。フォールバックが有効なら合法手で埋め、
    /// `fallback` を立てる。別の探索が進行中なら待たずに [`SupervisorError::Busy`]。
    pub fn compute_best_move(
        &self,
        moves: &[String],
        budget: Duration,
    ) -> Result<SearchResult, SupervisorError> {
        if budget.is_zero() {
            return Err(SupervisorError::InvalidBudget);
        }
        let engine = self.engine()?;
        let mut session = match engine.session.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(SupervisorError::Busy),
            Err(TryLockError::Poisoned(poisoned)) => {
                log::warn!("engine session lock poisoned, recovering");
                poisoned.into_inner()
            }
        };
        if !engine.is_alive() {
            return Err(SupervisorError::ProcessTerminated);
        }

        log::debug!("search: {} plies, budget {}ms", moves.len(), budget.as_millis());
        let mut result = session
            .search(moves, budget, self.config.search_margin())
            .map_err(|e| {
                if e.kind() == io::ErrorKind::BrokenPipe || !engine.is_alive() {
                    SupervisorError::ProcessTerminated
                } else {
                    SupervisorError::Io(e)
                }
            })?;
        drop(session);

        result.eval = to_white_perspective(result.eval, moves.len());
        if result.best_move.is_none() {
            self.apply_fallback(moves, &mut result);
        }
        log::info!(
            "bestmove {} eval {:.2} ({}ms{})",
            result.best_move.as_deref().unwrap_or("(none)"),
            result.eval,
            result.elapsed_ms,
            if result.fallback { ", fallback" } else { "" }
        );
        Ok(result)
    }

    fn apply_fallback(&self, moves: &[String], result: &mut SearchResult) {
        let Some(fallback) = &self.fallback else {
            return;
        };
        match fallback.fallback_move(moves) {
            Some(mv) => {
                log::warn!("engine gave no move, substituting fallback move {mv}");
                result.best_move = Some(mv);
                result.fallback = true;
            }
            None => log::warn!("engine gave no move and no fallback move is available"),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.engine().map(EngineProcess::is_alive).unwrap_or(false)
    }

    pub fn identity(&self) -> EngineIdentity {
        self.handshake.identity.clone()
    }

    /// `quit` を送り、一定時間内に終わらなければ kill する。2 回目以降は何もしない。
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }
        let Ok(engine) = &self.engine else {
            return;
        };

        // 探索中なら quit は送らず、待ち時間の後に kill する
        if let Ok(mut session) = engine.session.try_lock() {
            if let Err(e) = session.write_line(CMD_QUIT) {
                log::debug!("failed to send quit: {e}");
            }
        }

        let mut child = lock_or_recover(&engine.child);
        let deadline = Instant::now() + self.config.quit_timeout();
        let mut exited = false;
        while Instant::now() < deadline {
            if let Ok(Some(status)) = child.try_wait() {
                log::info!("engine exited: {status}");
                exited = true;
                break;
            }
            thread::sleep(ENGINE_QUIT_POLL_INTERVAL);
        }
        if !exited {
            log::warn!("engine did not exit after quit, killing");
            reap(&mut child);
        }
        drop(child);

        // プロセスが終わっていれば stdout は EOF になり、読み取りスレッドも終わる
        if let Some(handle) = lock_or_recover(&engine.reader).take() {
            if handle.join().is_err() {
                log::warn!("engine output reader panicked");
            }
        }
    }
}

impl BestMoveSource for EngineSupervisor {
    fn compute_best_move(
        &self,
        moves: &[String],
        budget: Duration,
    ) -> Result<SearchResult, SupervisorError> {
        EngineSupervisor::compute_best_move(self, moves, budget)
    }

    fn identity(&self) -> EngineIdentity {
        EngineSupervisor::identity(self)
    }

    fn is_alive(&self) -> bool {
        EngineSupervisor::is_alive(self)
    }
}

impl Drop for EngineSupervisor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
