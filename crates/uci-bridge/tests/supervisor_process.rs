//! Supervisor tests against a real child process (`scripted-engine`)

mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{T_MOVE, config_for, moves, start, wait_until};
use uci_bridge::{EngineSupervisor, MATE_SCORE_PAWNS, Score, SupervisorConfig, SupervisorError};

#[test]
fn handshake_captures_engine_identity() {
    let sup = start("normal");
    assert!(sup.is_available());
    assert!(sup.is_alive());
    assert!(sup.handshake().completed());
    let id = sup.identity();
    assert_eq!(id.name.as_deref(), Some("Scripted Engine"));
    assert_eq!(id.author.as_deref(), Some("uci-bridge tests"));
}

#[test]
fn best_move_from_initial_position() {
    let sup = start("normal");
    let res = sup.compute_best_move(&[], T_MOVE).unwrap();
    assert_eq!(res.best_move.as_deref(), Some("e2e4"));
    assert_eq!(res.ponder.as_deref(), Some("e7e5"));
    assert_eq!(res.eval, 0.34);
    assert!(!res.timed_out);
    assert!(!res.fallback);
}

#[test]
fn full_history_reaches_engine_on_every_call() {
    let sup = start("normal");
    let history = moves(&["e2e4", "e7e5", "g1f3"]);
    // scripted-engine reports `34 + plies` centipawns, so eval proves the move count
    for _ in 0..3 {
        let res = sup.compute_best_move(&history, T_MOVE).unwrap();
        assert_eq!(res.best_move.as_deref(), Some("e7e5"));
        assert_eq!(res.score, Some(Score::Centipawns(37)));
    }
    let res = sup.compute_best_move(&history[..2], T_MOVE).unwrap();
    assert_eq!(res.best_move.as_deref(), Some("e2e4"));
    assert_eq!(res.score, Some(Score::Centipawns(36)));
}

#[test]
fn eval_is_reported_from_white_side() {
    let sup = start("normal");
    // 黒番: エンジンの cp 35 は黒から見た値
    let res = sup.compute_best_move(&moves(&["e2e4"]), T_MOVE).unwrap();
    assert_eq!(res.score, Some(Score::Centipawns(35)));
    assert_eq!(res.eval, -0.35);
    let res = sup.compute_best_move(&moves(&["e2e4", "e7e5"]), T_MOVE).unwrap();
    assert_eq!(res.eval, 0.36);
}

#[test]
fn late_reply_is_not_returned_for_next_search() {
    let mut cfg = config_for("late-first");
    cfg.search_margin_ms = 400;
    let sup = EngineSupervisor::start(cfg);

    // 1 回目は 450ms で期限切れ、エンジンは 600ms 付近で a2a3 を返す
    let first = sup.compute_best_move(&[], T_MOVE).unwrap();
    assert!(first.timed_out);
    assert_eq!(first.best_move, None);

    let second = sup.compute_best_move(&moves(&["e2e4"]), T_MOVE).unwrap();
    assert!(!second.timed_out);
    assert_eq!(second.best_move.as_deref(), Some("e7e5"));
    assert_eq!(second.eval, -0.35);
}

#[test]
fn mate_score_overrides_centipawns() {
    let sup = start("mate");
    let res = sup.compute_best_move(&moves(&["e2e4", "e7e5"]), T_MOVE).unwrap();
    assert_eq!(res.best_move.as_deref(), Some("d8h4"));
    assert_eq!(res.eval, -MATE_SCORE_PAWNS);
}

#[test]
fn malformed_info_lines_are_ignored() {
    let sup = start("malformed");
    let res = sup.compute_best_move(&[], T_MOVE).unwrap();
    assert_eq!(res.best_move.as_deref(), Some("g1f3"));
    assert_eq!(res.eval, 0.12);
}

#[test]
fn silent_engine_times_out_without_error() {
    let mut cfg = config_for("silent");
    cfg.search_margin_ms = 100;
    let sup = EngineSupervisor::start(cfg);
    let start = Instant::now();
    let res = sup.compute_best_move(&[], T_MOVE).unwrap();
    assert!(start.elapsed() >= Duration::from_millis(150));
    assert!(res.timed_out);
    assert_eq!(res.best_move, None);
    assert_eq!(res.eval, 0.0);
}

#[test]
fn silent_engine_gets_fallback_move_for_actual_position() {
    let mut cfg = config_for("silent");
    cfg.search_margin_ms = 50;
    cfg.fallback = true;
    let sup = EngineSupervisor::start(cfg);
    let history = moves(&["f2f3", "e7e5", "g2g4"]);
    let res = sup.compute_best_move(&history, T_MOVE).unwrap();
    assert!(res.fallback);
    let mv = res.best_move.unwrap();
    let legal = uci_bridge::LegalMoveFallback::legal_moves(&history).unwrap();
    assert!(legal.contains(&mv), "{mv} is not legal here");
}

#[test]
fn missing_handshake_is_not_fatal() {
    let mut cfg = config_for("no-handshake");
    cfg.handshake_timeout_ms = 100;
    let sup = EngineSupervisor::start(cfg);
    assert!(sup.is_available());
    assert!(!sup.handshake().completed());
    let res = sup.compute_best_move(&[], T_MOVE).unwrap();
    assert_eq!(res.best_move.as_deref(), Some("e2e4"));
}

#[test]
fn terminated_engine_fails_the_call() {
    let sup = start("crash-after-handshake");
    assert!(wait_until(Duration::from_secs(5), || !sup.is_alive()));
    let err = sup.compute_best_move(&[], T_MOVE).unwrap_err();
    assert!(matches!(err, SupervisorError::ProcessTerminated), "{err}");
    // no respawn: subsequent calls keep failing
    let err = sup.compute_best_move(&[], T_MOVE).unwrap_err();
    assert!(matches!(err, SupervisorError::ProcessTerminated));
}

#[test]
fn concurrent_search_is_rejected_as_busy() {
    let sup = Arc::new(start("slow"));
    let worker = {
        let sup = Arc::clone(&sup);
        thread::spawn(move || sup.compute_best_move(&[], Duration::from_millis(500)))
    };
    // give the first caller time to take the slot
    thread::sleep(Duration::from_millis(100));
    let err = sup.compute_best_move(&[], T_MOVE).unwrap_err();
    assert!(matches!(err, SupervisorError::Busy));

    let first = worker.join().unwrap().unwrap();
    assert_eq!(first.best_move.as_deref(), Some("e2e4"));
    // slot is free again
    assert!(sup.compute_best_move(&[], Duration::from_millis(10)).is_ok());
}

#[test]
fn shutdown_stops_the_process() {
    let sup = start("normal");
    assert!(sup.is_alive());
    sup.shutdown();
    assert!(!sup.is_alive());
    let err = sup.compute_best_move(&[], T_MOVE).unwrap_err();
    assert!(matches!(err, SupervisorError::Unavailable(_)));
}

#[test]
fn config_file_round_trip_starts_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bridge.toml");
    let cfg = config_for("normal");
    std::fs::write(&path, toml_for(&cfg)).unwrap();
    let loaded = SupervisorConfig::load(&path).unwrap();
    assert_eq!(loaded, cfg);
    let sup = EngineSupervisor::start(loaded);
    assert!(sup.compute_best_move(&[], T_MOVE).unwrap().best_move.is_some());
}

fn toml_for(cfg: &SupervisorConfig) -> String {
    let path = cfg.engine_path.as_ref().unwrap().display().to_string();
    format!(
        "engine_path = {path:?}\nengine_args = {args:?}\nboot_grace_ms = {}\nhandshake_timeout_ms = {}\nsearch_margin_ms = {}\nquit_timeout_ms = {}\nfallback = {}\n",
        cfg.boot_grace_ms,
        cfg.handshake_timeout_ms,
        cfg.search_margin_ms,
        cfg.quit_timeout_ms,
        cfg.fallback,
        args = cfg.engine_args,
    )
}
