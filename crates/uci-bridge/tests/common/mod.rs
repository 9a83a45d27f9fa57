//! Common helpers for supervisor integration tests

#![allow(dead_code)] // Not every test file uses every helper

use std::path::PathBuf;
use std::time::{Duration, Instant};

use uci_bridge::{EngineSupervisor, SupervisorConfig};

// Timeouts kept short so the suite stays fast, with enough slack for CI
pub const T_MOVE: Duration = Duration::from_millis(50);
pub const T_HANDSHAKE_MS: u64 = 2_000;
pub const T_MARGIN_MS: u64 = 2_000;

pub fn scripted_engine_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_scripted-engine"))
}

/// Config for the scripted engine running in `mode`
pub fn config_for(mode: &str) -> SupervisorConfig {
    SupervisorConfig {
        engine_path: Some(scripted_engine_path()),
        engine_args: vec!["--uci".to_string(), "--mode".to_string(), mode.to_string()],
        boot_grace_ms: 0,
        handshake_timeout_ms: T_HANDSHAKE_MS,
        search_margin_ms: T_MARGIN_MS,
        quit_timeout_ms: 500,
        fallback: false,
    }
}

pub fn start(mode: &str) -> EngineSupervisor {
    EngineSupervisor::start(config_for(mode))
}

pub fn moves(list: &[&str]) -> Vec<String> {
    list.iter().map(|m| m.to_string()).collect()
}

/// Poll `cond` until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    cond()
}
