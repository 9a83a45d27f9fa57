//! 統合テスト用の UCI エンジン。`--mode` で振る舞いを選ぶ。
//!
//! - `normal`: `score cp (34 + 手数)` の後、手数が偶数なら `bestmove e2e4`、奇数なら `bestmove e7e5`
//! - `mate`: cp 行の後に `score mate -2`、`bestmove d8h4`
//! - `malformed`: 壊れた cp 行を挟んで `bestmove g1f3`
//! - `silent`: `go` に応答しない
//! - `slow`: movetime いっぱい待ってから `bestmove`
//! - `no-handshake`: `uci` / `isready` に応答しないが探索はする
//! - `crash-after-handshake`: `readyok` を返した直後に終了する
//! - `late-first`: 最初の `go` だけ 600ms 後に `bestmove a2a3` を返し、以降は `normal` と同じ

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

const LATE_REPLY_DELAY: Duration = Duration::from_millis(600);

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Mate,
    Malformed,
    Silent,
    Slow,
    NoHandshake,
    CrashAfterHandshake,
    LateFirst,
}

fn parse_mode(args: &[String]) -> Mode {
    let value = args
        .iter()
        .position(|a| a == "--mode")
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
        .unwrap_or("normal");
    match value {
        "mate" => Mode::Mate,
        "malformed" => Mode::Malformed,
        "silent" => Mode::Silent,
        "slow" => Mode::Slow,
        "no-handshake" => Mode::NoHandshake,
        "crash-after-handshake" => Mode::CrashAfterHandshake,
        "late-first" => Mode::LateFirst,
        _ => Mode::Normal,
    }
}

fn main() -> io::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = parse_mode(&args);

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut plies = 0usize;
    let mut searches = 0usize;

    for line in stdin.lock().lines() {
        let line = line?;
        let args: Vec<&str> = line.split_whitespace().collect();
        let Some(cmd) = args.first() else {
            continue;
        };
        match *cmd {
            "uci" if mode != Mode::NoHandshake => {
                writeln!(out, "id name Scripted Engine")?;
                writeln!(out, "id author uci-bridge tests")?;
                writeln!(out, "uciok")?;
            }
            "isready" if mode != Mode::NoHandshake => {
                writeln!(out, "readyok")?;
                if mode == Mode::CrashAfterHandshake {
                    out.flush()?;
                    std::process::exit(3);
                }
            }
            "position" => {
                plies = match args.iter().position(|a| *a == "moves") {
                    Some(idx) => args.len() - idx - 1,
                    None => 0,
                };
            }
            "go" => {
                let movetime = args
                    .iter()
                    .position(|a| *a == "movetime")
                    .and_then(|i| args.get(i + 1))
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(0);
                searches += 1;
                if mode == Mode::LateFirst && searches == 1 {
                    out.flush()?;
                    thread::sleep(LATE_REPLY_DELAY);
                    writeln!(out, "info depth 1 score cp 80 pv a2a3")?;
                    writeln!(out, "bestmove a2a3")?;
                } else {
                    respond_to_go(&mut out, mode, plies, movetime)?;
                }
            }
            "quit" => break,
            _ => {}
        }
        out.flush()?;
    }
    Ok(())
}

fn respond_to_go<W: Write>(out: &mut W, mode: Mode, plies: usize, movetime: u64) -> io::Result<()> {
    match mode {
        Mode::Silent => {}
        Mode::Mate => {
            writeln!(out, "info depth 3 score cp 250 pv d8h4")?;
            writeln!(out, "info depth 4 score mate -2 pv d8h4")?;
            writeln!(out, "bestmove d8h4")?;
        }
        Mode::Malformed => {
            writeln!(out, "info depth 2 score cp 12 pv g1f3")?;
            writeln!(out, "info score cp notanumber")?;
            writeln!(out, "info score mate")?;
            writeln!(out, "bestmove g1f3")?;
        }
        Mode::Slow => {
            out.flush()?;
            thread::sleep(Duration::from_millis(movetime));
            writeln!(out, "info depth 1 score cp 1")?;
            writeln!(out, "bestmove e2e4")?;
        }
        Mode::Normal | Mode::NoHandshake | Mode::CrashAfterHandshake | Mode::LateFirst => {
            writeln!(out, "info depth 1 seldepth 1 score cp {} nodes 20 pv e2e4", 34 + plies)?;
            let mv = if plies % 2 == 0 { "e2e4" } else { "e7e5" };
            writeln!(out, "bestmove {mv} ponder e7e5")?;
        }
    }
    Ok(())
}
