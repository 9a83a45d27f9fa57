//! 起動直後に一度だけ行う `uci` / `isready` ハンドシェイク。
//!
//! タイムアウトしても失敗にはしない。警告を出して先へ進み、以降の探索が
//! 成功するかどうかはエンジン次第とする。

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde::Serialize;

use crate::line_channel::LineWriter;
use crate::protocol::{CMD_ISREADY, CMD_UCI, IdLine, TOKEN_READYOK, TOKEN_UCIOK, parse_id};

/// `id name` / `id author` で名乗られた情報。
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EngineIdentity {
    pub name: Option<String>,
    pub author: Option<String>,
}

impl EngineIdentity {
    fn observe(&mut self, line: &str) {
        match parse_id(line) {
            Some(IdLine::Name(name)) => self.name = Some(name),
            Some(IdLine::Author(author)) => self.author = Some(author),
            None => {}
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HandshakeReport {
    pub uciok: bool,
    pub readyok: bool,
    pub identity: EngineIdentity,
}

impl HandshakeReport {
    pub fn completed(&self) -> bool {
        self.uciok && self.readyok
    }
}

/// `token` を含む行が届くまで待つ。期限切れか送信側の切断で `false`。
///
/// 途中で読んだ行は消費される（キューに戻さない）。
pub fn wait_for_token(rx: &Receiver<String>, token: &str, timeout: Duration) -> bool {
    wait_for_token_with(rx, token, timeout, |_| {})
}

/// [`wait_for_token`] と同じだが、消費した各行を `observer` に渡す。
pub fn wait_for_token_with<F>(
    rx: &Receiver<String>,
    token: &str,
    timeout: Duration,
    mut observer: F,
) -> bool
where
    F: FnMut(&str),
{
    let deadline = Instant::now() + timeout;
    loop {
        match rx.recv_deadline(deadline) {
            Ok(line) => {
                observer(&line);
                if line.contains(token) {
                    return true;
                }
            }
            Err(RecvTimeoutError::Timeout) => return false,
            Err(RecvTimeoutError::Disconnected) => {
                log::debug!("engine output closed while waiting for '{token}'");
                return false;
            }
        }
    }
}

/// ハンドシェイクを実行する。書き込みエラー（プロセス終了など）だけを返す。
pub fn run_handshake<W: Write>(
    writer: &mut LineWriter<W>,
    rx: &Receiver<String>,
    timeout: Duration,
) -> io::Result<HandshakeReport> {
    let mut report = HandshakeReport::default();

    writer.write_line(CMD_UCI)?;
    let identity = &mut report.identity;
    report.uciok = wait_for_token_with(rx, TOKEN_UCIOK, timeout, |line| identity.observe(line));
    if !report.uciok {
        log::warn!("did not receive '{TOKEN_UCIOK}' within {}ms", timeout.as_millis());
    }

    writer.write_line(CMD_ISREADY)?;
    report.readyok = wait_for_token(rx, TOKEN_READYOK, timeout);
    if !report.readyok {
        log::warn!("did not receive '{TOKEN_READYOK}' within {}ms", timeout.as_millis());
    }

    Ok(report)
}
