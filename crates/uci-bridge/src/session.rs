//! エンジン 1 本分の書き込み側と受信キューの組。プロセスの寿命管理は持たない。

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;

use crate::collector::{SearchResult, collect_search_result_after};
use crate::handshake::{HandshakeReport, run_handshake};
use crate::line_channel::LineWriter;
use crate::protocol::{go_movetime_command, parse_bestmove, position_command};

pub struct EngineSession<W: Write> {
    writer: LineWriter<W>,
    rx: Receiver<String>,
    /// 期限切れで `bestmove` を受け取れなかった `go` の数。
    /// エンジンはいずれそれらに応答するので、その分の `bestmove` は次以降の探索で捨てる。
    unanswered_go: usize,
}

impl<W: Write> EngineSession<W> {
    pub fn new(writer: W, rx: Receiver<String>) -> Self {
        Self {
            writer: LineWriter::new(writer),
            rx,
            unanswered_go: 0,
        }
    }

    pub fn handshake(&mut self, timeout: Duration) -> io::Result<HandshakeReport> {
        run_handshake(&mut self.writer, &self.rx, timeout)
    }

    /// キューに残っている行を捨てる。前回タイムアウトした探索の遅れた
    /// `bestmove` を次の呼び出しが拾わないようにする。
    pub fn discard_pending(&mut self) -> usize {
        let mut discarded = 0;
        for line in self.rx.try_iter() {
            log::debug!("discarding stale engine output: {line}");
            if self.unanswered_go > 0 && parse_bestmove(&line).is_some() {
                self.unanswered_go -= 1;
            }
            discarded += 1;
        }
        discarded
    }

    /// まだ `bestmove` が届いていない期限切れの `go` の数。
    pub fn unanswered_searches(&self) -> usize {
        self.unanswered_go
    }

    /// 局面と探索開始を送り、`budget + margin` を期限として結果を集める。
    ///
    /// 新しい `go` の後に届いた遅れた `bestmove` も、未応答の `go` の数だけ読み飛ばす。
    pub fn search(
        &mut self,
        moves: &[String],
        budget: Duration,
        margin: Duration,
    ) -> io::Result<SearchResult> {
        self.discard_pending();
        self.writer.write_line(&position_command(moves))?;
        self.writer.write_line(&go_movetime_command(budget))?;
        let deadline = Instant::now() + budget + margin;
        let result = collect_search_result_after(&self.rx, deadline, &mut self.unanswered_go);
        if result.timed_out {
            self.unanswered_go += 1;
        }
        Ok(result)
    }

    pub fn write_line(&mut self, msg: &str) -> io::Result<()> {
        self.writer.write_line(msg)
    }

    pub fn writer(&self) -> &W {
        self.writer.get_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{Sender, unbounded};
    use std::collections::VecDeque;

    const MARGIN: Duration = Duration::from_millis(50);

    /// `go` 行が flush されたら用意した応答をキューに流す書き込み先。
    struct RespondOnGo {
        buf: Vec<u8>,
        tx: Sender<String>,
        replies: Vec<&'static str>,
    }

    impl Write for RespondOnGo {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            let text = String::from_utf8_lossy(&self.buf);
            if text.lines().last().is_some_and(|l| l.starts_with("go ")) {
                for reply in &self.replies {
                    let _ = self.tx.send(reply.to_string());
                }
            }
            Ok(())
        }
    }

    fn session() -> (EngineSession<Vec<u8>>, Sender<String>) {
        let (tx, rx) = unbounded();
        (EngineSession::new(Vec::new(), rx), tx)
    }

    fn sent(bytes: &[u8]) -> Vec<String> {
        String::from_utf8_lossy(bytes).lines().map(str::to_string).collect()
    }

    fn moves(list: &[&str]) -> Vec<String> {
        list.iter().map(|m| m.to_string()).collect()
    }

    #[test]
    fn empty_history_searches_from_startpos() {
        let (tx, rx) = unbounded();
        let writer = RespondOnGo {
            buf: Vec::new(),
            tx,
            replies: vec!["info depth 5 score cp 34 pv e2e4", "bestmove e2e4 ponder e7e5"],
        };
        let mut s = EngineSession::new(writer, rx);
        let res = s.search(&[], Duration::from_millis(100), MARGIN).unwrap();
        assert_eq!(sent(&s.writer().buf), vec!["position startpos", "go movetime 100"]);
        assert_eq!(res.best_move.as_deref(), Some("e2e4"));
        assert_eq!(res.ponder.as_deref(), Some("e7e5"));
        assert_eq!(res.eval, 0.34);
        assert!(!res.timed_out);
    }

    #[test]
    fn mate_line_yields_saturated_eval() {
        let (tx, rx) = unbounded();
        let writer = RespondOnGo {
            buf: Vec::new(),
            tx,
            replies: vec!["info score mate -2", "bestmove d8h4"],
        };
        let mut s = EngineSession::new(writer, rx);
        let res = s.search(&moves(&["e2e4", "e7e5"]), Duration::from_millis(100), MARGIN).unwrap();
        assert_eq!(
            sent(&s.writer().buf),
            vec!["position startpos moves e2e4 e7e5", "go movetime 100"]
        );
        assert_eq!(res.best_move.as_deref(), Some("d8h4"));
        assert_eq!(res.eval, -100.0);
    }

    #[test]
    fn same_history_produces_same_position_command() {
        let (mut s, _tx) = session();
        let history = moves(&["e2e4", "e7e5"]);
        let first = s.search(&history, Duration::from_millis(1), Duration::ZERO).unwrap();
        let second = s.search(&history, Duration::from_millis(1), Duration::ZERO).unwrap();
        assert!(first.timed_out && second.timed_out);
        assert_eq!(
            sent(s.writer()),
            vec![
                "position startpos moves e2e4 e7e5",
                "go movetime 1",
                "position startpos moves e2e4 e7e5",
                "go movetime 1",
            ]
        );
    }

    #[test]
    fn stale_bestmove_is_not_attributed_to_next_search() {
        let (mut s, tx) = session();
        tx.send("bestmove a2a3".into()).unwrap();
        let res = s.search(&moves(&["e2e4"]), Duration::from_millis(1), MARGIN).unwrap();
        assert_eq!(res.best_move, None);
        assert!(res.timed_out);
    }

    #[test]
    fn discard_pending_counts_lines() {
        let (mut s, tx) = session();
        for l in ["info depth 1", "bestmove e2e4"] {
            tx.send(l.into()).unwrap();
        }
        assert_eq!(s.discard_pending(), 2);
        assert_eq!(s.discard_pending(), 0);
    }

    /// `go` ごとに用意した応答の束を 1 つずつ流す書き込み先。
    struct BatchPerGo {
        buf: Vec<u8>,
        tx: Sender<String>,
        batches: VecDeque<Vec<&'static str>>,
    }

    impl Write for BatchPerGo {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            let text = String::from_utf8_lossy(&self.buf);
            if text.lines().last().is_some_and(|l| l.starts_with("go ")) {
                for reply in self.batches.pop_front().unwrap_or_default() {
                    let _ = self.tx.send(reply.to_string());
                }
            }
            Ok(())
        }
    }

    fn batch_session(
        batches: Vec<Vec<&'static str>>,
    ) -> (EngineSession<BatchPerGo>, Sender<String>) {
        let (tx, rx) = unbounded();
        let writer = BatchPerGo {
            buf: Vec::new(),
            tx: tx.clone(),
            batches: batches.into(),
        };
        (EngineSession::new(writer, rx), tx)
    }

    #[test]
    fn late_bestmove_after_next_go_is_skipped() {
        // 1 回目の go には応答せず、2 回目の go の後に 1 回目の応答が遅れて届く
        let (mut s, _tx) = batch_session(vec![
            vec![],
            vec!["info score cp 80", "bestmove a2a3", "info score cp 35", "bestmove e7e5"],
        ]);
        let first = s.search(&[], Duration::from_millis(1), MARGIN).unwrap();
        assert!(first.timed_out);
        assert_eq!(s.unanswered_searches(), 1);

        let second = s.search(&moves(&["e2e4"]), Duration::from_millis(1), MARGIN).unwrap();
        assert_eq!(second.best_move.as_deref(), Some("e7e5"));
        assert_eq!(second.eval, 0.35);
        assert!(!second.timed_out);
        assert_eq!(s.unanswered_searches(), 0);
    }

    #[test]
    fn late_bestmove_before_next_go_is_discarded_once() {
        let (mut s, tx) = batch_session(vec![vec![], vec!["info score cp 35", "bestmove e7e5"]]);
        let first = s.search(&[], Duration::from_millis(1), MARGIN).unwrap();
        assert!(first.timed_out);

        tx.send("bestmove a2a3".into()).unwrap();
        let second = s.search(&moves(&["e2e4"]), Duration::from_millis(1), MARGIN).unwrap();
        // 捨てた遅延応答で清算済みなので、2 回目の bestmove は読み飛ばさない
        assert_eq!(second.best_move.as_deref(), Some("e7e5"));
        assert_eq!(s.unanswered_searches(), 0);
    }
}
