//! `go` 送信後の出力行を集約して 1 つの探索結果にまとめる。

use std::time::Instant;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde::Serialize;

use crate::protocol::{Score, duration_to_millis, parse_bestmove, parse_score};

/// 1 回の探索呼び出しの結果。
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SearchResult {
    /// `bestmove` の指し手。期限切れなら `None`。
    pub best_move: Option<String>,
    pub ponder: Option<String>,
    /// ポーン単位の評価値。評価行を一度も読めなければ 0.0。
    ///
    /// 収集直後は手番側から見た値。[`crate::EngineSupervisor::compute_best_move`] が
    /// 返す時点では白番側から見た値に直してある。
    pub eval: f64,
    /// 最後に読んだ生の評価（エンジンの手番側視点のまま）。
    pub score: Option<Score>,
    /// 終端行を受け取る前に期限が来た（またはエンジン出力が閉じた）。
    pub timed_out: bool,
    pub elapsed_ms: u64,
    /// 指し手がフォールバック生成によるもの。
    pub fallback: bool,
}

/// 終端行を待つ間に見た最新の評価値。上書きのみで、累積はしない。
#[derive(Clone, Copy, Debug, Default)]
pub struct ScoreAccumulator {
    last: Option<Score>,
}

impl ScoreAccumulator {
    /// 評価行なら値を差し替える。壊れた数値は無視して直前の値を残す。
    pub fn observe(&mut self, line: &str) {
        if let Some(score) = parse_score(line) {
            self.last = Some(score);
        }
    }

    pub fn score(&self) -> Option<Score> {
        self.last
    }

    pub fn eval(&self) -> f64 {
        self.last.map(Score::to_pawns).unwrap_or(0.0)
    }
}

/// `deadline` まで行を消費し、`bestmove` 行で即座に打ち切る。
///
/// 期限切れ・出力切断はエラーにせず、指し手なしの結果として返す。
pub fn collect_search_result(rx: &Receiver<String>, deadline: Instant) -> SearchResult {
    collect_search_result_after(rx, deadline, &mut 0)
}

/// [`collect_search_result`] と同じだが、最初の `stale_bestmoves` 個の `bestmove` は
/// 期限切れになった前の探索への遅れた応答として読み飛ばす。
///
/// 読み飛ばすたびに `stale_bestmoves` を減らし、それまでに見た評価値も捨てる。
pub fn collect_search_result_after(
    rx: &Receiver<String>,
    deadline: Instant,
    stale_bestmoves: &mut usize,
) -> SearchResult {
    let start = Instant::now();
    let mut acc = ScoreAccumulator::default();

    loop {
        match rx.recv_deadline(deadline) {
            Ok(line) => {
                if let Some(best) = parse_bestmove(&line) {
                    if *stale_bestmoves > 0 {
                        *stale_bestmoves -= 1;
                        log::debug!("skipping late '{line}' from an earlier search");
                        acc = ScoreAccumulator::default();
                        continue;
                    }
                    if best.mv.is_none() {
                        log::warn!("engine sent '{line}' without a move");
                    }
                    return SearchResult {
                        best_move: best.mv,
                        ponder: best.ponder,
                        eval: acc.eval(),
                        score: acc.score(),
                        timed_out: false,
                        elapsed_ms: duration_to_millis(start.elapsed()),
                        fallback: false,
                    };
                }
                acc.observe(&line);
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "no bestmove before deadline ({}ms elapsed)",
                    duration_to_millis(start.elapsed())
                );
                break;
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("engine output closed before bestmove");
                break;
            }
        }
    }

    SearchResult {
        best_move: None,
        ponder: None,
        eval: acc.eval(),
        score: acc.score(),
        timed_out: true,
        elapsed_ms: duration_to_millis(start.elapsed()),
        fallback: false,
    }
}
