//! UCI のコマンド組み立てとエンジン出力行の分類。
//!
//! クライアントが解釈する必要のある部分だけを扱う。`info` 行は評価値以外を読まない。

use std::time::Duration;

use serde::Serialize;

pub const CMD_UCI: &str = "uci";
pub const CMD_ISREADY: &str = "isready";
pub const CMD_QUIT: &str = "quit";
pub const TOKEN_UCIOK: &str = "uciok";
pub const TOKEN_READYOK: &str = "readyok";
pub const TOKEN_BESTMOVE: &str = "bestmove";

/// 詰みスコアを丸める評価値（ポーン単位）。手数は捨てる。
pub const MATE_SCORE_PAWNS: f64 = 100.0;

/// 初期局面から `moves` を順に適用した局面を指定する `position` 行。
///
/// 差分ではなく常に全履歴を送るので、同じ手順からは必ず同じ行が得られる。
pub fn position_command(moves: &[String]) -> String {
    if moves.is_empty() {
        return "position startpos".to_string();
    }
    format!("position startpos moves {}", moves.join(" "))
}

pub fn go_movetime_command(budget: Duration) -> String {
    format!("go movetime {}", duration_to_millis(budget))
}

pub fn duration_to_millis(d: Duration) -> u64 {
    d.as_millis().min(u128::from(u64::MAX)) as u64
}

/// `info ... score <kind> <value>` から読み取った評価。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Score {
    #[serde(rename = "cp")]
    Centipawns(i32),
    Mate(i32),
}

impl Score {
    /// ポーン単位の評価値。詰みは符号だけ残して ±[`MATE_SCORE_PAWNS`] に飽和させる。
    pub fn to_pawns(self) -> f64 {
        match self {
            Score::Centipawns(cp) => f64::from(cp) / 100.0,
            Score::Mate(n) if n > 0 => MATE_SCORE_PAWNS,
            Score::Mate(_) => -MATE_SCORE_PAWNS,
        }
    }
}

/// 手番側から見た評価値を白番側から見た値にする。
///
/// 初期局面は白番なので、`plies` が奇数（黒番）のときだけ符号を反転する。
pub fn to_white_perspective(pawns: f64, plies: usize) -> f64 {
    if plies % 2 == 1 && pawns != 0.0 { -pawns } else { pawns }
}

/// 行中の `score cp <int>` / `score mate <int>` を探す。
///
/// 数値が壊れている場合は `None`（呼び出し側は直前の評価値を保持する）。
pub fn parse_score(line: &str) -> Option<Score> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let idx = tokens.iter().position(|t| *t == "score")?;
    let kind = tokens.get(idx + 1)?;
    let value = tokens.get(idx + 2)?;
    match *kind {
        "cp" => value.parse::<i32>().ok().map(Score::Centipawns),
        "mate" => value.parse::<i32>().ok().map(Score::Mate),
        _ => None,
    }
}

/// `bestmove <move> [ponder <move>]` の内容。
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BestMove {
    pub mv: Option<String>,
    pub ponder: Option<String>,
}

/// `bestmove` で始まる行なら `Some`。指し手トークンが欠けていても終端として扱う。
pub fn parse_bestmove(line: &str) -> Option<BestMove> {
    if !line.starts_with(TOKEN_BESTMOVE) {
        return None;
    }
    let mut tokens = line.split_whitespace().skip(1);
    let mv = tokens.next().map(str::to_string);
    let mut ponder = None;
    while let Some(tok) = tokens.next() {
        if tok == "ponder" {
            ponder = tokens.next().map(str::to_string);
            break;
        }
    }
    Some(BestMove { mv, ponder })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdLine {
    Name(String),
    Author(String),
}

pub fn parse_id(line: &str) -> Option<IdLine> {
    let rest = line.strip_prefix("id ")?;
    if let Some(name) = rest.strip_prefix("name ") {
        return Some(IdLine::Name(name.trim().to_string()));
    }
    rest.strip_prefix("author ").map(|author| IdLine::Author(author.trim().to_string()))
}
