//! HTTP API のリクエスト型。

use serde::Deserialize;

pub const DEFAULT_MOVETIME_MS: u64 = 500;
pub const MIN_MOVETIME_MS: u64 = 10;
pub const MAX_MOVETIME_MS: u64 = 30_000;

/// 最善手の問い合わせ。
#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    /// 初期局面からの手順（座標表記）
    #[serde(default)]
    pub moves: Vec<String>,
    /// 探索時間（ミリ秒）
    #[serde(default = "default_movetime")]
    pub movetime: u64,
}

fn default_movetime() -> u64 {
    DEFAULT_MOVETIME_MS
}

impl MoveRequest {
    /// 探索時間の範囲と各指し手トークンの形式を確かめる。
    ///
    /// 合法性はエンジンに任せる。
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_MOVETIME_MS..=MAX_MOVETIME_MS).contains(&self.movetime) {
            return Err(format!(
                "movetime must be between {MIN_MOVETIME_MS} and {MAX_MOVETIME_MS} ms"
            ));
        }
        if let Some(bad) = self.moves.iter().find(|m| !is_coordinate_move(m)) {
            return Err(format!("Invalid move: {bad:?}"));
        }
        Ok(())
    }
}

/// `e2e4` / `e7e8q` 形式か。
fn is_coordinate_move(token: &str) -> bool {
    let b = token.as_bytes();
    let square = |f: u8, r: u8| (b'a'..=b'h').contains(&f) && (b'1'..=b'8').contains(&r);
    match b.len() {
        4 => square(b[0], b[1]) && square(b[2], b[3]),
        5 => square(b[0], b[1]) && square(b[2], b[3]) && b"qrbn".contains(&b[4]),
        _ => false,
    }
}
