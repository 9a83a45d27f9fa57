//! エンジンが指し手を返さなかったときの非常用の手生成。

use rand::seq::IndexedRandom;
use shakmaty::uci::Uci;
use shakmaty::{CastlingMode, Chess, Position};

/// 指し手が得られなかったときに代わりの手を出す。
pub trait FallbackMoves: Send + Sync {
    /// 初期局面から `moves` を指した局面での代替手。出せなければ `None`。
    fn fallback_move(&self, moves: &[String]) -> Option<String>;
}

/// 実際の局面の合法手から 1 つ選ぶ。
///
/// 手順を再生できない（不正な手を含む）場合や合法手がない場合は何も返さない。
#[derive(Clone, Copy, Debug, Default)]
pub struct LegalMoveFallback;

impl LegalMoveFallback {
    pub fn legal_moves(moves: &[String]) -> Option<Vec<String>> {
        let pos = replay(moves)?;
        Some(
            pos.legal_moves()
                .iter()
                .map(|m| m.to_uci(CastlingMode::Standard).to_string())
                .collect(),
        )
    }
}

impl FallbackMoves for LegalMoveFallback {
    fn fallback_move(&self, moves: &[String]) -> Option<String> {
        let legal = Self::legal_moves(moves)?;
        legal.choose(&mut rand::rng()).cloned()
    }
}

fn replay(moves: &[String]) -> Option<Chess> {
    let mut pos = Chess::default();
    for (ply, token) in moves.iter().enumerate() {
        let uci: Uci = match token.parse() {
            Ok(uci) => uci,
            Err(_) => {
                log::debug!("fallback: unparseable move '{token}' at ply {ply}");
                return None;
            }
        };
        let mv = match uci.to_move(&pos) {
            Ok(mv) => mv,
            Err(_) => {
                log::debug!("fallback: illegal move '{token}' at ply {ply}");
                return None;
            }
        };
        pos = pos.play(&mv).ok()?;
    }
    Some(pos)
}
