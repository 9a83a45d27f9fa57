//! HTTP API のレスポンス型。

use serde::{Deserialize, Serialize};

/// `GET /` のサービス情報。
#[derive(Serialize, Deserialize)]
pub struct RootResponse {
    pub engine: String,
    pub version: String,
    pub status: String,
    pub endpoints: Vec<String>,
}

/// ヘルスチェックの応答。
#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"healthy"` か `"degraded"`
    pub status: String,
    pub engine_alive: bool,
}

/// ハンドシェイクで名乗られたエンジン情報。
#[derive(Serialize, Deserialize)]
pub struct InfoResponse {
    pub name: Option<String>,
    pub author: Option<String>,
    pub protocol: String,
    pub started_at: String,
}

/// `POST /move` の成功応答。
#[derive(Serialize, Deserialize)]
pub struct MoveResponse {
    pub success: bool,
    pub bestmove: String,
    /// 白番側から見たポーン単位の評価値
    pub eval: f64,
    pub ponder: Option<String>,
    /// エンジンが指し手を返さず、合法手で代替した
    pub fallback: bool,
}

/// `POST /move` で指し手が得られなかったときの応答。
#[derive(Serialize, Deserialize)]
pub struct NoMoveResponse {
    pub success: bool,
    pub error: String,
    pub eval: f64,
}

#[derive(Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
