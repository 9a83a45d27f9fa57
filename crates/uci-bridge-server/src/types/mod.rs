//! HTTP API のリクエスト／レスポンス型。

mod requests;
mod responses;

pub use requests::*;
pub use responses::*;
