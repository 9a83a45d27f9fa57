//! HTTP リクエストハンドラ。

mod engine;
mod health;

pub use engine::*;
pub use health::*;
