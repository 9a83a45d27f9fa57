//! `metrics` facade のカウンタ名と exporter の起動。
//!
//! recorder 未 install なら各マクロは NoOp。

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

pub const SEARCHES_TOTAL: &str = "uci_bridge_searches_total";
pub const SEARCH_TIMEOUTS_TOTAL: &str = "uci_bridge_search_timeouts_total";
pub const FALLBACK_MOVES_TOTAL: &str = "uci_bridge_fallback_moves_total";
pub const BUSY_REJECTIONS_TOTAL: &str = "uci_bridge_busy_rejections_total";
pub const SEARCH_FAILURES_TOTAL: &str = "uci_bridge_search_failures_total";
pub const SEARCH_SECONDS: &str = "uci_bridge_search_seconds";

/// `/metrics` を返す HTTP listener 付きの recorder を install する。
///
/// tokio runtime 内から呼ぶこと（listener は runtime 上の task として動く）。
pub fn install_exporter(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    metrics::describe_counter!(SEARCHES_TOTAL, "Searches that reached the engine");
    metrics::describe_counter!(SEARCH_TIMEOUTS_TOTAL, "Searches that ended without bestmove");
    metrics::describe_counter!(FALLBACK_MOVES_TOTAL, "Moves substituted by the fallback generator");
    metrics::describe_counter!(BUSY_REJECTIONS_TOTAL, "Requests rejected while another search ran");
    metrics::describe_counter!(SEARCH_FAILURES_TOTAL, "Searches that failed with an engine error");
    metrics::describe_histogram!(SEARCH_SECONDS, "Wall time spent waiting for the engine");
    Ok(())
}
