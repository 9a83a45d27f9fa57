//! uci-bridge HTTP サーバ
//!
//! 長寿命の UCI エンジンを 1 本監督し、Web フロントエンドに最善手を返す。
//! エンドポイント:
//! - GET  /        - サービス情報
//! - GET  /health  - エンジンの生存確認（プロセスが落ちていれば 503）
//! - GET  /info    - ハンドシェイクで得たエンジン情報
//! - POST /move    - 初期局面からの手順に対する最善手

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use uci_bridge::{BestMoveSource, EngineSupervisor};

mod config;
mod error;
mod handlers;
mod telemetry;
mod types;

use config::ServerConfig;
use handlers::{engine_info, health, make_move, root};

#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP frontend for a supervised UCI engine")]
struct Cli {
    /// Server config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen host (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Path to the engine binary (overrides the config file)
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    metrics_bind: Option<SocketAddr>,

    /// Do not substitute a legal move when the engine gives none
    #[arg(long, default_value_t = false)]
    no_fallback: bool,
}

/// ハンドラ間で共有する状態
pub struct AppState {
    /// 指し手の問い合わせ先（本番ではエンジンのスーパーバイザ）
    pub source: Arc<dyn BestMoveSource>,
    pub started_at: DateTime<Utc>,
}

/// ルータを組み立てる。テストからも使う。
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/info", get(engine_info))
        .route("/move", post(make_move))
        .layer(cors)
        .with_state(state)
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber).context("failed to set subscriber")?;
    // uci-bridge は `log` で出力するので tracing に合流させる
    tracing_log::LogTracer::init().context("failed to install log bridge")?;
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<ServerConfig> {
    let mut config = match &cli.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ServerConfig::default(),
    };
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(engine) = &cli.engine {
        config.supervisor.engine_path = Some(engine.clone());
    }
    if cli.metrics_bind.is_some() {
        config.metrics_bind = cli.metrics_bind;
    }
    if cli.no_fallback {
        config.supervisor.fallback = false;
    }
    Ok(config)
}

/// Ctrl+C を受け取ったら完了する future。
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing()?;
    let config = load_config(&cli)?;

    if let Some(addr) = config.metrics_bind {
        telemetry::install_exporter(addr)
            .with_context(|| format!("failed to start metrics exporter on {addr}"))?;
        info!("Prometheus metrics on http://{addr}/metrics");
    }

    // 起動（boot grace + handshake）はブロッキングなので blocking pool で行う
    let supervisor_config = config.supervisor.clone();
    let supervisor = Arc::new(
        tokio::task::spawn_blocking(move || EngineSupervisor::start(supervisor_config))
            .await
            .context("engine startup task panicked")?,
    );
    if !supervisor.is_available() {
        tracing::warn!("engine unavailable, /move will answer 503");
    }

    let state = Arc::new(AppState {
        source: Arc::clone(&supervisor) as Arc<dyn BestMoveSource>,
        started_at: Utc::now(),
    });
    let app = create_app(state);

    let addr = config.listen_addr();
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 進行中の探索が残っていても quit → kill で確実に止める
    tokio::task::spawn_blocking(move || supervisor.shutdown())
        .await
        .context("engine shutdown task panicked")?;
    info!("Server shut down gracefully");
    Ok(())
}

// ============================================================================
// 結合テスト
// ============================================================================
