use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;
use uci_bridge::{EngineIdentity, EngineSupervisor, SearchResult, SupervisorConfig};

/// エンジンを 1 回起動して最善手を 1 つ問い合わせ、JSON で出力する。
///
/// 例:
///   `cargo run -p uci-bridge --bin bestmove -- --engine ./engine --movetime 500 e2e4 e7e5`
#[derive(Parser, Debug)]
#[command(author, version, about = "Ask a UCI engine for one move and print it as JSON")]
struct Cli {
    /// Moves from the initial position in coordinate notation (e.g. e2e4 e7e5)
    moves: Vec<String>,

    /// Search time in milliseconds
    #[arg(long, default_value_t = 500)]
    movetime: u64,

    /// Path to the engine binary (overrides the config file)
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Arguments passed to the engine (replaces the default `--uci`)
    #[arg(long = "engine-arg", num_args = 1.., allow_hyphen_values = true)]
    engine_args: Option<Vec<String>>,

    /// Supervisor config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Do not substitute a legal move when the engine gives none
    #[arg(long, default_value_t = false)]
    no_fallback: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Serialize)]
struct Output<'a> {
    moves: &'a [String],
    engine: EngineIdentity,
    #[serde(flatten)]
    result: SearchResult,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, log_level),
    )
    .format(|buf, record| writeln!(buf, "[{}] {}: {}", record.level(), record.target(), record.args()))
    .target(env_logger::Target::Stderr)
    .init();

    if let Err(e) = run(cli) {
        log::error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if cli.movetime == 0 {
        bail!("--movetime must be positive");
    }
    let mut config = match &cli.config {
        Some(path) => SupervisorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => SupervisorConfig::default(),
    };
    if let Some(engine) = cli.engine {
        config.engine_path = Some(engine);
    }
    if let Some(args) = cli.engine_args {
        config.engine_args = args;
    }
    if cli.no_fallback {
        config.fallback = false;
    }

    let supervisor = EngineSupervisor::try_start(config).context("failed to start engine")?;
    let result = supervisor
        .compute_best_move(&cli.moves, Duration::from_millis(cli.movetime))
        .context("search failed")?;
    let output = Output {
        moves: &cli.moves,
        engine: supervisor.identity(),
        result,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    supervisor.shutdown();
    Ok(())
}
