//! Hot-word analytics server.
//!
//! Usage:
//!   # defaults: 8 workers, batch size 10, embedded dictionary
//!   hotwords
//!
//!   # custom ingest tuning and dictionaries
//!   hotwords --threads 4 --batch-size 50 \
//!     --dict dict/main.dict.utf8 --user-dict dict/extra.utf8 \
//!     --bind 0.0.0.0:18080

use anyhow::Context;
use clap::{Parser, ValueEnum};
use hotwords::api::{self, AppState};
use hotwords::{Aggregator, EngineConfig, IngestPool, JiebaTokenizer, Tokenizer, WhitespaceTokenizer};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TokenizerKind {
    /// Full-mode jieba segmentation (default)
    Jieba,
    /// Split on whitespace only
    Whitespace,
}

#[derive(Debug, Parser)]
#[command(name = "hotwords", version, about = "Real-time hot-word analytics over chat streams")]
struct Args {
    /// Lines a worker accumulates before flushing to the aggregator
    #[arg(long, default_value_t = hotwords::config::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Ingest worker threads
    #[arg(long, default_value_t = hotwords::config::DEFAULT_NUM_THREADS)]
    threads: usize,

    /// Sliding window length in milliseconds
    #[arg(long, default_value_t = hotwords::config::DEFAULT_WINDOW_MS)]
    window_ms: i64,

    /// Token segmenter
    #[arg(long, value_enum, default_value = "jieba")]
    tokenizer: TokenizerKind,

    /// Main tokenizer dictionary (embedded one when omitted)
    #[arg(long)]
    dict: Option<PathBuf>,

    /// Additional user dictionaries, may repeat
    #[arg(long = "user-dict")]
    user_dicts: Vec<PathBuf>,

    /// HTTP listen address
    #[arg(long, default_value = "0.0.0.0:18080")]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hotwords=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig {
        batch_size: args.batch_size,
        num_threads: args.threads,
        window_ms: args.window_ms,
        dict_path: args.dict,
        user_dict_paths: args.user_dicts,
        ..EngineConfig::default()
    };
    config.validate().context("invalid configuration")?;

    info!("loading tokenizer dictionaries...");
    let tokenizer: Arc<dyn Tokenizer> = match args.tokenizer {
        TokenizerKind::Jieba => Arc::new(
            JiebaTokenizer::from_dict_files(config.dict_path.as_deref(), &config.user_dict_paths)
                .context("tokenizer initialization failed")?,
        ),
        TokenizerKind::Whitespace => Arc::new(WhitespaceTokenizer),
    };

    let aggregator = Arc::new(Aggregator::new(config.window_ms));
    let pool = Arc::new(IngestPool::new(
        Arc::clone(&aggregator),
        tokenizer,
        &config,
    )?);
    pool.start(config.num_threads);
    info!(
        threads = config.num_threads,
        batch_size = config.batch_size,
        "ingest pool running"
    );

    let app = api::router(AppState {
        pool: Arc::clone(&pool),
        aggregator: Arc::clone(&aggregator),
    });

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!("server listening on http://{}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutting down, draining ingest queue...");
    pool.stop_and_wait().context("ingest pool shutdown failed")?;

    let stats = aggregator.stats();
    info!(
        buckets = stats.bucket_count,
        global_words = stats.global_unique_words,
        window_words = stats.window_unique_words,
        lines = pool.metrics().total_processed(),
        dropped = pool.metrics().total_dropped(),
        "final state"
    );
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
