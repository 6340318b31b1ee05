//! A real-time hot-word analytics engine for timestamped chat streams.
//!
//! This crate ingests `[H:MM:SS(.fff)] body` log lines (chat/danmaku
//! style), tokenizes them, and maintains rolling token statistics that
//! answer four query classes with sub-millisecond latency under
//! concurrent write load:
//!
//! - global top-k since startup
//! - top-k within a sliding ten-minute window anchored at the newest
//!   ingested timestamp
//! - top-k over an arbitrary closed timestamp range
//! - trending tokens, ranked by the least-squares slope of their
//!   per-second frequencies
//!
//! # Architecture
//!
//! - Worker threads drain a single unbounded MPSC queue, batch counts in
//!   per-second local accumulators, and flush them to the aggregator
//! - The aggregator owns the bucket history, a `(count, token)` ranking
//!   set mirroring the global map, and the sliding window as an index
//!   into the history, all behind one reader/writer lock
//! - Queries take the read side and never mutate
//!
//! # Example
//!
//! ```no_run
//! use hotwords::{Aggregator, EngineConfig, IngestPool, WhitespaceTokenizer};
//! use std::sync::Arc;
//!
//! let config = EngineConfig::default();
//! let aggregator = Arc::new(Aggregator::new(config.window_ms));
//! let pool = IngestPool::new(aggregator.clone(), Arc::new(WhitespaceTokenizer), &config)?;
//! pool.start(config.num_threads);
//!
//! pool.push_task("[0:00:08] hello stream world".to_string())?;
//!
//! pool.stop_and_wait()?;
//! for entry in aggregator.global_top_k(10) {
//!     println!("{} {}", entry.word, entry.count);
//! }
//! # Ok::<(), hotwords::EngineError>(())
//! ```

pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod timestamp;
pub mod tokenizer;
pub mod worker;

// Re-exports for convenience
pub use aggregator::{Aggregator, AggregatorStats, TrendEntry, WordCount};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use metrics::{IngestMetrics, MetricsSnapshot};
pub use tokenizer::{JiebaTokenizer, Tokenizer, WhitespaceTokenizer};
pub use worker::IngestPool;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
