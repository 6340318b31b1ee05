use crate::error::{EngineError, Result};
use std::path::PathBuf;

/// Lines a worker accumulates locally before flushing to the aggregator.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Number of ingest worker threads.
pub const DEFAULT_NUM_THREADS: usize = 8;

/// Sliding window length in milliseconds: ten minutes plus one second of
/// slack so the boundary bucket stays inclusive.
pub const DEFAULT_WINDOW_MS: i64 = 10 * 60 * 1000 + 1000;

/// Tokens must be strictly longer than this many bytes to be counted.
/// Rejects short ASCII words, punctuation and single CJK glyphs while
/// keeping multi-glyph CJK words and longer ASCII words.
pub const DEFAULT_MIN_TOKEN_BYTES: usize = 3;

/// Engine configuration.
///
/// All knobs have working defaults; `validate` is called by the pool
/// constructor so an invalid configuration is rejected before any thread
/// is spawned.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Lines accumulated per worker before a batched flush
    pub batch_size: usize,
    /// Ingest worker count
    pub num_threads: usize,
    /// Sliding window length in milliseconds (boundary slack included)
    pub window_ms: i64,
    /// Byte-length filter: tokens of this length or shorter are dropped
    pub min_token_bytes: usize,
    /// Main dictionary file for the tokenizer, if any
    pub dict_path: Option<PathBuf>,
    /// Additional user dictionaries, loaded in order
    pub user_dict_paths: Vec<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            num_threads: DEFAULT_NUM_THREADS,
            window_ms: DEFAULT_WINDOW_MS,
            min_token_bytes: DEFAULT_MIN_TOKEN_BYTES,
            dict_path: None,
            user_dict_paths: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Set the per-worker flush threshold
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the worker count
    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    /// Set the sliding window length in milliseconds
    pub fn with_window_ms(mut self, window_ms: i64) -> Self {
        self.window_ms = window_ms;
        self
    }

    /// Set the token byte-length filter
    pub fn with_min_token_bytes(mut self, min_token_bytes: usize) -> Self {
        self.min_token_bytes = min_token_bytes;
        self
    }

    /// Check that every knob is in its legal range
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(EngineError::Config("batch_size must be positive".into()));
        }
        if self.num_threads == 0 {
            return Err(EngineError::Config("num_threads must be positive".into()));
        }
        if self.window_ms <= 0 {
            return Err(EngineError::Config("window_ms must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.num_threads, 8);
        assert_eq!(config.window_ms, 601_000);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config = EngineConfig::default().with_batch_size(0);
        assert!(matches!(config.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = EngineConfig::default().with_num_threads(0);
        assert!(config.validate().is_err());
    }
}
