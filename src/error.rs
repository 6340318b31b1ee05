use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while running the engine
#[derive(Error, Debug)]
pub enum EngineError {
    /// The line's time tag is missing or does not parse as `[H:MM:SS(.fff)]`
    #[error("malformed time tag: {0}")]
    MalformedTag(String),

    /// The tokenizer could not be constructed from the configured dictionaries
    #[error("tokenizer initialization failed: {0}")]
    TokenizerInit(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A line was pushed after the ingest pool was stopped
    #[error("ingest pool has been stopped")]
    PoolStopped,

    /// Thread join error
    #[error("worker thread panicked")]
    WorkerPanic,
}
