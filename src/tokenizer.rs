use crate::error::{EngineError, Result};
use jieba_rs::Jieba;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// A text segmenter shared by every ingest worker.
///
/// Implementations must be safe for concurrent callers and must not hold
/// internal locks across calls; construction happens once at startup and
/// is the only fallible step.
pub trait Tokenizer: Send + Sync {
    /// Split a message body into tokens. Downstream filtering (byte
    /// length, control characters) is the worker's job, not the
    /// tokenizer's.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Full-mode Chinese/multi-language segmenter backed by `jieba-rs`.
pub struct JiebaTokenizer {
    jieba: Jieba,
}

impl JiebaTokenizer {
    /// Build with the dictionary embedded in `jieba-rs`.
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }

    /// Build from dictionary files: an optional main dictionary replacing
    /// the embedded one, plus user dictionaries loaded in order. Paths are
    /// opaque configuration inputs; any failure here is fatal.
    pub fn from_dict_files(
        dict_path: Option<&Path>,
        user_dict_paths: &[PathBuf],
    ) -> Result<Self> {
        let mut jieba = match dict_path {
            Some(path) => {
                let mut reader = BufReader::new(open_dict(path)?);
                Jieba::with_dict(&mut reader)
                    .map_err(|e| EngineError::TokenizerInit(format!("{}: {e}", path.display())))?
            }
            None => Jieba::new(),
        };
        for path in user_dict_paths {
            let mut reader = BufReader::new(open_dict(path)?);
            jieba
                .load_dict(&mut reader)
                .map_err(|e| EngineError::TokenizerInit(format!("{}: {e}", path.display())))?;
        }
        Ok(Self { jieba })
    }
}

fn open_dict(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| EngineError::TokenizerInit(format!("{}: {e}", path.display())))
}

impl Default for JiebaTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for JiebaTokenizer {
    fn split(&self, text: &str) -> Vec<String> {
        self.jieba
            .cut_all(text)
            .into_iter()
            .map(str::to_owned)
            .collect()
    }
}

/// Trivial splitter on Unicode whitespace, for streams that are already
/// word-delimited and for deterministic tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn split(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_owned).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_split() {
        let tokens = WhitespaceTokenizer.split("  alpha beta\tgamma\n");
        assert_eq!(tokens, vec!["alpha", "beta", "gamma"]);
        assert!(WhitespaceTokenizer.split("").is_empty());
    }

    #[test]
    fn test_jieba_full_mode_keeps_ascii_words() {
        let tokenizer = JiebaTokenizer::new();
        let tokens = tokenizer.split("hello world");
        assert!(tokens.iter().any(|t| t == "hello"));
        assert!(tokens.iter().any(|t| t == "world"));
    }

    #[test]
    fn test_jieba_segments_cjk() {
        let tokenizer = JiebaTokenizer::new();
        let tokens = tokenizer.split("今天天气不错");
        assert!(!tokens.is_empty());
        // full-mode decomposition emits overlapping segments
        assert!(tokens.iter().any(|t| t == "天气"));
    }

    #[test]
    fn test_missing_dict_is_fatal() {
        let missing = PathBuf::from("/nonexistent/dict.utf8");
        let result = JiebaTokenizer::from_dict_files(Some(&missing), &[]);
        assert!(matches!(result, Err(EngineError::TokenizerInit(_))));
    }
}
