use crate::aggregator::Aggregator;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::metrics::IngestMetrics;
use crate::timestamp;
use crate::tokenizer::Tokenizer;
use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::thread::{spawn, JoinHandle};
use tracing::{debug, trace};

/// Fixed-size worker pool draining a single unbounded MPSC queue of raw
/// lines.
///
/// Each worker parses the time tag, tokenizes the body, filters short
/// tokens, and accumulates counts per second-aligned bucket locally;
/// every `batch_size` lines the accumulator is flushed to the aggregator
/// as one `ingest_batch` per distinct bucket. Producers never block;
/// workers block on an empty queue and wake on push or shutdown.
///
/// `stop_and_wait` closes the queue and joins every worker; workers drain
/// whatever is left and flush their remainder before exiting, so after it
/// returns the aggregator holds every successfully parsed line exactly
/// once.
pub struct IngestPool {
    sender: RwLock<Option<Sender<String>>>,
    receiver: Receiver<String>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    aggregator: Arc<Aggregator>,
    tokenizer: Arc<dyn Tokenizer>,
    metrics: IngestMetrics,
    batch_size: usize,
    min_token_bytes: usize,
}

impl IngestPool {
    /// Create a pool over the given aggregator and tokenizer. No threads
    /// run until `start`.
    pub fn new(
        aggregator: Arc<Aggregator>,
        tokenizer: Arc<dyn Tokenizer>,
        config: &EngineConfig,
    ) -> Result<Self> {
        config.validate()?;
        let (sender, receiver) = unbounded();
        Ok(Self {
            sender: RwLock::new(Some(sender)),
            receiver,
            workers: Mutex::new(Vec::new()),
            aggregator,
            tokenizer,
            metrics: IngestMetrics::new(),
            batch_size: config.batch_size,
            min_token_bytes: config.min_token_bytes,
        })
    }

    /// Spawn `num_threads` workers draining the queue.
    pub fn start(&self, num_threads: usize) {
        let mut workers = self.workers.lock();
        for _ in 0..num_threads {
            let worker = Worker {
                receiver: self.receiver.clone(),
                aggregator: Arc::clone(&self.aggregator),
                tokenizer: Arc::clone(&self.tokenizer),
                metrics: self.metrics.clone(),
                batch_size: self.batch_size,
                min_token_bytes: self.min_token_bytes,
            };
            workers.push(spawn(move || worker.run()));
        }
        debug!(num_threads, "ingest pool started");
    }

    /// Enqueue a raw line. Never blocks; the queue is the commitment
    /// boundary, so success here does not imply the line survives
    /// parsing.
    pub fn push_task(&self, line: String) -> Result<()> {
        match &*self.sender.read() {
            Some(sender) => sender.send(line).map_err(|_| EngineError::PoolStopped),
            None => Err(EngineError::PoolStopped),
        }
    }

    /// Close the queue and join every worker. Workers drain remaining
    /// lines and flush their local accumulators before exiting; no
    /// aggregator mutation happens after this returns.
    pub fn stop_and_wait(&self) -> Result<()> {
        // dropping the only sender disconnects the channel, which wakes
        // blocked workers once the queue is drained
        self.sender.write().take();

        let handles: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in handles {
            handle.join().map_err(|_| EngineError::WorkerPanic)?;
        }
        debug!(snapshot = ?self.metrics.snapshot(), "ingest pool joined");
        Ok(())
    }

    /// Ingest counters shared by all workers.
    pub fn metrics(&self) -> &IngestMetrics {
        &self.metrics
    }
}

/// Per-thread ingest state and loop.
struct Worker {
    receiver: Receiver<String>,
    aggregator: Arc<Aggregator>,
    tokenizer: Arc<dyn Tokenizer>,
    metrics: IngestMetrics,
    batch_size: usize,
    min_token_bytes: usize,
}

impl Worker {
    fn run(self) {
        // second-aligned bucket time -> token -> count
        let mut local: BTreeMap<i64, HashMap<String, u64>> = BTreeMap::new();
        let mut line_count = 0usize;

        // recv fails only once the queue is both empty and closed
        while let Ok(line) = self.receiver.recv() {
            let (ts, body) = match timestamp::parse_line(&line) {
                Ok(parsed) => parsed,
                Err(_) => {
                    trace!(line = %line.chars().take(32).collect::<String>(), "dropping malformed line");
                    self.metrics.record_dropped();
                    continue;
                }
            };
            let bucket_ms = (ts / 1000) * 1000;

            for token in self.tokenizer.split(body) {
                if token.len() > self.min_token_bytes && token != "\r" && token != "\n" {
                    *local
                        .entry(bucket_ms)
                        .or_default()
                        .entry(token)
                        .or_insert(0) += 1;
                }
            }
            line_count += 1;
            self.metrics.record_processed();

            if line_count >= self.batch_size {
                self.flush(&mut local);
                line_count = 0;
            }
        }

        // queue closed: hand over whatever is still buffered
        self.flush(&mut local);
    }

    fn flush(&self, local: &mut BTreeMap<i64, HashMap<String, u64>>) {
        if local.is_empty() {
            return;
        }
        for (bucket_ms, counts) in std::mem::take(local) {
            self.aggregator.ingest_batch(counts, bucket_ms);
        }
        self.metrics.record_flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::tokenizer::WhitespaceTokenizer;

    fn make_pool(config: EngineConfig) -> (Arc<Aggregator>, IngestPool) {
        let aggregator = Arc::new(Aggregator::new(config.window_ms));
        let pool = IngestPool::new(
            Arc::clone(&aggregator),
            Arc::new(WhitespaceTokenizer),
            &config,
        )
        .unwrap();
        (aggregator, pool)
    }

    #[test]
    fn test_push_after_stop_fails() {
        let (_, pool) = make_pool(EngineConfig::default());
        pool.start(1);
        pool.stop_and_wait().unwrap();
        assert!(matches!(
            pool.push_task("[0:00:00] hello".into()),
            Err(EngineError::PoolStopped)
        ));
    }

    #[test]
    fn test_drains_queue_before_join() {
        let (aggregator, pool) = make_pool(EngineConfig::default().with_batch_size(3));
        pool.start(2);
        for _ in 0..100 {
            pool.push_task("[0:00:01] whatever".into()).unwrap();
        }
        pool.stop_and_wait().unwrap();

        let top = aggregator.global_top_k(1);
        assert_eq!(top[0].word, "whatever");
        assert_eq!(top[0].count, 100);
        assert_eq!(pool.metrics().total_processed(), 100);
    }

    #[test]
    fn test_remainder_flushed_on_shutdown() {
        // batch size far larger than the line count: nothing flushes
        // until the drain path runs
        let (aggregator, pool) = make_pool(EngineConfig::default().with_batch_size(1000));
        pool.start(1);
        pool.push_task("[0:00:00] straggler".into()).unwrap();
        pool.stop_and_wait().unwrap();

        assert_eq!(aggregator.global_top_k(1)[0].count, 1);
    }

    #[test]
    fn test_malformed_lines_dropped_silently() {
        let (aggregator, pool) = make_pool(EngineConfig::default().with_batch_size(1));
        pool.start(1);
        pool.push_task("no tag at all".into()).unwrap();
        pool.push_task("[25:99:99] bad minutes".into()).unwrap();
        pool.push_task("[0:00:00] good line".into()).unwrap();
        pool.stop_and_wait().unwrap();

        assert_eq!(aggregator.global_top_k(5).len(), 2);
        assert_eq!(pool.metrics().total_dropped(), 2);
        assert_eq!(pool.metrics().total_processed(), 1);
    }

    #[test]
    fn test_token_filter() {
        let (aggregator, pool) = make_pool(EngineConfig::default().with_batch_size(1));
        pool.start(1);
        // "ok" and "abc" are three bytes or fewer; the CJK glyph "好" is
        // exactly three bytes and is filtered under the default too
        pool.push_task("[0:00:00] ok abc 好 keeper".into()).unwrap();
        pool.stop_and_wait().unwrap();

        let top = aggregator.global_top_k(10);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].word, "keeper");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let aggregator = Arc::new(Aggregator::new(601_000));
        let result = IngestPool::new(
            aggregator,
            Arc::new(WhitespaceTokenizer),
            &EngineConfig::default().with_batch_size(0),
        );
        assert!(result.is_err());
    }
}
