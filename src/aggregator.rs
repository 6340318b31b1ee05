use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

/// A token and how often it was seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordCount {
    pub word: String,
    pub count: u64,
}

/// A token ranked by the magnitude of its recent rate-of-change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendEntry {
    pub word: String,
    /// Least-squares slope of per-bucket frequency against bucket index
    pub slope: f64,
    /// Total occurrences inside the sliding window
    pub total: u64,
}

/// Point-in-time summary of the aggregator, for logs and sanity checks.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatorStats {
    pub bucket_count: usize,
    pub global_unique_words: usize,
    pub window_unique_words: usize,
    pub window_start_idx: usize,
    pub latest_ms: Option<i64>,
}

/// One second of history: all token counts whose timestamps aligned to
/// this bucket's start.
#[derive(Debug)]
struct Bucket {
    start_ms: i64,
    counts: HashMap<String, u64>,
}

impl Bucket {
    fn new(start_ms: i64) -> Self {
        Self {
            start_ms,
            counts: HashMap::new(),
        }
    }
}

#[derive(Debug, Default)]
struct EngineState {
    /// Per-second buckets, strictly ascending by start time
    history: Vec<Bucket>,
    /// All-time token counts
    global_counts: HashMap<String, u64>,
    /// Exact mirror of `global_counts` as an ordered `(count, token)` set;
    /// reverse iteration yields the global top-k
    ranking: BTreeSet<(u64, String)>,
    /// Token counts over buckets at indices `>= window_start`
    window_counts: HashMap<String, u64>,
    /// First history index still inside the sliding window
    window_start: usize,
}

/// Streaming aggregation engine.
///
/// Owns the bucket history, the global ranking index and the sliding
/// window, all behind a single reader/writer lock: `ingest_batch` takes
/// the exclusive side, queries take the shared side, so a query sees
/// either all or none of a given batch.
///
/// The window is anchored to the newest ingested bucket, not wall-clock
/// time, which makes replayed history and live streams behave
/// identically.
pub struct Aggregator {
    state: RwLock<EngineState>,
    window_ms: i64,
}

impl Aggregator {
    /// Create an empty aggregator with the given window length (ms).
    pub fn new(window_ms: i64) -> Self {
        Self {
            state: RwLock::new(EngineState::default()),
            window_ms,
        }
    }

    /// Window length in milliseconds, boundary slack included.
    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }

    /// Apply one worker batch: all counts share a single target bucket.
    ///
    /// Supports out-of-order arrival: a timestamp older than the newest
    /// bucket either reuses the matching bucket or gap-inserts a new one
    /// at its ordinal position, shifting the window index when the insert
    /// lands below it.
    pub fn ingest_batch(&self, local_counts: HashMap<String, u64>, ts_ms: i64) {
        if local_counts.is_empty() {
            return;
        }
        let bucket_ms = (ts_ms / 1000) * 1000;

        let mut state = self.state.write();
        let EngineState {
            history,
            global_counts,
            ranking,
            window_counts,
            window_start,
        } = &mut *state;

        // Locate or create the target bucket.
        let append = history.last().map_or(true, |back| bucket_ms > back.start_ms);
        let idx = if append {
            history.push(Bucket::new(bucket_ms));
            history.len() - 1
        } else {
            let i = history.partition_point(|b| b.start_ms < bucket_ms);
            if history[i].start_ms != bucket_ms {
                // Gap insertion for a late arrival; keep the window
                // index pointing at the same bucket.
                history.insert(i, Bucket::new(bucket_ms));
                if i <= *window_start {
                    *window_start += 1;
                }
            }
            i
        };

        // The window is anchored at the newest bucket, which may or may
        // not be the one this batch lands in.
        let latest_ms = history.last().map(|b| b.start_ms).unwrap_or(bucket_ms);
        let expire_ms = latest_ms - self.window_ms;
        let in_window = bucket_ms >= expire_ms;

        for (word, delta) in local_counts {
            *history[idx].counts.entry(word.clone()).or_insert(0) += delta;

            let old_count = global_counts.get(&word).copied().unwrap_or(0);
            let new_count = old_count + delta;
            global_counts.insert(word.clone(), new_count);
            if old_count > 0 {
                ranking.remove(&(old_count, word.clone()));
            }
            ranking.insert((new_count, word.clone()));

            if in_window {
                *window_counts.entry(word).or_insert(0) += delta;
            }
        }

        // Advance the window past expired buckets, subtracting their
        // contribution. Monotonic; amortized O(1) per bucket.
        while *window_start < history.len() && history[*window_start].start_ms < expire_ms {
            for (word, count) in &history[*window_start].counts {
                if let Some(current) = window_counts.get_mut(word) {
                    if *current <= *count {
                        window_counts.remove(word);
                    } else {
                        *current -= count;
                    }
                }
            }
            *window_start += 1;
        }
    }

    /// Q1: highest-frequency tokens since startup, ties broken by
    /// ascending token order.
    pub fn global_top_k(&self, k: usize) -> Vec<WordCount> {
        let state = self.state.read();
        state
            .ranking
            .iter()
            .rev()
            .take(k)
            .map(|(count, word)| WordCount {
                word: word.clone(),
                count: *count,
            })
            .collect()
    }

    /// Q2: highest-frequency tokens inside the sliding window.
    pub fn window_top_k(&self, k: usize) -> Vec<WordCount> {
        let state = self.state.read();
        let pairs: Vec<(u64, &String)> = state
            .window_counts
            .iter()
            .map(|(word, count)| (*count, word))
            .collect();
        top_k_counts(pairs, k)
    }

    /// Q3: highest-frequency tokens over buckets whose start time lies in
    /// the closed range `[start_ms, end_ms]`.
    pub fn range_top_k(&self, start_ms: i64, end_ms: i64, k: usize) -> Vec<WordCount> {
        let state = self.state.read();
        let first = state.history.partition_point(|b| b.start_ms < start_ms);

        let mut range_counts: HashMap<&String, u64> = HashMap::new();
        for bucket in &state.history[first..] {
            if bucket.start_ms > end_ms {
                break;
            }
            for (word, count) in &bucket.counts {
                *range_counts.entry(word).or_insert(0) += count;
            }
        }

        let pairs: Vec<(u64, &String)> = range_counts
            .into_iter()
            .map(|(word, count)| (count, word))
            .collect();
        top_k_counts(pairs, k)
    }

    /// Q4: tokens with the largest |slope| of per-bucket frequency across
    /// the windowed buckets, computed by ordinary least squares over
    /// bucket indices `0..n`. Tokens below `min_total` window occurrences
    /// are skipped; fewer than two windowed buckets yield nothing.
    pub fn trending(&self, k: usize, min_total: u64) -> Vec<TrendEntry> {
        let state = self.state.read();
        let n = state.history.len().saturating_sub(state.window_start);
        if n < 2 {
            return Vec::new();
        }

        let nf = n as f64;
        let sum_x = nf * (nf - 1.0) / 2.0;
        let sum_xx = (nf - 1.0) * nf * (2.0 * nf - 1.0) / 6.0;
        let denom = nf * sum_xx - sum_x * sum_x;
        if denom.abs() < 1e-9 {
            return Vec::new();
        }

        let mut sum_xy: HashMap<&str, f64> = HashMap::new();
        for (x, bucket) in state.history[state.window_start..].iter().enumerate() {
            for (word, count) in &bucket.counts {
                *sum_xy.entry(word.as_str()).or_insert(0.0) += x as f64 * *count as f64;
            }
        }

        let entries: Vec<TrendEntry> = state
            .window_counts
            .iter()
            .filter(|(_, &total)| total >= min_total)
            .map(|(word, &total)| {
                let sxy = sum_xy.get(word.as_str()).copied().unwrap_or(0.0);
                let slope = (nf * sxy - sum_x * total as f64) / denom;
                TrendEntry {
                    word: word.clone(),
                    slope,
                    total,
                }
            })
            .collect();

        top_k_by(entries, k, |a, b| {
            b.slope
                .abs()
                .partial_cmp(&a.slope.abs())
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.total.cmp(&a.total))
        })
    }

    /// Current shape of the engine, cheap enough for periodic logging.
    pub fn stats(&self) -> AggregatorStats {
        let state = self.state.read();
        AggregatorStats {
            bucket_count: state.history.len(),
            global_unique_words: state.global_counts.len(),
            window_unique_words: state.window_counts.len(),
            window_start_idx: state.window_start,
            latest_ms: state.history.last().map(|b| b.start_ms),
        }
    }
}

/// Select the top `k` of `items` under `cmp` in O(N log k)-style selection
/// semantics: partition around the k-th element, then sort only the
/// prefix.
fn top_k_by<T, F>(mut items: Vec<T>, k: usize, mut cmp: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let k = k.min(items.len());
    if k == 0 {
        return Vec::new();
    }
    if k < items.len() {
        items.select_nth_unstable_by(k - 1, &mut cmp);
        items.truncate(k);
    }
    items.sort_unstable_by(cmp);
    items
}

/// Top-k `(count, word)` pairs by count descending, token ascending.
fn top_k_counts(pairs: Vec<(u64, &String)>, k: usize) -> Vec<WordCount> {
    top_k_by(pairs, k, |a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)))
        .into_iter()
        .map(|(count, word)| WordCount {
            word: word.clone(),
            count,
        })
        .collect()
}
