use ahash::RandomState;
use hashbrown::HashMap;
use log::{debug, warn};
use num_traits::Float;

use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use core::time::Duration;

use crate::{
    TimeSeries,
    helper::{mean_of, round_half_up},
};

/// Map keyed by ticker symbol
pub type SymbolMap<V> = HashMap<String, V, RandomState>;

const HOUR_MS: u64 = 60 * 60 * 1000;

/// One retained price observation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryEntry<T> {
    /// Ticker symbol
    pub symbol: String,
    /// Observed price
    pub price: T,
    /// Observation time in milliseconds since the Unix epoch
    pub timestamp: u64,
}

impl<T> HistoryEntry<T> {
    /// Creates a new entry
    pub fn new(symbol: impl Into<String>, price: T, timestamp: u64) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            timestamp,
        }
    }
}

/// Time bounds applied by a [`HistoryStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RetentionConfig {
    /// Age after which entries become eligible for eviction
    pub retention: Duration,
    /// How far back [`HistoryStore::price_change`] looks
    pub lookback: Duration,
    /// Spacing between consecutive rows stamped by [`HistoryStore::ingest_series`]
    pub sample_spacing: Duration,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_millis(24 * HOUR_MS),
            lookback: Duration::from_millis(24 * HOUR_MS),
            sample_spacing: Duration::from_secs(1),
        }
    }
}

#[inline]
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A time-bounded, per-symbol cache of price observations.
///
/// Entries of each symbol are kept ordered by timestamp, with observations
/// sharing a timestamp kept in insertion order. Reads and evictions take the
/// current time explicitly, so the store itself never consults a clock.
///
/// # Examples
///
/// ```
/// use ta_models::{HistoryEntry, HistoryStore};
///
/// let mut store = HistoryStore::default();
/// store.record(HistoryEntry::new("AAPL", 100.0, 1_000));
/// store.record(HistoryEntry::new("AAPL", 110.0, 2_000));
/// store.record(HistoryEntry::new("AAPL", 120.0, 3_000));
///
/// assert_eq!(store.history("AAPL", 1_000).len(), 2);
/// // last price 120 against a mean of 110
/// assert_eq!(store.price_change("AAPL", 3_000), 9.09);
/// ```
#[derive(Debug, Clone)]
pub struct HistoryStore<T> {
    config: RetentionConfig,
    entries: SymbolMap<Vec<(u64, T)>>,
}

impl<T: Float + Default> Default for HistoryStore<T> {
    fn default() -> Self {
        Self::new(RetentionConfig::default())
    }
}

impl<T: Float + Default> HistoryStore<T> {
    /// Creates an empty store with the given time bounds
    pub fn new(config: RetentionConfig) -> Self {
        Self {
            config,
            entries: HashMap::with_hasher(RandomState::default()),
        }
    }

    /// Returns the time bounds of the store
    pub const fn config(&self) -> &RetentionConfig {
        &self.config
    }

    /// Returns the total number of retained entries
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns `true` if no entries are retained
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the symbols with at least one retained entry, in no particular order
    pub fn symbols(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Stores one observation
    pub fn record(&mut self, entry: HistoryEntry<T>) {
        let HistoryEntry {
            symbol,
            price,
            timestamp,
        } = entry;
        let rows = self.entries.entry(symbol).or_default();
        let at = rows.partition_point(|&(ts, _)| ts <= timestamp);
        rows.insert(at, (timestamp, price));
    }

    /// Stores a batch of observations
    ///
    /// # Returns
    ///
    /// * `usize` - Number of observations stored
    pub fn record_all(&mut self, entries: impl IntoIterator<Item = HistoryEntry<T>>) -> usize {
        let mut count = 0;
        for entry in entries {
            self.record(entry);
            count += 1;
        }
        debug!("history: stored {count} entries");
        count
    }

    /// Stores every row of a fetched series for `symbol`.
    ///
    /// Rows are stamped `sample_spacing` apart so that the last row lands one
    /// spacing before `now` and earlier rows precede it in order.
    ///
    /// # Arguments
    ///
    /// * `symbol` - Ticker symbol the series belongs to
    /// * `series` - Fetched series, oldest row first
    /// * `now` - Ingestion time in milliseconds
    ///
    /// # Returns
    ///
    /// * `usize` - Number of observations stored
    pub fn ingest_series(&mut self, symbol: &str, series: &TimeSeries<T>, now: u64) -> usize {
        let spacing = millis(self.config.sample_spacing);
        let n = series.len() as u64;
        let entries = series.values().iter().zip(0..).map(|(&price, i)| {
            let offset = (n - i).saturating_mul(spacing);
            HistoryEntry::new(symbol, price, now.saturating_sub(offset))
        });
        let count = self.record_all(entries);
        debug!("history: prepared {count} records for {symbol}");
        count
    }

    /// Returns the entries of `symbol` strictly newer than `start`, oldest first
    pub fn history(&self, symbol: &str, start: u64) -> Vec<HistoryEntry<T>> {
        self.entries
            .get(symbol)
            .map(|rows| {
                let from = rows.partition_point(|&(ts, _)| ts <= start);
                rows[from..]
                    .iter()
                    .map(|&(timestamp, price)| HistoryEntry::new(symbol, price, timestamp))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the entries of every symbol strictly newer than `start`
    ///
    /// Symbols without such entries are omitted.
    pub fn snapshot(&self, start: u64) -> SymbolMap<Vec<HistoryEntry<T>>> {
        let mut out = HashMap::with_capacity_and_hasher(self.entries.len(), RandomState::default());
        for symbol in self.entries.keys() {
            let rows = self.history(symbol, start);
            if !rows.is_empty() {
                out.insert(symbol.clone(), rows);
            }
        }
        out
    }

    /// Removes every entry strictly older than `cutoff`
    ///
    /// # Returns
    ///
    /// * `usize` - Number of entries removed
    pub fn evict_older_than(&mut self, cutoff: u64) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, rows| {
            let stale = rows.partition_point(|&(ts, _)| ts < cutoff);
            *rows = rows.split_off(stale);
            removed += stale;
            !rows.is_empty()
        });
        debug!("history: cleaned up {removed} old entries");
        removed
    }

    /// Removes every entry that has outlived the retention period at `now`
    pub fn evict_expired(&mut self, now: u64) -> usize {
        self.evict_older_than(now.saturating_sub(millis(self.config.retention)))
    }

    /// Removes every entry
    ///
    /// # Returns
    ///
    /// * `usize` - Number of entries removed
    pub fn clear(&mut self) -> usize {
        let removed = self.len();
        self.entries.clear();
        removed
    }

    /// Percentage change of the latest price of `symbol` from its mean over the
    /// lookback window ending at `now`
    ///
    /// # Returns
    ///
    /// * `T` - The change rounded to 2 decimals, zero if the window holds no entries
    pub fn price_change(&self, symbol: &str, now: u64) -> T {
        let start = now.saturating_sub(millis(self.config.lookback));
        let history = self.history(symbol, start);
        match history.last() {
            Some(latest) => pct_change_from_mean(&history, latest.price),
            None => T::zero(),
        }
    }
}

/// Percentage deviation of `current` from the mean price of `history`.
///
/// Computes `(current - mean) / mean * 100`, rounded to 2 decimal places with
/// ties rounded towards positive infinity.
///
/// # Arguments
///
/// * `history` - Retained observations of one symbol
/// * `current` - Price to compare against the historical mean
///
/// # Returns
///
/// * `T` - The rounded change, zero for an empty history or a zero mean. A
///   change that cannot be represented in `T` is logged and reported as zero.
///
/// # Examples
///
/// ```
/// use ta_models::{HistoryEntry, pct_change_from_mean};
///
/// let history = [HistoryEntry::new("MSFT", 300.0, 0)];
/// assert_eq!(pct_change_from_mean(&history, 330.0), 10.0);
/// assert_eq!(pct_change_from_mean::<f64>(&[], 330.0), 0.0);
/// ```
pub fn pct_change_from_mean<T: Float + Default>(history: &[HistoryEntry<T>], current: T) -> T {
    let prices: Vec<T> = history.iter().map(|entry| entry.price).collect();
    let Some(mean) = mean_of(&prices) else {
        debug!("history: no historical data found");
        return T::zero();
    };
    if mean.is_zero() {
        return T::zero();
    }

    match percent_change(current, mean) {
        Some(change) => change,
        None => {
            warn!("history: percent change not representable in the price type");
            T::zero()
        }
    }
}

/// `(current - reference) / reference * 100`, rounded to 2 decimals
#[inline]
fn percent_change<T: Float>(current: T, reference: T) -> Option<T> {
    let hundred = T::from(100.0)?;
    round_half_up((current - reference) / reference * hundred, 2)
}

/// Applies [`pct_change_from_mean`] to every symbol of `history` that has a
/// current price; symbols without one are skipped.
pub fn all_pct_changes<T: Float + Default>(
    history: &SymbolMap<Vec<HistoryEntry<T>>>,
    current: &SymbolMap<T>,
) -> SymbolMap<T> {
    history
        .iter()
        .filter_map(|(symbol, rows)| {
            current
                .get(symbol)
                .map(|&price| (symbol.to_string(), pct_change_from_mean(rows, price)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map<V>(pairs: impl IntoIterator<Item = (&'static str, V)>) -> SymbolMap<V> {
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_empty_history_has_zero_change() {
        assert_eq!(pct_change_from_mean::<f64>(&[], 123.0), 0.0);
    }

    #[test]
    fn test_single_entry_change_is_rounded() {
        let history = [HistoryEntry::new("X", 3.0, 0)];
        // (4 - 3) / 3 * 100 = 33.333...
        assert_eq!(pct_change_from_mean(&history, 4.0), 33.33);
        // (2 - 3) / 3 * 100 = -33.333...
        assert_eq!(pct_change_from_mean(&history, 2.0), -33.33);
    }

    #[test]
    fn test_change_is_against_the_mean() {
        let history = [
            HistoryEntry::new("X", 90.0, 0),
            HistoryEntry::new("X", 110.0, 1),
        ];
        assert_eq!(pct_change_from_mean(&history, 105.0), 5.0);
        assert_eq!(pct_change_from_mean(&history, 100.0), 0.0);
    }

    #[test]
    fn test_zero_mean_has_zero_change() {
        let history = [HistoryEntry::new("X", 0.0, 0)];
        assert_eq!(pct_change_from_mean(&history, 5.0), 0.0);
    }

    #[test]
    fn test_batch_skips_symbols_without_current_price() {
        let history = map([
            ("AAPL", vec![HistoryEntry::new("AAPL", 100.0, 0)]),
            ("MSFT", vec![HistoryEntry::new("MSFT", 200.0, 0)]),
            ("TSLA", vec![]),
        ]);
        let current = map([("AAPL", 101.0), ("TSLA", 50.0), ("GOOG", 10.0)]);

        let changes = all_pct_changes(&history, &current);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes["AAPL"], 1.0);
        assert_eq!(changes["TSLA"], 0.0);
        assert!(!changes.contains_key("MSFT"));
        assert!(!changes.contains_key("GOOG"));
    }

    #[test]
    fn test_history_is_ordered_and_strictly_after_start() {
        let mut store = HistoryStore::default();
        store.record_all([
            HistoryEntry::new("AAPL", 3.0, 3_000),
            HistoryEntry::new("AAPL", 1.0, 1_000),
            HistoryEntry::new("MSFT", 9.0, 2_000),
            HistoryEntry::new("AAPL", 2.0, 2_000),
        ]);

        let rows = store.history("AAPL", 1_000);
        let stamps: Vec<u64> = rows.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![2_000, 3_000]);
        assert!(rows.iter().all(|e| e.symbol == "AAPL"));
        assert_eq!(store.history("AAPL", 0).len(), 3);
        assert!(store.history("GOOG", 0).is_empty());
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_same_timestamp_keeps_insertion_order() {
        let mut store = HistoryStore::default();
        store.record(HistoryEntry::new("X", 1.0, 5));
        store.record(HistoryEntry::new("X", 2.0, 5));
        let prices: Vec<f64> = store.history("X", 0).iter().map(|e| e.price).collect();
        assert_eq!(prices, vec![1.0, 2.0]);
    }

    #[test]
    fn test_eviction_is_strictly_before_cutoff() {
        let mut store = HistoryStore::default();
        store.record_all([
            HistoryEntry::new("A", 1.0, 10),
            HistoryEntry::new("A", 2.0, 20),
            HistoryEntry::new("B", 3.0, 15),
            HistoryEntry::new("B", 4.0, 30),
        ]);

        assert_eq!(store.evict_older_than(20), 2);
        assert_eq!(store.len(), 2);
        assert_eq!(store.history("A", 0)[0].timestamp, 20);

        assert_eq!(store.evict_older_than(25), 1);
        let mut symbols: Vec<&str> = store.symbols().collect();
        symbols.sort_unstable();
        assert_eq!(symbols, vec!["B"]);
    }

    #[test]
    fn test_evict_expired_uses_retention() {
        let mut store = HistoryStore::new(RetentionConfig {
            retention: Duration::from_secs(60),
            ..RetentionConfig::default()
        });
        store.record(HistoryEntry::new("A", 1.0, 0));
        store.record(HistoryEntry::new("A", 2.0, 50_000));
        assert_eq!(store.evict_expired(60_000), 0);
        assert_eq!(store.evict_expired(100_000), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut store = HistoryStore::default();
        store.record(HistoryEntry::new("A", 1.0, 0));
        store.record(HistoryEntry::new("B", 2.0, 0));
        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());
        assert_eq!(store.symbols().count(), 0);
    }

    #[test]
    fn test_ingest_series_stamps_rows_before_now() {
        let mut store = HistoryStore::default();
        let series = TimeSeries::prices([(1.0, 10.0), (2.0, 11.0), (3.0, 12.0)]);
        assert_eq!(store.ingest_series("AAPL", &series, 10_000), 3);

        let rows = store.history("AAPL", 0);
        let stamps: Vec<u64> = rows.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![7_000, 8_000, 9_000]);
        assert_eq!(rows[2].price, 12.0);
    }

    #[test]
    fn test_price_change_uses_lookback_window() {
        let mut store = HistoryStore::new(RetentionConfig {
            lookback: Duration::from_secs(10),
            ..RetentionConfig::default()
        });
        store.record(HistoryEntry::new("A", 1_000.0, 0));
        store.record(HistoryEntry::new("A", 100.0, 95_000));
        store.record(HistoryEntry::new("A", 120.0, 100_000));

        // the entry at 0 is outside the window ending at 100s
        assert_eq!(store.price_change("A", 100_000), 9.09);
        assert_eq!(store.price_change("A", 500_000), 0.0);
        assert_eq!(store.price_change("B", 100_000), 0.0);
    }

    #[test]
    fn test_snapshot_omits_stale_symbols() {
        let mut store = HistoryStore::default();
        store.record(HistoryEntry::new("A", 1.0, 10));
        store.record(HistoryEntry::new("B", 2.0, 100));
        let snapshot = store.snapshot(50);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["B"][0].price, 2.0);

        let current = map([("B", 3.0)]);
        assert_eq!(all_pct_changes(&snapshot, &current)["B"], 50.0);
    }

    #[test]
    fn test_percent_change_rounds_in_both_precisions() {
        assert_eq!(percent_change(110.0_f64, 100.0), Some(10.0));
        assert_eq!(percent_change(4.0_f64, 3.0), Some(33.33));
        assert_eq!(percent_change(2.0_f32, 3.0), Some(-33.33));
    }
}
