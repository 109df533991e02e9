//! The series store: the single owner of the bucketed request counts.
//!
//! Writers merge validated rows in batches; readers take views. State is
//! published through an `ArcSwap` so a reader always sees either the state
//! before a merge or the state after it.

mod overlay;
mod state;
mod views;

use std::{
    num::NonZeroUsize,
    sync::{Arc, Mutex, PoisonError},
};

use arc_swap::ArcSwap;
pub use overlay::project_anomalies;
pub use state::SeriesState;
pub use views::{AnomalyOverlayView, CountSeriesView};

use crate::models::{BucketKey, MergeReport, Row};

/// Bounded, ordered, last-write-wins store of bucket rows.
#[derive(Debug)]
pub struct SeriesStore {
    /// Retention bound.
    max_buckets: NonZeroUsize,
    /// The currently published state.
    state: ArcSwap<SeriesState>,
    /// Serializes merges so no copy-on-write update is lost.
    writer: Mutex<()>,
}

impl SeriesStore {
    /// Creates an empty store retaining at most `max_buckets` buckets.
    pub fn new(max_buckets: NonZeroUsize) -> Self {
        Self {
            max_buckets,
            state: ArcSwap::from_pointee(SeriesState::default()),
            writer: Mutex::new(()),
        }
    }

    /// Applies `rows` in order as one batch and publishes the result.
    ///
    /// A key not yet present is inserted, an existing key is overwritten.
    /// Once the batch is applied the oldest keys beyond the retention bound
    /// are evicted. An empty batch publishes nothing.
    pub fn merge<I>(&self, rows: I) -> MergeReport
    where
        I: IntoIterator<Item = Row>,
    {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);

        let mut rows = rows.into_iter().peekable();
        if rows.peek().is_none() {
            return MergeReport::default();
        }

        let mut next = SeriesState::clone(&self.state.load());
        let mut report = MergeReport::default();
        for row in rows {
            if next.upsert(row) {
                report.inserted += 1;
            } else {
                report.updated += 1;
            }
        }
        report.evicted = next.evict_to(self.max_buckets.get());

        assert!(
            next.len() <= self.max_buckets.get(),
            "series holds {} buckets, bound is {}",
            next.len(),
            self.max_buckets
        );

        tracing::debug!(
            inserted = report.inserted,
            updated = report.updated,
            evicted = report.evicted,
            buckets = next.len(),
            "Merged batch into series."
        );

        self.state.store(Arc::new(next));
        report
    }

    /// A view of every retained bucket as `(key, count)`.
    pub fn count_series(&self) -> CountSeriesView {
        CountSeriesView::new(self.state.load_full())
    }

    /// A view of the anomalous buckets as `(key, count)`.
    pub fn anomaly_overlay(&self) -> AnomalyOverlayView {
        AnomalyOverlayView::new(self.state.load_full())
    }

    /// The currently published state.
    pub fn snapshot(&self) -> Arc<SeriesState> {
        self.state.load_full()
    }

    /// Number of retained buckets.
    pub fn len(&self) -> usize {
        self.state.load().len()
    }

    /// Returns `true` if no bucket is retained.
    pub fn is_empty(&self) -> bool {
        self.state.load().is_empty()
    }

    /// The retention bound.
    pub fn max_buckets(&self) -> NonZeroUsize {
        self.max_buckets
    }

    /// The row currently stored for `key`.
    pub fn get(&self, key: &BucketKey) -> Option<Row> {
        self.state.load().get(key).cloned()
    }

    /// The oldest retained key.
    pub fn first_key(&self) -> Option<BucketKey> {
        self.state.load().first_key().cloned()
    }

    /// The newest retained key.
    pub fn last_key(&self) -> Option<BucketKey> {
        self.state.load().last_key().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeriesPoint;

    fn store(max: usize) -> SeriesStore {
        SeriesStore::new(NonZeroUsize::new(max).unwrap())
    }

    fn keys(store: &SeriesStore) -> Vec<String> {
        store.count_series().iter().map(|p| p.key.to_string()).collect()
    }

    #[test]
    fn test_merge_inserts_and_reports() {
        let store = store(10);
        let report = store.merge(vec![Row::new("00:01", 310, true), Row::new("00:00", 12, false)]);

        assert_eq!(report, MergeReport { inserted: 2, updated: 0, evicted: 0 });
        assert_eq!(
            store.count_series().to_vec(),
            vec![SeriesPoint::new("00:00", 12), SeriesPoint::new("00:01", 310)]
        );
    }

    #[test]
    fn test_merge_is_idempotent() {
        let store = store(10);
        let rows = vec![Row::new("A", 1, false), Row::new("B", 2, true)];

        store.merge(rows.clone());
        let first = store.snapshot();
        let report = store.merge(rows);

        assert_eq!(report, MergeReport { inserted: 0, updated: 2, evicted: 0 });
        assert_eq!(*store.snapshot(), *first);
    }

    #[test]
    fn test_last_write_wins_within_batch() {
        let store = store(10);
        let report = store.merge(vec![Row::new("A", 5, false), Row::new("A", 9, true)]);

        assert_eq!(report, MergeReport { inserted: 1, updated: 1, evicted: 0 });
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&"A".into()), Some(Row::new("A", 9, true)));
    }

    #[test]
    fn test_last_write_wins_across_batches() {
        let store = store(10);
        store.merge(vec![Row::new("A", 5, true)]);
        store.merge(vec![Row::new("A", 7, false)]);

        assert_eq!(store.get(&"A".into()), Some(Row::new("A", 7, false)));
        assert!(store.anomaly_overlay().is_empty());
    }

    #[test]
    fn test_keys_stay_strictly_ascending() {
        let store = store(100);
        store.merge(vec![Row::new("00:03", 1, false), Row::new("00:01", 1, false)]);
        store.merge(vec![Row::new("00:02", 1, false), Row::new("00:00", 1, false)]);
        store.merge(vec![Row::new("00:01", 2, false), Row::new("00:04", 1, false)]);

        let keys = keys(&store);
        assert_eq!(keys, vec!["00:00", "00:01", "00:02", "00:03", "00:04"]);
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_integer_keys_order_numerically() {
        let store = store(100);
        store.merge(vec![
            Row::new("10", 1, false),
            Row::new("9", 1, false),
            Row::new("100", 1, false),
        ]);

        assert_eq!(keys(&store), vec!["9", "10", "100"]);
    }

    #[test]
    fn test_retention_evicts_oldest() {
        let store = store(3);
        let report = store.merge((1..=4i64).map(|i| Row::new(i, i as u64, false)));

        assert_eq!(report, MergeReport { inserted: 4, updated: 0, evicted: 1 });
        assert_eq!(keys(&store), vec!["2", "3", "4"]);
        assert_eq!(store.first_key(), Some(BucketKey::Ordinal(2)));
        assert_eq!(store.last_key(), Some(BucketKey::Ordinal(4)));
    }

    #[test]
    fn test_retention_can_evict_keys_from_the_same_batch() {
        let store = store(2);
        store.merge(vec![Row::new("B", 1, false), Row::new("C", 1, false)]);
        let report = store.merge(vec![Row::new("A", 1, false)]);

        // "A" is older than everything retained, so it goes straight back out.
        assert_eq!(report, MergeReport { inserted: 1, updated: 0, evicted: 1 });
        assert_eq!(keys(&store), vec!["B", "C"]);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let store = store(3);
        store.merge(vec![Row::new("A", 1, false)]);
        let before = store.snapshot();

        let report = store.merge(Vec::new());

        assert_eq!(report, MergeReport::default());
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn test_views_pin_their_snapshot() {
        let store = store(10);
        store.merge(vec![Row::new("A", 1, true)]);

        let series = store.count_series();
        let overlay = store.anomaly_overlay();
        store.merge(vec![Row::new("A", 2, false), Row::new("B", 3, true)]);

        assert_eq!(series.to_vec(), vec![SeriesPoint::new("A", 1)]);
        assert_eq!(overlay.to_vec(), vec![SeriesPoint::new("A", 1)]);
        assert_eq!(store.anomaly_overlay().to_vec(), vec![SeriesPoint::new("B", 3)]);
    }

    #[test]
    fn test_views_serialize_as_point_arrays() {
        let store = store(10);
        store.merge(vec![Row::new("00:00", 12, false), Row::new("00:01", 310, true)]);

        let series = serde_json::to_value(store.count_series()).unwrap();
        let overlay = serde_json::to_value(store.anomaly_overlay()).unwrap();

        assert_eq!(
            series,
            serde_json::json!([{"key": "00:00", "count": 12}, {"key": "00:01", "count": 310}])
        );
        assert_eq!(overlay, serde_json::json!([{"key": "00:01", "count": 310}]));
    }

    #[test]
    fn test_concurrent_readers_never_see_partial_merge() {
        let store = Arc::new(store(1000));
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for batch in 0..50u64 {
                    store.merge((0..20i64).map(|i| Row::new(i, batch, false)));
                }
            })
        };

        for _ in 0..200 {
            let counts: Vec<u64> = store.count_series().iter().map(|p| p.count).collect();
            assert!(counts.is_empty() || counts.len() == 20);
            assert!(counts.windows(2).all(|w| w[0] == w[1]), "torn read: {counts:?}");
        }
        writer.join().unwrap();
        assert_eq!(store.len(), 20);
    }
}
