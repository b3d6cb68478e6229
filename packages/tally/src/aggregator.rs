use std::any::type_name;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{self, AtomicU64};

use parking_lot::Mutex;
use tracing::debug;

use crate::{CategoryFilter, CollectionAvailable, Collector, CounterTable};

/// Keeps running counter totals for every collection a [`Collector`] creates.
///
/// The aggregator registers itself with the collector's channel when created and from then on
/// feeds each new collection through its [`CounterTable`]. The collector only holds a weak
/// reference: once the last `Arc` to the aggregator is dropped, it stops receiving collections
/// and its registration is cleaned up.
///
/// # Example
///
/// ```
/// use tally::{CategoryFilter, CategoryId, Collector, CounterAggregator};
///
/// const PERF: CategoryId = CategoryId::from_name("Perf");
///
/// let collector = Collector::builder().enabled(true).build();
/// let aggregator = CounterAggregator::register(&collector, CategoryFilter::only([PERF]));
///
/// collector.record_counter_delta(PERF, "frames", 1);
/// collector.create_collection();
///
/// collector.record_counter_delta(PERF, "frames", 2);
/// collector.create_collection();
///
/// assert_eq!(aggregator.counter_value("frames"), 3.0);
/// assert_eq!(aggregator.collections_seen(), 2);
/// ```
pub struct CounterAggregator {
    table: Mutex<CounterTable>,
    collections_seen: AtomicU64,
}

impl CounterAggregator {
    /// Creates an aggregator and registers it to receive every future collection of
    /// the collector.
    ///
    /// Events in collections created before this call are not counted.
    #[must_use]
    pub fn register(collector: &Collector, filter: CategoryFilter) -> Arc<Self> {
        let aggregator = Arc::new(Self {
            table: Mutex::new(CounterTable::new(filter)),
            collections_seen: AtomicU64::new(0),
        });

        let subscription = collector
            .channel()
            .register(&Arc::downgrade(&aggregator), Self::on_collection);

        debug!(?subscription, "counter aggregator registered");

        aggregator
    }

    fn on_collection(&self, notice: &CollectionAvailable) {
        // Held for the whole collection so concurrent notices are applied one at a time.
        let mut table = self.table.lock();
        notice.collection().iterate(&mut *table);

        self.collections_seen.fetch_add(1, atomic::Ordering::Relaxed);
    }

    /// Whether at least one delta has been seen for the counter.
    #[must_use]
    pub fn has_counter(&self, key: &str) -> bool {
        self.table.lock().has_counter(key)
    }

    /// The sum of all deltas seen for the counter, 0 if it was never seen.
    #[must_use]
    pub fn counter_value(&self, key: &str) -> f64 {
        self.table.lock().counter_value(key)
    }

    /// All counters and their values, sorted by counter name.
    #[must_use]
    pub fn counters(&self) -> Vec<(String, f64)> {
        self.table
            .lock()
            .counters()
            .into_iter()
            .map(|(key, value)| (key.to_owned(), value))
            .collect()
    }

    /// A copy of the current totals.
    #[must_use]
    pub fn snapshot(&self) -> CounterTable {
        self.table.lock().clone()
    }

    /// Number of collections received so far, including empty ones.
    #[must_use]
    pub fn collections_seen(&self) -> u64 {
        self.collections_seen.load(atomic::Ordering::Relaxed)
    }
}

impl fmt::Debug for CounterAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("counters", &self.table.lock().len())
            .field("collections_seen", &self.collections_seen())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::float_cmp, reason = "sums of small integers are exact")]

    use std::thread;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::{CategoryId, CategoryRegistry};

    assert_impl_all!(CounterAggregator: Send, Sync);

    const COUNTED: CategoryId = CategoryId::from_name("aggregator_tests_counted");
    const OTHER: CategoryId = CategoryId::from_name("aggregator_tests_other");

    fn collector() -> Collector {
        Collector::builder()
            .enabled(true)
            .registry(Arc::new(CategoryRegistry::new()))
            .build()
    }

    #[test]
    fn counts_future_collections_only() {
        let collector = collector();

        collector.record_counter_delta(COUNTED, "hits", 100);
        collector.create_collection();

        let aggregator = CounterAggregator::register(&collector, CategoryFilter::only([COUNTED]));
        assert_eq!(aggregator.collections_seen(), 0);

        collector.record_counter_delta(COUNTED, "hits", 1);
        collector.record_counter_delta(OTHER, "hits", 50);
        collector.create_collection();

        assert_eq!(aggregator.counter_value("hits"), 1.0);
        assert_eq!(aggregator.collections_seen(), 1);
    }

    #[test]
    fn dropped_aggregator_is_unregistered() {
        let collector = collector();

        let aggregator = CounterAggregator::register(&collector, CategoryFilter::All);
        assert_eq!(collector.channel().live_len(), 1);

        drop(aggregator);
        assert_eq!(collector.channel().live_len(), 0);

        collector.record_counter_delta(COUNTED, "hits", 1);
        collector.create_collection();

        assert!(collector.channel().is_empty());
    }

    #[test]
    fn independent_aggregators_share_a_collector() {
        let collector = collector();

        let counted = CounterAggregator::register(&collector, CategoryFilter::only([COUNTED]));
        let everything = CounterAggregator::register(&collector, CategoryFilter::All);

        collector.record_counter_delta(COUNTED, "hits", 2);
        collector.record_counter_delta(OTHER, "misses", 3);
        collector.create_collection();

        assert_eq!(counted.counters(), [("hits".to_owned(), 2.0)]);
        assert_eq!(
            everything.counters(),
            [("hits".to_owned(), 2.0), ("misses".to_owned(), 3.0)]
        );
        assert!(!counted.has_counter("misses"));
    }

    #[test]
    fn snapshot_is_detached() {
        let collector = collector();
        let aggregator = CounterAggregator::register(&collector, CategoryFilter::All);

        collector.record_counter_delta(COUNTED, "hits", 1);
        collector.create_collection();

        let snapshot = aggregator.snapshot();

        collector.record_counter_delta(COUNTED, "hits", 1);
        collector.create_collection();

        assert_eq!(snapshot.counter_value("hits"), 1.0);
        assert_eq!(aggregator.counter_value("hits"), 2.0);
    }

    #[test]
    fn concurrent_collections_are_all_counted() {
        const THREADS: u32 = 4;
        const ROUNDS: u32 = 50;

        let collector = collector();
        let aggregator = CounterAggregator::register(&collector, CategoryFilter::All);

        thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..ROUNDS {
                        collector.record_counter_delta(COUNTED, "hits", 1);
                        collector.create_collection();
                    }
                });
            }
        });

        assert_eq!(aggregator.counter_value("hits"), f64::from(THREADS * ROUNDS));
        assert_eq!(aggregator.collections_seen(), u64::from(THREADS * ROUNDS));
    }
}
