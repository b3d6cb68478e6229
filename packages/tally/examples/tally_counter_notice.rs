//! Records counter deltas inside and outside a scope, then reads them back through
//! both kinds of observer: the ready-made `CounterAggregator` and a hand-written handler.
//!
//! Run with `RUST_LOG=tally=trace` to see the diagnostics emitted by the library.

use std::sync::Arc;

use parking_lot::Mutex;
use tally::{
    CategoryFilter, CategoryId, CategoryRegistry, CollectionAvailable, Collector,
    CounterAggregator, CounterTable,
};
use tracing_subscriber::EnvFilter;

const CUSTOM_PERF_COUNTER: CategoryId = CategoryId::from_name("CustomPerfCounter");

/// Keeps its own totals by walking each collection as it arrives.
#[derive(Debug, Default)]
struct Dashboard {
    table: Mutex<CounterTable>,
}

impl Dashboard {
    fn on_collection(&self, notice: &CollectionAvailable) {
        let collection = notice.collection();
        collection.iterate(&mut *self.table.lock());

        println!(
            "collection #{} with {} events from {} threads",
            collection.generation(),
            collection.len(),
            collection.threads().count()
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    CategoryRegistry::global().register(CUSTOM_PERF_COUNTER, "CustomPerfCounter");

    let collector = Collector::global();
    collector.set_enabled(true);

    let aggregator =
        CounterAggregator::register(collector, CategoryFilter::only([CUSTOM_PERF_COUNTER]));

    let dashboard = Arc::new(Dashboard::default());
    collector
        .channel()
        .register(&Arc::downgrade(&dashboard), Dashboard::on_collection);

    collector.scoped(CUSTOM_PERF_COUNTER, "TestScope", || {
        collector.record_counter_delta(CUSTOM_PERF_COUNTER, "first_counter", 1);
    });
    collector.record_counter_delta(CUSTOM_PERF_COUNTER, "first_counter", 3);

    collector.create_collection();

    println!(
        "first_counter = {} (aggregator)",
        aggregator.counter_value("first_counter")
    );
    println!(
        "second_counter present: {}",
        aggregator.has_counter("second_counter")
    );
    print!("dashboard:\n{}", dashboard.table.lock());

    // Once dropped, the dashboard no longer receives collections.
    drop(dashboard);
    collector.create_collection();

    println!(
        "collections seen by aggregator: {}",
        aggregator.collections_seen()
    );
}
