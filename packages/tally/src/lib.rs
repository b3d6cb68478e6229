#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! # tally
//!
//! Record scope and counter events from any thread, cut them into immutable collections
//! and hand those collections to whoever is interested.
//!
//! # Recording events
//!
//! Events are recorded through a [`Collector`], usually the process-wide one returned by
//! [`Collector::global()`]. Each event belongs to a category identified by a [`CategoryId`],
//! which can be derived from a name at compile time:
//!
//! ```
//! use tally::{CategoryId, Collector};
//!
//! const STORAGE: CategoryId = CategoryId::from_name("Storage");
//!
//! let collector = Collector::builder().enabled(true).build();
//!
//! collector.begin_scope(STORAGE, "flush");
//! collector.record_counter_delta(STORAGE, "pages_written", 12);
//! collector.end_scope(STORAGE, "flush");
//!
//! // Or let a guard end the scope.
//! {
//!     let _scope = collector.scope(STORAGE, "compact");
//!     collector.record_counter_delta(STORAGE, "pages_written", 3);
//! }
//! ```
//!
//! Recording can be switched off for the whole collector with
//! [`Collector::set_enabled()`] or for a single category with
//! [`CategoryRegistry::set_enabled()`]. A disabled collector costs one atomic load per event.
//!
//! # Collections
//!
//! [`Collector::create_collection()`] takes everything recorded so far out of the collector
//! and returns it as a [`Collection`], grouped by the thread that recorded each event.
//! A collection is consumed by walking it with a [`Visitor`].
//!
//! # Observing collections
//!
//! Every new collection is also published as a [`CollectionAvailable`] notice on the
//! collector's [`NoticeChannel`]. Observers register with a weak reference, so they never
//! need to unregister: dropping the observer is enough.
//!
//! [`CounterAggregator`] is a ready-made observer that sums counter deltas across all
//! collections:
//!
//! ```
//! use tally::{CategoryFilter, CategoryId, Collector, CounterAggregator};
//!
//! const PERF: CategoryId = CategoryId::from_name("CustomPerfCounter");
//!
//! let collector = Collector::builder().enabled(true).build();
//! let aggregator = CounterAggregator::register(&collector, CategoryFilter::only([PERF]));
//!
//! {
//!     let _scope = collector.scope(PERF, "TestScope");
//!     collector.record_counter_delta(PERF, "first_counter", 1);
//! }
//! collector.record_counter_delta(PERF, "first_counter", 3);
//!
//! collector.create_collection();
//!
//! assert_eq!(aggregator.counter_value("first_counter"), 4.0);
//! assert!(!aggregator.has_counter("second_counter"));
//! ```
//!
//! For anything else, register a handler directly:
//!
//! ```
//! use std::sync::Arc;
//!
//! use parking_lot::Mutex;
//! use tally::{CollectionAvailable, Collector};
//!
//! #[derive(Default)]
//! struct Sizes(Mutex<Vec<usize>>);
//!
//! let collector = Collector::builder().enabled(true).build();
//! let sizes = Arc::new(Sizes::default());
//!
//! collector.channel().register(
//!     &Arc::downgrade(&sizes),
//!     |sizes: &Sizes, notice: &CollectionAvailable| {
//!         sizes.0.lock().push(notice.collection().len());
//!     },
//! );
//!
//! collector.record_marker(tally::CategoryId::DEFAULT, "tick");
//! collector.create_collection();
//!
//! assert_eq!(*sizes.0.lock(), [1]);
//! ```
//!
//! # Diagnostics
//!
//! The crate logs through [`tracing`]: registrations, collection cuts and configuration
//! changes at `debug`, individual counter updates at `trace`, and ignored misuse such as
//! conflicting category names at `warn`.

mod aggregator;
mod category;
mod channel;
mod collection;
mod collector;
mod collector_builder;
mod counters;
mod error;
mod event;
mod magnitude;
mod notice;
mod scope;
mod visitor;

pub use aggregator::*;
pub use category::*;
pub use channel::*;
pub use collection::*;
pub use collector::*;
pub use collector_builder::*;
pub use counters::*;
pub use error::Error;
pub(crate) use error::Result;
pub use event::*;
pub use magnitude::*;
pub use notice::*;
pub use scope::*;
pub use visitor::*;
