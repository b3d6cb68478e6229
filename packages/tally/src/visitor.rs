use std::thread::ThreadId;

use crate::{CategoryId, Event};

/// Callbacks driven over the events of a [`Collection`][crate::Collection] by
/// [`Collection::iterate()`][crate::Collection::iterate].
///
/// The walk goes as follows:
///
/// 1. [`on_begin_collection()`][Self::on_begin_collection]
/// 2. For each thread that recorded events:
///    1. [`on_begin_thread()`][Self::on_begin_thread]
///    2. [`on_event()`][Self::on_event] for each event of the thread, in recording order,
///       but only if [`accepts_category()`][Self::accepts_category] returns `true` for the
///       category of that event.
///    3. [`on_end_thread()`][Self::on_end_thread]
/// 3. [`on_end_collection()`][Self::on_end_collection]
///
/// Only `accepts_category()` and `on_event()` must be implemented; the bracket callbacks do
/// nothing by default.
///
/// # Example
///
/// ```
/// use std::thread::ThreadId;
///
/// use tally::{CategoryId, Collector, Event, Visitor};
///
/// #[derive(Default)]
/// struct MarkerCounter {
///     markers: usize,
/// }
///
/// impl Visitor for MarkerCounter {
///     fn accepts_category(&mut self, _category: CategoryId) -> bool {
///         true
///     }
///
///     fn on_event(&mut self, _thread: ThreadId, _key: &str, event: &Event) {
///         if event.counter_value().is_none() && !event.kind().is_scope() {
///             self.markers += 1;
///         }
///     }
/// }
///
/// let collector = Collector::builder().enabled(true).build();
/// collector.record_marker(CategoryId::DEFAULT, "frame");
/// collector.record_marker(CategoryId::DEFAULT, "frame");
///
/// let mut counter = MarkerCounter::default();
/// collector.create_collection().iterate(&mut counter);
///
/// assert_eq!(counter.markers, 2);
/// ```
///
/// # Re-entrancy
///
/// Callbacks must not create a new collection on the collector whose collection is being
/// iterated, nor start another iteration with the same visitor. The outcome of doing so is
/// not defined.
pub trait Visitor {
    /// Whether events of the given category should be passed to [`on_event()`][Self::on_event].
    fn accepts_category(&mut self, category: CategoryId) -> bool;

    /// Called once before anything else in an iteration.
    fn on_begin_collection(&mut self) {}

    /// Called once after everything else in an iteration.
    fn on_end_collection(&mut self) {}

    /// Called before the events of a thread are visited.
    fn on_begin_thread(&mut self, _thread: ThreadId) {}

    /// Called after the events of a thread have been visited.
    fn on_end_thread(&mut self, _thread: ThreadId) {}

    /// Called for each event in an accepted category.
    fn on_event(&mut self, thread: ThreadId, key: &str, event: &Event);
}
