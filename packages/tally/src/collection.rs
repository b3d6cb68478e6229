use std::thread::ThreadId;

use foldhash::{HashMap, HashMapExt};

use crate::{Event, Visitor};

/// The events recorded by one thread within a [`Collection`], in recording order.
#[derive(Debug)]
pub struct ThreadEvents {
    thread: ThreadId,
    events: Box<[Event]>,
}

impl ThreadEvents {
    /// The thread that recorded these events.
    #[must_use]
    pub fn thread(&self) -> ThreadId {
        self.thread
    }

    /// The events, in the order the thread recorded them.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }
}

/// An immutable snapshot of all events recorded by a collector between two calls to
/// [`Collector::create_collection()`][crate::Collector::create_collection].
///
/// Collections are shared with observers as `Arc<Collection>`. An observer that wants to keep
/// a collection beyond the notification callback clones the `Arc`.
#[derive(Debug)]
pub struct Collection {
    generation: u64,

    // Ordered by the first event of each thread.
    threads: Box<[ThreadEvents]>,

    len: usize,
}

impl Collection {
    /// Groups the events by thread. The order of events within a thread is preserved.
    pub(crate) fn new(generation: u64, events: Vec<Event>) -> Self {
        let len = events.len();

        let mut thread_to_index = HashMap::new();
        let mut groups: Vec<(ThreadId, Vec<Event>)> = Vec::new();

        for event in events {
            let index = *thread_to_index.entry(event.thread()).or_insert_with(|| {
                groups.push((event.thread(), Vec::new()));
                groups.len().wrapping_sub(1)
            });

            #[expect(
                clippy::indexing_slicing,
                reason = "every index in the map was pushed to groups just before"
            )]
            groups[index].1.push(event);
        }

        let threads = groups
            .into_iter()
            .map(|(thread, events)| ThreadEvents {
                thread,
                events: events.into_boxed_slice(),
            })
            .collect();

        Self {
            generation,
            threads,
            len,
        }
    }

    /// Identifies this collection among all collections of the same collector.
    ///
    /// The first collection has generation 1 and every following one is greater by one.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total number of events in the collection.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no events were recorded since the previous collection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The per-thread event groups, in order of each thread's first event.
    pub fn threads(&self) -> impl Iterator<Item = &ThreadEvents> {
        self.threads.iter()
    }

    /// All events, one thread after another.
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.threads.iter().flat_map(ThreadEvents::events)
    }

    /// Drives a [`Visitor`] over the collection.
    ///
    /// See the documentation of [`Visitor`] for the order of the callbacks.
    pub fn iterate<V>(&self, visitor: &mut V)
    where
        V: Visitor + ?Sized,
    {
        visitor.on_begin_collection();

        for thread_events in &self.threads {
            visitor.on_begin_thread(thread_events.thread);

            for event in &thread_events.events {
                if visitor.accepts_category(event.category()) {
                    visitor.on_event(thread_events.thread, event.key(), event);
                }
            }

            visitor.on_end_thread(thread_events.thread);
        }

        visitor.on_end_collection();
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::indexing_slicing, reason = "panic is fine in tests")]

    use std::borrow::Cow;
    use std::thread;
    use std::time::Instant;

    use static_assertions::assert_impl_all;

    use super::*;
    use crate::{CategoryId, EventKind};

    assert_impl_all!(Collection: Send, Sync);

    const ACCEPTED: CategoryId = CategoryId::from_name("Accepted");
    const REJECTED: CategoryId = CategoryId::from_name("Rejected");

    fn event(thread: ThreadId, category: CategoryId, key: &'static str, sequence: u64) -> Event {
        Event::new(
            category,
            Cow::Borrowed(key),
            EventKind::Marker,
            thread,
            Instant::now(),
            sequence,
        )
    }

    fn other_thread_id() -> ThreadId {
        thread::spawn(|| thread::current().id()).join().unwrap()
    }

    #[derive(Debug, PartialEq)]
    enum Call {
        BeginCollection,
        BeginThread(ThreadId),
        Event(ThreadId, String),
        EndThread(ThreadId),
        EndCollection,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl Visitor for Recorder {
        fn accepts_category(&mut self, category: CategoryId) -> bool {
            category == ACCEPTED
        }

        fn on_begin_collection(&mut self) {
            self.calls.push(Call::BeginCollection);
        }

        fn on_end_collection(&mut self) {
            self.calls.push(Call::EndCollection);
        }

        fn on_begin_thread(&mut self, thread: ThreadId) {
            self.calls.push(Call::BeginThread(thread));
        }

        fn on_end_thread(&mut self, thread: ThreadId) {
            self.calls.push(Call::EndThread(thread));
        }

        fn on_event(&mut self, thread: ThreadId, key: &str, _event: &Event) {
            self.calls.push(Call::Event(thread, key.to_string()));
        }
    }

    #[test]
    fn empty_collection_still_brackets() {
        let collection = Collection::new(1, Vec::new());
        assert!(collection.is_empty());
        assert_eq!(collection.threads().count(), 0);

        let mut recorder = Recorder::default();
        collection.iterate(&mut recorder);

        assert_eq!(
            recorder.calls,
            vec![Call::BeginCollection, Call::EndCollection]
        );
    }

    #[test]
    fn groups_by_thread_preserving_order() {
        let main = thread::current().id();
        let other = other_thread_id();

        let collection = Collection::new(
            3,
            vec![
                event(main, ACCEPTED, "a", 1),
                event(other, ACCEPTED, "b", 2),
                event(main, ACCEPTED, "c", 3),
                event(other, ACCEPTED, "d", 4),
                event(main, ACCEPTED, "e", 5),
            ],
        );

        assert_eq!(collection.generation(), 3);
        assert_eq!(collection.len(), 5);

        let threads = collection.threads().collect::<Vec<_>>();
        assert_eq!(threads.len(), 2);

        assert_eq!(threads[0].thread(), main);
        let main_keys = threads[0].events().iter().map(Event::key).collect::<Vec<_>>();
        assert_eq!(main_keys, ["a", "c", "e"]);

        assert_eq!(threads[1].thread(), other);
        let other_keys = threads[1].events().iter().map(Event::key).collect::<Vec<_>>();
        assert_eq!(other_keys, ["b", "d"]);

        let all_keys = collection.events().map(Event::key).collect::<Vec<_>>();
        assert_eq!(all_keys, ["a", "c", "e", "b", "d"]);
    }

    #[test]
    fn iterate_filters_per_event() {
        let main = thread::current().id();
        let other = other_thread_id();

        let collection = Collection::new(
            1,
            vec![
                event(main, ACCEPTED, "a", 1),
                event(main, REJECTED, "x", 2),
                event(other, REJECTED, "y", 3),
                event(main, ACCEPTED, "b", 4),
            ],
        );

        let mut recorder = Recorder::default();
        collection.iterate(&mut recorder);

        // A thread with only rejected events still gets its brackets.
        assert_eq!(
            recorder.calls,
            vec![
                Call::BeginCollection,
                Call::BeginThread(main),
                Call::Event(main, "a".to_string()),
                Call::Event(main, "b".to_string()),
                Call::EndThread(main),
                Call::BeginThread(other),
                Call::EndThread(other),
                Call::EndCollection,
            ]
        );
    }

    #[test]
    fn iterate_through_trait_object() {
        let collection = Collection::new(1, vec![event(thread::current().id(), ACCEPTED, "a", 1)]);

        let mut recorder = Recorder::default();
        let visitor: &mut dyn Visitor = &mut recorder;
        collection.iterate(visitor);

        assert_eq!(recorder.calls.len(), 5);
    }
}
