use std::any::type_name;
use std::fmt;
use std::mem;
use std::sync::atomic::{self, AtomicBool};
use std::sync::{Arc, LazyLock};
use std::thread;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    CategoryId, CategoryRegistry, Collection, CollectionAvailable, CollectorBuilder,
    CounterMagnitude, Event, EventKey, EventKind, NoticeChannel, ScopeGuard,
};

static GLOBAL_COLLECTOR: LazyLock<Collector> = LazyLock::new(|| Collector::builder().build());

#[derive(Debug)]
struct Buffer {
    events: Vec<Event>,
    next_sequence: u64,

    // Generation of the most recently created collection, 0 if none yet.
    generation: u64,
}

/// Records scope and counter events and periodically cuts them into [`Collection`]s.
///
/// Recording is cheap when the collector is disabled: a single relaxed atomic load. When
/// enabled, events are appended to a shared buffer that is safe to use from any number of
/// threads. Each event remembers the thread that recorded it.
///
/// [`create_collection()`][Self::create_collection] replaces the buffer with an empty one,
/// turns the recorded events into an immutable [`Collection`] and publishes a
/// [`CollectionAvailable`] notice on the collector's [`channel()`][Self::channel].
///
/// # Example
///
/// ```
/// use tally::{CategoryId, Collector};
///
/// const IO: CategoryId = CategoryId::from_name("Io");
///
/// let collector = Collector::builder().enabled(true).build();
///
/// {
///     let _scope = collector.scope(IO, "read_config");
///     collector.record_counter_delta(IO, "bytes_read", 512);
/// }
///
/// let collection = collector.create_collection();
/// assert_eq!(collection.len(), 3);
/// assert_eq!(collection.generation(), 1);
/// ```
///
/// # Process-wide collector
///
/// Most applications use the single collector returned by [`Collector::global()`], which
/// starts out disabled. Separate collectors can be built for subsystems that want their own
/// collection cadence.
pub struct Collector {
    enabled: AtomicBool,
    registry: Arc<CategoryRegistry>,
    buffer: Mutex<Buffer>,
    capacity: usize,
    channel: NoticeChannel<CollectionAvailable>,
}

impl Collector {
    /// Creates a new collector builder with the default builder configuration.
    #[must_use]
    #[cfg_attr(test, mutants::skip)] // Gets replaced with itself by different name, bad mutation.
    pub fn builder() -> CollectorBuilder {
        CollectorBuilder::new()
    }

    /// Creates a disabled collector that uses the process-wide category registry.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub(crate) fn new_with(enabled: bool, capacity: usize, registry: Arc<CategoryRegistry>) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            registry,
            buffer: Mutex::new(Buffer {
                events: Vec::with_capacity(capacity),
                next_sequence: 0,
                generation: 0,
            }),
            capacity,
            channel: NoticeChannel::new(),
        }
    }

    /// The process-wide collector, created disabled on first use.
    #[must_use]
    pub fn global() -> &'static Self {
        &GLOBAL_COLLECTOR
    }

    /// Turns recording on or off for all categories.
    ///
    /// Events already in the buffer are kept either way.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, atomic::Ordering::Relaxed);
        debug!(enabled, "collector recording state changed");
    }

    /// Whether the collector is recording.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        // Relaxed is sufficient: events racing with a state change may or may not be recorded.
        self.enabled.load(atomic::Ordering::Relaxed)
    }

    /// Whether an event in the category would be recorded right now.
    ///
    /// Use this to skip expensive preparation of event keys when tracing is off.
    #[inline]
    #[must_use]
    pub fn is_recording(&self, category: CategoryId) -> bool {
        self.is_enabled() && self.registry.is_enabled(category)
    }

    /// Opens a scope on the calling thread.
    ///
    /// Pair with [`end_scope()`][Self::end_scope] using the same category and key, or use
    /// [`scope()`][Self::scope] to have the end recorded automatically.
    pub fn begin_scope(&self, category: CategoryId, key: impl Into<EventKey>) {
        if self.is_recording(category) {
            self.record(category, key.into(), EventKind::ScopeBegin);
        }
    }

    /// Closes a scope on the calling thread.
    pub fn end_scope(&self, category: CategoryId, key: impl Into<EventKey>) {
        if self.is_recording(category) {
            self.record(category, key.into(), EventKind::ScopeEnd);
        }
    }

    /// Opens a scope that is closed when the returned guard is dropped.
    ///
    /// # Example
    ///
    /// ```
    /// use tally::{CategoryId, Collector, EventKind};
    ///
    /// let collector = Collector::builder().enabled(true).build();
    ///
    /// {
    ///     let _scope = collector.scope(CategoryId::DEFAULT, "load");
    ///     // ... do the work ...
    /// }
    ///
    /// let collection = collector.create_collection();
    /// let kinds = collection.events().map(|e| e.kind()).collect::<Vec<_>>();
    /// assert_eq!(kinds, [EventKind::ScopeBegin, EventKind::ScopeEnd]);
    /// ```
    pub fn scope(&self, category: CategoryId, key: impl Into<EventKey>) -> ScopeGuard<'_> {
        if !self.is_recording(category) {
            return ScopeGuard::new(self, category, None);
        }

        let key = key.into();
        self.record(category, key.clone(), EventKind::ScopeBegin);

        ScopeGuard::new(self, category, Some(key))
    }

    /// Runs `f` inside a scope and returns its result.
    pub fn scoped<F, R>(&self, category: CategoryId, key: impl Into<EventKey>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let _scope = self.scope(category, key);
        f()
    }

    /// Records a change to a counter.
    ///
    /// Any primitive integer or float is accepted; see [`CounterMagnitude`].
    ///
    /// Deltas are stored as recorded; summing them is up to the consumers of the collection.
    /// Counters are independent of scopes: it makes no difference whether a delta is recorded
    /// inside a scope or not.
    pub fn record_counter_delta(
        &self,
        category: CategoryId,
        key: impl Into<EventKey>,
        delta: impl CounterMagnitude,
    ) {
        if self.is_recording(category) {
            let delta = delta.to_counter_magnitude();
            self.record(category, key.into(), EventKind::CounterDelta(delta));
        }
    }

    /// Records the absolute value of a counter.
    pub fn record_counter_value(
        &self,
        category: CategoryId,
        key: impl Into<EventKey>,
        value: impl CounterMagnitude,
    ) {
        if self.is_recording(category) {
            let value = value.to_counter_magnitude();
            self.record(category, key.into(), EventKind::CounterValue(value));
        }
    }

    /// Records an instantaneous event.
    pub fn record_marker(&self, category: CategoryId, key: impl Into<EventKey>) {
        if self.is_recording(category) {
            self.record(category, key.into(), EventKind::Marker);
        }
    }

    /// Records the end of a scope whose begin was recorded, without consulting the gates again.
    pub(crate) fn close_scope(&self, category: CategoryId, key: EventKey) {
        self.record(category, key, EventKind::ScopeEnd);
    }

    fn record(&self, category: CategoryId, key: EventKey, kind: EventKind) {
        let thread = thread::current().id();
        let timestamp = Instant::now();

        let mut buffer = self.buffer.lock();

        let sequence = buffer.next_sequence;
        buffer.next_sequence = sequence.wrapping_add(1);

        buffer
            .events
            .push(Event::new(category, key, kind, thread, timestamp, sequence));
    }

    /// Cuts the events recorded since the previous call into a new [`Collection`] and
    /// publishes it to the observers registered on [`channel()`][Self::channel].
    ///
    /// Observers are notified synchronously on the calling thread before this returns. The
    /// collection is created and published even if it is empty or the collector is disabled.
    ///
    /// Every event recorded before this call on the calling thread is part of the returned
    /// collection; every event recorded after it is not. Events recorded concurrently on other
    /// threads land in exactly one collection.
    pub fn create_collection(&self) -> Arc<Collection> {
        let (generation, events) = {
            let mut buffer = self.buffer.lock();
            buffer.generation = buffer.generation.wrapping_add(1);

            // An empty buffer keeps its allocation for the next round.
            let events = if buffer.events.is_empty() {
                Vec::new()
            } else {
                mem::replace(&mut buffer.events, Vec::with_capacity(self.capacity))
            };

            (buffer.generation, events)
        };

        let collection = Arc::new(Collection::new(generation, events));
        let observers = self
            .channel
            .publish(&CollectionAvailable::new(Arc::clone(&collection)));

        debug!(
            generation,
            events = collection.len(),
            observers,
            "published collection"
        );

        collection
    }

    /// Discards all buffered events without creating a collection.
    pub fn clear(&self) {
        let discarded = {
            let mut buffer = self.buffer.lock();
            let discarded = buffer.events.len();
            buffer.events.clear();
            discarded
        };

        debug!(discarded, "cleared collector buffer");
    }

    /// Number of events recorded since the last collection was created or the buffer cleared.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.lock().events.len()
    }

    /// Generation of the most recently created collection, or 0 if there has been none.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.buffer.lock().generation
    }

    /// The channel on which [`CollectionAvailable`] notices are published.
    #[must_use]
    pub fn channel(&self) -> &NoticeChannel<CollectionAvailable> {
        &self.channel
    }

    /// The registry that holds the per-category recording gates.
    #[must_use]
    pub fn registry(&self) -> &Arc<CategoryRegistry> {
        &self.registry
    }
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("enabled", &self.is_enabled())
            .field("buffered", &self.buffered_len())
            .field("generation", &self.generation())
            .field("channel", &self.channel)
            .finish_non_exhaustive()
    }
}
