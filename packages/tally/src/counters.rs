use std::fmt::{self, Display};
use std::thread::ThreadId;

use foldhash::{HashMap, HashMapExt, HashSet};
use tracing::trace;

use crate::{CategoryId, Event, EventKind, Visitor};

/// Selects the categories whose events a visitor consumes.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum CategoryFilter {
    /// Every category.
    #[default]
    All,

    /// Only the listed categories.
    Only(HashSet<CategoryId>),
}

impl CategoryFilter {
    /// A filter that accepts only the given categories.
    ///
    /// ```
    /// use tally::{CategoryFilter, CategoryId};
    ///
    /// const RENDER: CategoryId = CategoryId::from_name("Render");
    ///
    /// let filter = CategoryFilter::only([RENDER]);
    /// assert!(filter.accepts(RENDER));
    /// assert!(!filter.accepts(CategoryId::DEFAULT));
    /// ```
    #[must_use]
    pub fn only(categories: impl IntoIterator<Item = CategoryId>) -> Self {
        Self::Only(categories.into_iter().collect())
    }

    /// Whether events of the category pass the filter.
    #[must_use]
    pub fn accepts(&self, category: CategoryId) -> bool {
        match self {
            Self::All => true,
            Self::Only(categories) => categories.contains(&category),
        }
    }
}

/// Sums counter deltas per counter name.
///
/// This is a [`Visitor`]: drive it over any number of collections and it keeps adding
/// up the [`EventKind::CounterDelta`] events of the accepted categories. Other event kinds are
/// ignored. Values are never reset; start a new table to start over.
///
/// To have a table fed automatically with every collection a collector creates, use a
/// [`CounterAggregator`][crate::CounterAggregator].
///
/// # Example
///
/// ```
/// use tally::{CategoryFilter, CategoryId, Collector, CounterTable};
///
/// const NET: CategoryId = CategoryId::from_name("Net");
///
/// let collector = Collector::builder().enabled(true).build();
/// collector.record_counter_delta(NET, "packets", 10);
/// collector.record_counter_delta(NET, "packets", 5);
///
/// let mut table = CounterTable::new(CategoryFilter::only([NET]));
/// collector.create_collection().iterate(&mut table);
///
/// assert_eq!(table.counter_value("packets"), 15.0);
/// assert_eq!(table.counter_value("never_seen"), 0.0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct CounterTable {
    filter: CategoryFilter,
    counters: HashMap<String, f64>,
}

impl CounterTable {
    /// Creates an empty table that consumes events of the categories accepted by the filter.
    #[must_use]
    pub fn new(filter: CategoryFilter) -> Self {
        Self {
            filter,
            counters: HashMap::new(),
        }
    }

    /// The categories this table consumes.
    #[must_use]
    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    /// Whether at least one delta has been seen for the counter.
    #[must_use]
    pub fn has_counter(&self, key: &str) -> bool {
        self.counters.contains_key(key)
    }

    /// The sum of all deltas seen for the counter.
    ///
    /// Returns 0 for a counter that was never seen. Looking up a counter does not create it:
    /// [`has_counter()`][Self::has_counter] still returns `false` afterwards.
    #[must_use]
    pub fn counter_value(&self, key: &str) -> f64 {
        self.counters.get(key).copied().unwrap_or_default()
    }

    /// All counters and their values, sorted by counter name.
    #[must_use]
    pub fn counters(&self) -> Vec<(&str, f64)> {
        let mut counters = self
            .counters
            .iter()
            .map(|(key, value)| (key.as_str(), *value))
            .collect::<Vec<_>>();

        counters.sort_unstable_by(|a, b| a.0.cmp(b.0));
        counters
    }

    /// Number of distinct counters seen.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Whether no counter has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    fn add(&mut self, key: &str, delta: f64) {
        if let Some(value) = self.counters.get_mut(key) {
            *value += delta;
        } else {
            self.counters.insert(key.to_owned(), delta);
        }

        trace!(key, delta, "accumulated counter delta");
    }
}

impl Visitor for CounterTable {
    fn accepts_category(&mut self, category: CategoryId) -> bool {
        self.filter.accepts(category)
    }

    fn on_event(&mut self, _thread: ThreadId, key: &str, event: &Event) {
        if let EventKind::CounterDelta(delta) = event.kind() {
            self.add(key, delta);
        }
    }
}

impl Display for CounterTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.counters() {
            writeln!(f, "{key}: {value}")?;
        }

        Ok(())
    }
}
