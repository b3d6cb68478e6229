use std::borrow::Cow;
use std::thread::ThreadId;
use std::time::Instant;

use crate::CategoryId;

/// The key of a trace event: a scope name, counter name or marker name.
///
/// Typically keys are `&'static str` but counter names built at runtime are also supported
/// via `Cow`.
pub type EventKey = Cow<'static, str>;

/// What happened, together with any payload that belongs to that kind of event.
#[derive(Clone, Copy, Debug, PartialEq)]
#[non_exhaustive]
pub enum EventKind {
    /// A scope was entered.
    ScopeBegin,

    /// A scope was exited.
    ScopeEnd,

    /// An instantaneous occurrence without a payload.
    Marker,

    /// A counter changed by the given amount.
    CounterDelta(f64),

    /// A counter was set to the given absolute value.
    CounterValue(f64),
}

impl EventKind {
    /// The counter payload, for the two counter kinds.
    #[must_use]
    pub fn counter_value(self) -> Option<f64> {
        match self {
            Self::CounterDelta(value) | Self::CounterValue(value) => Some(value),
            Self::ScopeBegin | Self::ScopeEnd | Self::Marker => None,
        }
    }

    /// Whether this is a scope bracket (begin or end).
    #[must_use]
    pub fn is_scope(self) -> bool {
        matches!(self, Self::ScopeBegin | Self::ScopeEnd)
    }
}

/// A single recorded trace event.
///
/// Events are created by a [`Collector`][crate::Collector] and are immutable from then on.
/// They reach consumers as part of a [`Collection`][crate::Collection].
#[derive(Clone, Debug)]
pub struct Event {
    category: CategoryId,
    key: EventKey,
    kind: EventKind,
    thread: ThreadId,
    timestamp: Instant,
    sequence: u64,
}

impl Event {
    pub(crate) fn new(
        category: CategoryId,
        key: EventKey,
        kind: EventKind,
        thread: ThreadId,
        timestamp: Instant,
        sequence: u64,
    ) -> Self {
        Self {
            category,
            key,
            kind,
            thread,
            timestamp,
            sequence,
        }
    }

    /// The category the event was recorded under.
    #[must_use]
    pub fn category(&self) -> CategoryId {
        self.category
    }

    /// The scope, counter or marker name.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// What happened.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Shorthand for `kind().counter_value()`.
    #[must_use]
    pub fn counter_value(&self) -> Option<f64> {
        self.kind.counter_value()
    }

    /// The thread that recorded the event.
    #[must_use]
    pub fn thread(&self) -> ThreadId {
        self.thread
    }

    /// When the event was recorded.
    #[must_use]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Position of the event in the recording order of its collector.
    ///
    /// Strictly increasing across all threads and all collections of the same collector.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    #![allow(clippy::float_cmp, reason = "exact values, no arithmetic involved")]

    use std::thread;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Event: Send, Sync, Clone);

    #[test]
    fn counter_value_only_for_counters() {
        assert_eq!(EventKind::CounterDelta(2.5).counter_value(), Some(2.5));
        assert_eq!(EventKind::CounterValue(-1.0).counter_value(), Some(-1.0));
        assert_eq!(EventKind::ScopeBegin.counter_value(), None);
        assert_eq!(EventKind::ScopeEnd.counter_value(), None);
        assert_eq!(EventKind::Marker.counter_value(), None);
    }

    #[test]
    fn scope_kinds() {
        assert!(EventKind::ScopeBegin.is_scope());
        assert!(EventKind::ScopeEnd.is_scope());
        assert!(!EventKind::Marker.is_scope());
        assert!(!EventKind::CounterDelta(1.0).is_scope());
    }

    #[test]
    fn accessors_return_what_was_recorded() {
        let now = Instant::now();
        let event = Event::new(
            CategoryId::DEFAULT,
            Cow::Borrowed("requests"),
            EventKind::CounterDelta(3.0),
            thread::current().id(),
            now,
            42,
        );

        assert_eq!(event.category(), CategoryId::DEFAULT);
        assert_eq!(event.key(), "requests");
        assert_eq!(event.kind(), EventKind::CounterDelta(3.0));
        assert_eq!(event.counter_value(), Some(3.0));
        assert_eq!(event.thread(), thread::current().id());
        assert_eq!(event.timestamp(), now);
        assert_eq!(event.sequence(), 42);
    }
}
