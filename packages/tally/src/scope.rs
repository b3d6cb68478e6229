use crate::{CategoryId, Collector, EventKey};

/// Ends a scope when dropped.
///
/// Returned by [`Collector::scope()`]. Begin and end events stay paired: if the collector or
/// the category was disabled when the scope began, nothing is recorded at the end either, and
/// if the begin was recorded, the end is recorded even when recording has been disabled since.
#[derive(Debug)]
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ScopeGuard<'a> {
    collector: &'a Collector,
    category: CategoryId,

    // None if the begin event was not recorded.
    key: Option<EventKey>,
}

impl<'a> ScopeGuard<'a> {
    pub(crate) fn new(collector: &'a Collector, category: CategoryId, key: Option<EventKey>) -> Self {
        Self {
            collector,
            category,
            key,
        }
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.collector.close_scope(self.category, key);
        }
    }
}
