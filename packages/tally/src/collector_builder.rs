use std::sync::Arc;

use crate::{CategoryRegistry, Collector};

/// Number of events the buffer has room for after each cut, before it needs to grow.
const DEFAULT_BUFFER_CAPACITY: usize = 256;

/// Creates instances of [`Collector`].
///
/// All parameters are optional. Use `Collector::builder()` to create a new instance of
/// this builder.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use tally::{CategoryRegistry, Collector};
///
/// let collector = Collector::builder()
///     .enabled(true)
///     .capacity(4096)
///     .registry(Arc::new(CategoryRegistry::new()))
///     .build();
///
/// assert!(collector.is_enabled());
/// ```
#[derive(Debug)]
pub struct CollectorBuilder {
    enabled: bool,
    capacity: usize,

    // None means the process-wide registry.
    registry: Option<Arc<CategoryRegistry>>,
}

impl CollectorBuilder {
    pub(crate) fn new() -> Self {
        Self {
            enabled: false,
            capacity: DEFAULT_BUFFER_CAPACITY,
            registry: None,
        }
    }

    /// Whether the collector starts out recording events. The default is `false`.
    #[must_use]
    pub fn enabled(self, enabled: bool) -> Self {
        Self { enabled, ..self }
    }

    /// How many events the buffer can hold without reallocating, each time it is replaced by
    /// [`Collector::create_collection()`].
    ///
    /// The buffer grows as needed, so this is only a tuning knob.
    #[must_use]
    pub fn capacity(self, capacity: usize) -> Self {
        Self { capacity, ..self }
    }

    /// The registry that holds the per-category recording gates consulted by the collector.
    ///
    /// Defaults to [`CategoryRegistry::global()`].
    #[must_use]
    pub fn registry(self, registry: Arc<CategoryRegistry>) -> Self {
        Self {
            registry: Some(registry),
            ..self
        }
    }

    /// Creates the collector.
    #[must_use]
    pub fn build(self) -> Collector {
        let registry = self
            .registry
            .unwrap_or_else(|| Arc::clone(CategoryRegistry::global()));

        Collector::new_with(self.enabled, self.capacity, registry)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::CategoryId;

    #[test]
    fn defaults() {
        let collector = CollectorBuilder::new().build();

        assert!(!collector.is_enabled());
        assert!(Arc::ptr_eq(collector.registry(), CategoryRegistry::global()));
    }

    #[test]
    fn custom_registry_is_used() {
        const SILENCED: CategoryId = CategoryId::from_name("collector_builder_silenced");

        let registry = Arc::new(CategoryRegistry::new());
        registry.set_enabled(SILENCED, false);

        let collector = CollectorBuilder::new()
            .enabled(true)
            .capacity(1)
            .registry(Arc::clone(&registry))
            .build();

        assert!(Arc::ptr_eq(collector.registry(), &registry));

        collector.record_marker(SILENCED, "dropped");
        collector.record_marker(CategoryId::DEFAULT, "kept");
        assert_eq!(collector.buffered_len(), 1);
    }
}
