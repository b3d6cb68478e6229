use std::sync::Arc;

use crate::Collection;

/// Published on a collector's [`NoticeChannel`][crate::NoticeChannel] whenever
/// [`Collector::create_collection()`][crate::Collector::create_collection] cuts a new
/// collection.
///
/// Handlers can either drive their own [`Visitor`][crate::Visitor] over the collection or
/// inspect the events directly. To keep the collection beyond the handler, clone the `Arc`.
#[derive(Clone, Debug)]
pub struct CollectionAvailable {
    collection: Arc<Collection>,
}

impl CollectionAvailable {
    pub(crate) fn new(collection: Arc<Collection>) -> Self {
        Self { collection }
    }

    /// The collection that was just created.
    #[must_use]
    pub fn collection(&self) -> &Arc<Collection> {
        &self.collection
    }
}
