use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::fmt::{self, Display};
use std::sync::atomic::{self, AtomicUsize};
use std::sync::{Arc, LazyLock};

use foldhash::{HashMap, HashMapExt};
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::{Error, Result};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Human-readable name of a trace category.
pub type CategoryName = Cow<'static, str>;

/// Identifies a category of trace events.
///
/// Identifiers are plain numbers so that filtering an event by category is a cheap
/// comparison. Use [`CategoryId::from_name()`] to derive a stable identifier from a
/// name at compile time:
///
/// ```
/// use tally::CategoryId;
///
/// const NETWORK: CategoryId = CategoryId::from_name("Network");
///
/// assert_eq!(NETWORK, CategoryId::from_name("Network"));
/// assert_ne!(NETWORK, CategoryId::DEFAULT);
/// ```
///
/// The identifier only becomes associated with a human-readable name once it is registered
/// with a [`CategoryRegistry`].
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CategoryId(u64);

impl CategoryId {
    /// The category used for events that do not belong to any specific category.
    ///
    /// Every registry knows this category under the name `Default`.
    pub const DEFAULT: Self = Self(0);

    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Derives an identifier from a category name (64-bit FNV-1a of the UTF-8 bytes).
    ///
    /// The same name always produces the same identifier, in every process.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();

        let mut hash = FNV_OFFSET_BASIS;
        let mut index = 0;

        while index < bytes.len() {
            #[expect(
                clippy::indexing_slicing,
                reason = "loop condition keeps the index in bounds"
            )]
            #[expect(
                clippy::cast_lossless,
                reason = "From conversions are not usable in const fn"
            )]
            let byte = bytes[index] as u64;

            hash ^= byte;
            hash = hash.wrapping_mul(FNV_PRIME);
            index = index.wrapping_add(1);
        }

        Self(hash)
    }

    /// The raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

#[derive(Debug)]
struct CategoryEntry {
    // None if the category was only ever toggled, never named.
    name: Option<CategoryName>,
    enabled: bool,
}

static GLOBAL_REGISTRY: LazyLock<Arc<CategoryRegistry>> =
    LazyLock::new(|| Arc::new(CategoryRegistry::new()));

/// Maps category identifiers to names and holds the per-category recording gate.
///
/// Categories are never unregistered. The process-wide instance is available via
/// [`CategoryRegistry::global()`] and is what collectors use unless built with a
/// different registry.
///
/// # Example
///
/// ```
/// use tally::{CategoryId, CategoryRegistry};
///
/// const STORAGE: CategoryId = CategoryId::from_name("Storage");
///
/// let registry = CategoryRegistry::new();
/// registry.register(STORAGE, "Storage");
///
/// assert_eq!(registry.name(STORAGE).as_deref(), Some("Storage"));
/// assert!(registry.is_enabled(STORAGE));
/// ```
#[derive(Debug)]
pub struct CategoryRegistry {
    entries: RwLock<HashMap<CategoryId, CategoryEntry>>,

    // Number of entries with `enabled == false`. While zero, `is_enabled()` does not
    // need to take the lock. Only modified while holding the write lock.
    disabled_count: AtomicUsize,
}

impl CategoryRegistry {
    /// Creates a registry that only knows the [`CategoryId::DEFAULT`] category.
    #[must_use]
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            CategoryId::DEFAULT,
            CategoryEntry {
                name: Some(Cow::Borrowed("Default")),
                enabled: true,
            },
        );

        Self {
            entries: RwLock::new(entries),
            disabled_count: AtomicUsize::new(0),
        }
    }

    /// The process-wide registry, created on first use.
    #[must_use]
    pub fn global() -> &'static Arc<Self> {
        &GLOBAL_REGISTRY
    }

    /// Associates a name with a category identifier.
    ///
    /// Registering the same identifier again with the same name has no effect. Registering it
    /// with a different name logs a warning and keeps the original name.
    pub fn register(&self, id: CategoryId, name: impl Into<CategoryName>) {
        if let Err(error) = self.try_register(id, name) {
            warn!(%error, "ignoring conflicting category registration");
        }
    }

    /// Associates a name with a category identifier, reporting conflicts to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateCategory`] if the identifier is already registered under a
    /// different name. The registry is not modified in that case.
    pub fn try_register(&self, id: CategoryId, name: impl Into<CategoryName>) -> Result<()> {
        let name = name.into();
        let mut entries = self.entries.write();

        match entries.entry(id) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();

                match &entry.name {
                    None => {
                        debug!(%id, %name, "named previously anonymous category");
                        entry.name = Some(name);
                        Ok(())
                    }
                    Some(existing) if *existing == name => Ok(()),
                    Some(existing) => Err(Error::DuplicateCategory {
                        id,
                        existing: existing.clone(),
                        requested: name,
                    }),
                }
            }
            Entry::Vacant(vacant) => {
                debug!(%id, %name, "registered category");
                vacant.insert(CategoryEntry {
                    name: Some(name),
                    enabled: true,
                });
                Ok(())
            }
        }
    }

    /// The name the category was registered with, if any.
    #[must_use]
    pub fn name(&self, id: CategoryId) -> Option<CategoryName> {
        self.entries.read().get(&id).and_then(|entry| entry.name.clone())
    }

    /// Whether a name has been registered for the category.
    #[must_use]
    pub fn is_registered(&self, id: CategoryId) -> bool {
        self.entries
            .read()
            .get(&id)
            .is_some_and(|entry| entry.name.is_some())
    }

    /// Turns recording of events in one category on or off.
    ///
    /// This is independent of the collector-wide switch: an event is only recorded if both
    /// the collector and its category are enabled. Categories start out enabled.
    pub fn set_enabled(&self, id: CategoryId, enabled: bool) {
        let mut entries = self.entries.write();

        let entry = entries.entry(id).or_insert(CategoryEntry {
            name: None,
            enabled: true,
        });

        if entry.enabled == enabled {
            return;
        }

        entry.enabled = enabled;

        // Relaxed is fine: the write lock orders this against other writers and a reader
        // racing with this call may observe either state, same as with the lock.
        if enabled {
            self.disabled_count.fetch_sub(1, atomic::Ordering::Relaxed);
        } else {
            self.disabled_count.fetch_add(1, atomic::Ordering::Relaxed);
        }

        debug!(%id, enabled, "category recording state changed");
    }

    /// Whether events in the category are recorded. Unknown categories are enabled.
    #[inline]
    #[must_use]
    pub fn is_enabled(&self, id: CategoryId) -> bool {
        if self.disabled_count.load(atomic::Ordering::Relaxed) == 0 {
            return true;
        }

        self.entries
            .read()
            .get(&id)
            .is_none_or(|entry| entry.enabled)
    }

    /// All named categories, sorted by identifier.
    #[must_use]
    pub fn categories(&self) -> Vec<(CategoryId, CategoryName)> {
        let mut categories = self
            .entries
            .read()
            .iter()
            .filter_map(|(id, entry)| entry.name.clone().map(|name| (*id, name)))
            .collect::<Vec<_>>();

        categories.sort_by_key(|(id, _)| *id);
        categories
    }

    /// Number of named categories, including [`CategoryId::DEFAULT`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .filter(|entry| entry.name.is_some())
            .count()
    }

    /// Always `false`, as every registry knows the default category.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CategoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
