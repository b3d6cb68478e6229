use thiserror::Error;

use crate::{CategoryId, CategoryName};

/// Misuse of the registration APIs, reported by the `try_*` family of methods.
///
/// The non-`try_` variants of the same methods log these conditions as warnings
/// and carry on as no-ops, so producer code is never disrupted by observer state.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A category identifier was registered a second time under a different name.
    #[error("category {id} is already registered as '{existing}', refusing to rename it to '{requested}'")]
    DuplicateCategory {
        /// The identifier that was registered twice.
        id: CategoryId,

        /// The name the category was first registered with. This name stays in effect.
        existing: CategoryName,

        /// The conflicting name that was rejected.
        requested: CategoryName,
    },

    /// An observer was dropped before it could be registered with a notice channel.
    #[error("observer of type {observer_type} was dropped before registration")]
    ObserverDropped {
        /// Type name of the observer, for diagnostics.
        observer_type: &'static str,
    },
}

/// A specialized `Result` type for tally operations, returning the crate's
/// [`Error`] type as the error value.
pub(crate) type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::fmt::Debug;

    use static_assertions::assert_impl_all;

    use super::*;

    assert_impl_all!(Error: Send, Sync, Debug);

    #[test]
    fn duplicate_category_message_names_both() {
        let error = Error::DuplicateCategory {
            id: CategoryId::new(7),
            existing: "Render".into(),
            requested: "Physics".into(),
        };

        let message = error.to_string();
        assert!(message.contains("Render"));
        assert!(message.contains("Physics"));
    }

    #[test]
    fn observer_dropped_is_error() {
        let result: Result<()> = Err(Error::ObserverDropped {
            observer_type: "Foo",
        });

        assert!(matches!(
            result,
            Err(Error::ObserverDropped { observer_type: "Foo" })
        ));
    }
}
