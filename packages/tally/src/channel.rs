use std::any::{Any, type_name};
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::{Error, Result};

type Handler<N> = dyn Fn(&N) -> bool + Send + Sync;

/// Identifies one registration on a [`NoticeChannel`], for use with
/// [`NoticeChannel::revoke()`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Subscription(u64);

struct Registration<N> {
    subscription: Subscription,

    // Only used to check liveness without calling the handler.
    observer: Weak<dyn Any + Send + Sync>,

    // Returns `false` without doing anything if the observer is gone.
    handler: Arc<Handler<N>>,
}

struct Registrations<N> {
    entries: Vec<Registration<N>>,
    next_subscription: u64,
}

/// Delivers notices of type `N` to registered observers.
///
/// The channel only holds weak references to observers and never keeps one alive. An observer
/// that has been dropped is skipped during delivery and its registration is removed on the
/// next [`publish()`][Self::publish].
///
/// Delivery is synchronous: [`publish()`][Self::publish] invokes every handler on the calling
/// thread, in registration order, before returning.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use parking_lot::Mutex;
/// use tally::NoticeChannel;
///
/// struct Greeting(&'static str);
///
/// #[derive(Default)]
/// struct Listener {
///     heard: Mutex<Vec<&'static str>>,
/// }
///
/// let channel = NoticeChannel::new();
/// let listener = Arc::new(Listener::default());
///
/// channel.register(&Arc::downgrade(&listener), |listener: &Listener, notice: &Greeting| {
///     listener.heard.lock().push(notice.0);
/// });
///
/// channel.publish(&Greeting("hello"));
/// assert_eq!(*listener.heard.lock(), ["hello"]);
///
/// // Dropping the observer is enough to stop receiving notices.
/// drop(listener);
/// assert_eq!(channel.publish(&Greeting("anyone?")), 0);
/// ```
///
/// # Re-entrancy
///
/// Handlers must not publish on the same channel while a notice from it is being delivered.
/// Registering or revoking from within a handler is permitted; such changes take effect from
/// the next `publish()` onwards.
pub struct NoticeChannel<N> {
    registrations: Mutex<Registrations<N>>,
}

impl<N> NoticeChannel<N> {
    /// Creates a channel with no observers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: Mutex::new(Registrations {
                entries: Vec::new(),
                next_subscription: 0,
            }),
        }
    }

    /// Registers an observer to be called with every published notice.
    ///
    /// Returns `None` and logs a warning if the observer has already been dropped.
    pub fn register<O, F>(&self, observer: &Weak<O>, handler: F) -> Option<Subscription>
    where
        N: 'static,
        O: Send + Sync + 'static,
        F: Fn(&O, &N) + Send + Sync + 'static,
    {
        match self.try_register(observer, handler) {
            Ok(subscription) => Some(subscription),
            Err(error) => {
                warn!(%error, "ignoring registration of dropped observer");
                None
            }
        }
    }

    /// Registers an observer to be called with every published notice, reporting
    /// a dropped observer to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ObserverDropped`] if no strong reference to the observer exists anymore.
    pub fn try_register<O, F>(&self, observer: &Weak<O>, handler: F) -> Result<Subscription>
    where
        N: 'static,
        O: Send + Sync + 'static,
        F: Fn(&O, &N) + Send + Sync + 'static,
    {
        if observer.strong_count() == 0 {
            return Err(Error::ObserverDropped {
                observer_type: type_name::<O>(),
            });
        }

        let target = Weak::clone(observer);
        let handler: Arc<Handler<N>> = Arc::new(move |notice: &N| {
            let Some(observer) = target.upgrade() else {
                return false;
            };

            handler(&observer, notice);
            true
        });

        let liveness: Weak<dyn Any + Send + Sync> = Weak::<O>::clone(observer);

        let mut registrations = self.registrations.lock();

        let subscription = Subscription(registrations.next_subscription);
        registrations.next_subscription = registrations.next_subscription.wrapping_add(1);

        registrations.entries.push(Registration {
            subscription,
            observer: liveness,
            handler,
        });

        debug!(
            observer_type = type_name::<O>(),
            subscription = subscription.0,
            "registered observer"
        );

        Ok(subscription)
    }

    /// Removes a registration. Returns `false` if it was already removed.
    ///
    /// Revoking from within a handler during [`publish()`][Self::publish] does not stop the
    /// ongoing delivery from reaching the revoked handler.
    pub fn revoke(&self, subscription: Subscription) -> bool {
        let mut registrations = self.registrations.lock();

        let before = registrations.entries.len();
        registrations
            .entries
            .retain(|registration| registration.subscription != subscription);

        registrations.entries.len() != before
    }

    /// Delivers a notice to every live observer, in registration order.
    ///
    /// Registrations of observers that have been dropped are removed first. Observers that are
    /// dropped while the notice is being delivered are skipped.
    ///
    /// Returns the number of observers that received the notice.
    pub fn publish(&self, notice: &N) -> usize {
        let handlers = {
            let mut registrations = self.registrations.lock();

            let before = registrations.entries.len();
            registrations
                .entries
                .retain(|registration| registration.observer.strong_count() > 0);

            let pruned = before.saturating_sub(registrations.entries.len());
            if pruned > 0 {
                debug!(pruned, "removed registrations of dropped observers");
            }

            registrations
                .entries
                .iter()
                .map(|registration| Arc::clone(&registration.handler))
                .collect::<Vec<_>>()
        };

        // The lock is released so handlers may register and revoke freely.
        handlers.iter().filter(|handler| handler(notice)).count()
    }

    /// Number of registrations, including any whose observer was dropped since the
    /// last [`publish()`][Self::publish].
    #[must_use]
    pub fn len(&self) -> usize {
        self.registrations.lock().entries.len()
    }

    /// Whether there are no registrations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of registrations whose observer is still alive.
    #[must_use]
    pub fn live_len(&self) -> usize {
        self.registrations
            .lock()
            .entries
            .iter()
            .filter(|registration| registration.observer.strong_count() > 0)
            .count()
    }
}

impl<N> Default for NoticeChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> fmt::Debug for NoticeChannel<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(type_name::<Self>())
            .field("registrations", &self.len())
            .finish_non_exhaustive()
    }
}
