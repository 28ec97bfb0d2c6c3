//! Signal Implementation
//!
//! A Signal is the fundamental reactive primitive. It holds a value and
//! tracks which computations depend on it.
//!
//! 1. A read inside a tracking context (memo or effect run) records an edge
//!    from the signal to that computation in the [`Runtime`].
//! 2. A write notifies the runtime, which re-runs dependent effects
//!    synchronously before `set` returns.
//!
//! Signals are cheap handles: clones share the same value and identity.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::context::ReactiveContext;
use super::runtime::Runtime;

static SIGNAL_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_signal_id() -> u64 {
    SIGNAL_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// A reactive signal holding a value of type T.
///
/// ```rust,ignore
/// let count = Signal::new(0);
/// create_effect({
///     let count = count.clone();
///     move || println!("count = {}", count.get())
/// });
/// count.set(5); // prints "count = 5"
/// ```
pub struct Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    id: u64,
    value: Arc<RwLock<T>>,
}

impl<T> Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            id: next_signal_id(),
            value: Arc::new(RwLock::new(value)),
        }
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the current value, subscribing the running computation if any.
    pub fn get(&self) -> T {
        self.track();
        self.value.read().clone()
    }

    /// Borrow the current value, subscribing the running computation if any.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.value.read())
    }

    /// Get the current value without establishing a dependency.
    pub fn get_untracked(&self) -> T {
        self.value.read().clone()
    }

    /// Set a new value and re-run dependents.
    pub fn set(&self, value: T) {
        // The write guard must be released before dependents read the value.
        *self.value.write() = value;
        Runtime::notify_signal_change(self.id);
    }

    /// Update the value using a function of the current value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.value.read());
        self.set(next);
    }

    /// Number of computations currently depending on this signal.
    pub fn subscriber_count(&self) -> usize {
        Runtime::dependent_count(self.id)
    }

    fn track(&self) {
        if let Some(subscriber_id) = ReactiveContext::current_subscriber() {
            ReactiveContext::track_dependency(self.id);
            Runtime::add_dependency(self.id, subscriber_id);
        }
    }
}

impl<T> Clone for Signal<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            value: Arc::clone(&self.value),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::SubscriberId;

    #[test]
    fn signal_get_and_set() {
        let signal = Signal::new(0);
        assert_eq!(signal.get(), 0);

        signal.set(42);
        assert_eq!(signal.get(), 42);
    }

    #[test]
    fn signal_update() {
        let signal = Signal::new(10);
        signal.update(|v| v + 5);
        assert_eq!(signal.get(), 15);
    }

    #[test]
    fn signal_with_borrows() {
        let signal = Signal::new(vec![1, 2, 3]);
        assert_eq!(signal.with(|v| v.len()), 3);
    }

    #[test]
    fn tracked_read_records_dependency() {
        let signal = Signal::new(0);
        let id = SubscriberId::new();

        {
            let _ctx = ReactiveContext::enter(id);
            signal.get();
            signal.get();
        }

        assert_eq!(signal.subscriber_count(), 1);
        Runtime::clear_dependencies(id);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn untracked_read_records_nothing() {
        let signal = Signal::new(0);
        signal.get();
        signal.get_untracked();
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn signal_clone_shares_state() {
        let signal1 = Signal::new(0);
        let signal2 = signal1.clone();

        signal1.set(42);
        assert_eq!(signal2.get(), 42);
        assert_eq!(signal1.id(), signal2.id());
    }
}
