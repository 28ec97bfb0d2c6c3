//! Reactive Runtime
//!
//! The runtime connects signals to the memos and effects that read them.
//!
//! 1. Memos and effects register with the runtime when they are created.
//! 2. A tracked signal read records a `signal -> subscriber` edge.
//! 3. When a signal changes, every dependent is marked maybe-dirty, then the
//!    eager ones (effects) are scheduled. Memos recompute lazily on the next
//!    read.
//!
//! The registries are process-wide and keyed by ids that are unique across
//! threads, so reactive graphs built on different threads never observe
//! each other.

use std::sync::{Arc, OnceLock, Weak};

use dashmap::DashMap;
use indexmap::IndexSet;

use super::context::{ReactiveContext, SubscriberId};

/// A computation that can be notified when its dependencies change.
pub trait Reactive: Send + Sync {
    /// Get the subscriber ID for this reactive value.
    fn subscriber_id(&self) -> SubscriberId;

    /// Mark this reactive value as potentially needing update.
    fn mark_maybe_dirty(&self);

    /// Schedule this reactive value for execution (effects only).
    fn schedule(&self);

    /// Effects are eager, memos are lazy.
    fn is_eager(&self) -> bool;
}

/// Handle to a registered reactive value.
///
/// Dropping this handle unregisters the reactive value and its edges.
#[derive(Debug)]
pub struct ReactiveHandle {
    subscriber_id: SubscriberId,
}

impl Drop for ReactiveHandle {
    fn drop(&mut self) {
        Runtime::unregister(self.subscriber_id);
    }
}

/// The global reactive runtime.
pub struct Runtime;

type Registry = DashMap<SubscriberId, Weak<dyn Reactive>>;
type SignalSubscribers = DashMap<u64, IndexSet<SubscriberId>>;

static REGISTRY: OnceLock<Registry> = OnceLock::new();
static SIGNAL_SUBSCRIBERS: OnceLock<SignalSubscribers> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(DashMap::new)
}

fn signal_subscribers() -> &'static SignalSubscribers {
    SIGNAL_SUBSCRIBERS.get_or_init(DashMap::new)
}

impl Runtime {
    /// Register a reactive value with the runtime.
    pub fn register(reactive: Arc<dyn Reactive>) -> ReactiveHandle {
        let id = reactive.subscriber_id();
        registry().insert(id, Arc::downgrade(&reactive));
        ReactiveHandle { subscriber_id: id }
    }

    fn unregister(id: SubscriberId) {
        registry().remove(&id);
        Self::clear_dependencies(id);
    }

    /// Whether a subscriber is currently registered.
    pub fn is_registered(id: SubscriberId) -> bool {
        registry().contains_key(&id)
    }

    /// Record that a subscriber depends on a signal.
    ///
    /// Recording the same edge twice is a no-op.
    pub fn add_dependency(signal_id: u64, subscriber_id: SubscriberId) {
        signal_subscribers()
            .entry(signal_id)
            .or_default()
            .insert(subscriber_id);
    }

    /// Remove every edge pointing at a subscriber.
    ///
    /// Called before re-running a computation so that stale reads stop
    /// triggering it.
    pub fn clear_dependencies(subscriber_id: SubscriberId) {
        for mut entry in signal_subscribers().iter_mut() {
            entry.value_mut().shift_remove(&subscriber_id);
        }
        signal_subscribers().retain(|_, subs| !subs.is_empty());
    }

    /// Number of subscribers currently depending on a signal.
    pub fn dependent_count(signal_id: u64) -> usize {
        signal_subscribers()
            .get(&signal_id)
            .map(|subs| subs.len())
            .unwrap_or(0)
    }

    /// Notify all subscribers that a signal changed.
    pub fn notify_signal_change(signal_id: u64) {
        // Snapshot the edge list so no map guard is held while effects run.
        let subscriber_ids: Vec<SubscriberId> = match signal_subscribers().get(&signal_id) {
            Some(subs) => subs.iter().copied().collect(),
            None => return,
        };

        let reactives: Vec<Arc<dyn Reactive>> = subscriber_ids
            .iter()
            .filter_map(|id| registry().get(id).and_then(|weak| weak.upgrade()))
            .collect();

        // Every dependent is marked before any effect runs, so an effect that
        // reads a memo sees it dirty.
        for reactive in &reactives {
            reactive.mark_maybe_dirty();
        }

        for reactive in reactives.into_iter().filter(|r| r.is_eager()) {
            reactive.schedule();
        }
    }

    /// Get the current subscriber being tracked, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        ReactiveContext::current_subscriber()
    }

    /// Check if signal reads are currently tracked.
    pub fn is_tracking() -> bool {
        ReactiveContext::is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

    struct MockReactive {
        id: SubscriberId,
        dirty: AtomicBool,
        scheduled: AtomicI32,
        eager: bool,
    }

    impl MockReactive {
        fn new(eager: bool) -> Arc<Self> {
            Arc::new(Self {
                id: SubscriberId::new(),
                dirty: AtomicBool::new(false),
                scheduled: AtomicI32::new(0),
                eager,
            })
        }
    }

    impl Reactive for MockReactive {
        fn subscriber_id(&self) -> SubscriberId {
            self.id
        }

        fn mark_maybe_dirty(&self) {
            self.dirty.store(true, Ordering::SeqCst);
        }

        fn schedule(&self) {
            self.scheduled.fetch_add(1, Ordering::SeqCst);
        }

        fn is_eager(&self) -> bool {
            self.eager
        }
    }

    #[test]
    fn dropping_handle_unregisters() {
        let reactive = MockReactive::new(false);
        let id = reactive.id;

        let handle = Runtime::register(reactive);
        assert!(Runtime::is_registered(id));

        drop(handle);
        assert!(!Runtime::is_registered(id));
    }

    #[test]
    fn only_eager_subscribers_are_scheduled() {
        let memo = MockReactive::new(false);
        let effect = MockReactive::new(true);

        let _memo_handle = Runtime::register(memo.clone());
        let _effect_handle = Runtime::register(effect.clone());

        Runtime::add_dependency(u64::MAX - 1, memo.id);
        Runtime::add_dependency(u64::MAX - 1, effect.id);
        Runtime::notify_signal_change(u64::MAX - 1);

        assert!(memo.dirty.load(Ordering::SeqCst));
        assert!(effect.dirty.load(Ordering::SeqCst));
        assert_eq!(memo.scheduled.load(Ordering::SeqCst), 0);
        assert_eq!(effect.scheduled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_edges_schedule_once() {
        let effect = MockReactive::new(true);
        let _handle = Runtime::register(effect.clone());

        Runtime::add_dependency(u64::MAX - 2, effect.id);
        Runtime::add_dependency(u64::MAX - 2, effect.id);
        assert_eq!(Runtime::dependent_count(u64::MAX - 2), 1);

        Runtime::notify_signal_change(u64::MAX - 2);
        assert_eq!(effect.scheduled.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clear_dependencies_removes_edges() {
        let reactive = MockReactive::new(false);
        let _handle = Runtime::register(reactive.clone());

        Runtime::add_dependency(u64::MAX - 3, reactive.id);
        assert_eq!(Runtime::dependent_count(u64::MAX - 3), 1);

        Runtime::clear_dependencies(reactive.id);
        assert_eq!(Runtime::dependent_count(u64::MAX - 3), 0);
    }
}
