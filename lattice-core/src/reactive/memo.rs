//! Memo Implementation
//!
//! A Memo is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! 1. On first access, the memo runs its computation and caches the result.
//! 2. When a signal it read changes, the runtime marks it maybe-dirty.
//! 3. The next access recomputes; otherwise the cache is returned.
//!
//! A computation that reads a memo inherits the memo's signal dependencies,
//! so an effect reading a memo re-runs when the memo's inputs change.

use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::context::{ReactiveContext, SubscriberId};
use super::runtime::{Reactive, ReactiveHandle, Runtime};

static MEMO_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_memo_id() -> u64 {
    MEMO_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// Dirty state for a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    /// The cached value is up-to-date.
    Clean,

    /// A dependency might have changed.
    MaybeDirty,

    /// The memo must recompute.
    Dirty,
}

struct MemoInner<T> {
    id: u64,
    subscriber_id: SubscriberId,
    compute: Box<dyn Fn() -> T + Send + Sync>,
    value: RwLock<Option<T>>,
    state: RwLock<MemoState>,
    dependencies: RwLock<Vec<u64>>,
    handle: Mutex<Option<ReactiveHandle>>,
}

impl<T> Reactive for MemoInner<T>
where
    T: Clone + Send + Sync + PartialEq + 'static,
{
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn mark_maybe_dirty(&self) {
        let mut state = self.state.write();
        if *state == MemoState::Clean {
            *state = MemoState::MaybeDirty;
        }
    }

    fn schedule(&self) {}

    fn is_eager(&self) -> bool {
        false
    }
}

/// A cached derived value that recomputes only when dependencies change.
pub struct Memo<T>
where
    T: Clone + Send + Sync + PartialEq + 'static,
{
    inner: Arc<MemoInner<T>>,
}

impl<T> Memo<T>
where
    T: Clone + Send + Sync + PartialEq + 'static,
{
    /// Create a memo. The computation runs on first access.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let inner = Arc::new(MemoInner {
            id: next_memo_id(),
            subscriber_id: SubscriberId::new(),
            compute: Box::new(compute),
            value: RwLock::new(None),
            state: RwLock::new(MemoState::Dirty),
            dependencies: RwLock::new(Vec::new()),
            handle: Mutex::new(None),
        });
        let handle = Runtime::register(inner.clone());
        *inner.handle.lock() = Some(handle);
        Self { inner }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> T {
        let cached = match *self.inner.state.read() {
            MemoState::Clean => self.inner.value.read().clone(),
            MemoState::MaybeDirty | MemoState::Dirty => None,
        };
        let value = match cached {
            Some(value) => value,
            None => self.recompute(),
        };

        if let Some(subscriber_id) = ReactiveContext::current_subscriber() {
            for signal_id in self.inner.dependencies.read().iter() {
                ReactiveContext::track_dependency(*signal_id);
                Runtime::add_dependency(*signal_id, subscriber_id);
            }
        }

        value
    }

    pub fn mark_maybe_dirty(&self) {
        self.inner.mark_maybe_dirty();
    }

    pub fn mark_dirty(&self) {
        *self.inner.state.write() = MemoState::Dirty;
    }

    fn recompute(&self) -> T {
        Runtime::clear_dependencies(self.inner.subscriber_id);

        let (value, dependencies) = {
            let _ctx = ReactiveContext::enter(self.inner.subscriber_id);
            let value = (self.inner.compute)();
            (value, ReactiveContext::get_dependencies())
        };

        *self.inner.dependencies.write() = dependencies;
        *self.inner.value.write() = Some(value.clone());
        *self.inner.state.write() = MemoState::Clean;
        value
    }

    pub fn state(&self) -> MemoState {
        *self.inner.state.read()
    }

    pub fn has_value(&self) -> bool {
        self.inner.value.read().is_some()
    }

    /// Number of signals read by the last computation.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependencies.read().len()
    }
}

impl<T> Clone for Memo<T>
where
    T: Clone + Send + Sync + PartialEq + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Debug for Memo<T>
where
    T: Clone + Send + Sync + PartialEq + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.id())
            .field("state", &self.state())
            .field("has_value", &self.has_value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Effect, Signal};
    use std::sync::atomic::AtomicI32;

    #[test]
    fn memo_computes_on_first_access() {
        let calls = Arc::new(AtomicI32::new(0));
        let counter = calls.clone();

        let memo = Memo::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            42
        });

        assert!(!memo.has_value());
        assert_eq!(memo.get(), 42);
        assert_eq!(memo.get(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn memo_is_dirtied_by_its_signal() {
        let signal = Signal::new(2);
        let memo = Memo::new({
            let signal = signal.clone();
            move || signal.get() * 10
        });

        assert_eq!(memo.get(), 20);
        assert_eq!(memo.state(), MemoState::Clean);

        signal.set(3);
        assert_eq!(memo.state(), MemoState::MaybeDirty);
        assert_eq!(memo.get(), 30);
    }

    #[test]
    fn effect_reading_memo_follows_its_inputs() {
        let signal = Signal::new(1);
        let doubled = Memo::new({
            let signal = signal.clone();
            move || signal.get() * 2
        });
        let observed = Arc::new(AtomicI32::new(0));

        let _effect = Effect::new({
            let doubled = doubled.clone();
            let observed = observed.clone();
            move || observed.store(doubled.get(), Ordering::SeqCst)
        });
        assert_eq!(observed.load(Ordering::SeqCst), 2);

        signal.set(5);
        assert_eq!(observed.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn memo_state_transitions() {
        let memo = Memo::new(|| 42);
        assert_eq!(memo.state(), MemoState::Dirty);

        memo.get();
        assert_eq!(memo.state(), MemoState::Clean);

        memo.mark_maybe_dirty();
        assert_eq!(memo.state(), MemoState::MaybeDirty);

        memo.mark_dirty();
        assert_eq!(memo.state(), MemoState::Dirty);

        memo.get();
        assert_eq!(memo.state(), MemoState::Clean);
    }
}
