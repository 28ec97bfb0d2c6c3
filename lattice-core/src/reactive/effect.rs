//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever its
//! dependencies change.
//!
//! 1. When created, the effect runs immediately to establish its initial
//!    dependencies. Mounting relies on this: by the time `mount` returns,
//!    every effect created during the first render has run once.
//! 2. When any signal it read changes, the runtime re-runs it synchronously.
//! 3. Each run happens inside its own child [`Owner`]. Cleanups and nested
//!    effects registered during a run are released before the next run and
//!    when the effect is disposed.
//! 4. An effect created while an owner is current is disposed together with
//!    that owner. Without an owner it lives as long as its handle.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::context::{ReactiveContext, SubscriberId};
use super::owner::Owner;
use super::runtime::{Reactive, ReactiveHandle, Runtime};

static EFFECT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_effect_id() -> u64 {
    EFFECT_ID_COUNTER.fetch_add(1, Ordering::Relaxed)
}

struct EffectInner {
    id: u64,
    subscriber_id: SubscriberId,
    run: Box<dyn Fn() + Send + Sync>,
    /// Owner of the most recent run.
    run_owner: Mutex<Option<Owner>>,
    dependency_count: AtomicUsize,
    disposed: AtomicBool,
    run_count: AtomicUsize,
    handle: Mutex<Option<ReactiveHandle>>,
}

impl EffectInner {
    fn execute(&self) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }

        let previous = self.run_owner.lock().take();
        if let Some(previous) = previous {
            previous.dispose();
        }
        Runtime::clear_dependencies(self.subscriber_id);

        let run_owner = Owner::new();
        *self.run_owner.lock() = Some(run_owner.clone());

        let dependencies = run_owner.with(|| {
            let _ctx = ReactiveContext::enter(self.subscriber_id);
            (self.run)();
            ReactiveContext::get_dependencies()
        });

        self.dependency_count
            .store(dependencies.len(), Ordering::SeqCst);
        self.run_count.fetch_add(1, Ordering::SeqCst);
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }

        let run_owner = self.run_owner.lock().take();
        if let Some(run_owner) = run_owner {
            run_owner.dispose();
        }
        drop(self.handle.lock().take());
        self.dependency_count.store(0, Ordering::SeqCst);
        tracing::trace!(effect = self.id, "effect disposed");
    }
}

impl Reactive for EffectInner {
    fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    fn mark_maybe_dirty(&self) {}

    fn schedule(&self) {
        self.execute();
    }

    fn is_eager(&self) -> bool {
        true
    }
}

/// A side-effecting computation that re-runs when its dependencies change.
///
/// ```rust,ignore
/// let count = Signal::new(0);
/// let seen = count.clone();
/// let _effect = Effect::new(move || println!("Count is: {}", seen.get()));
/// count.set(5); // prints "Count is: 5"
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Arc<EffectInner>,
}

impl Effect {
    /// Create an effect and run it immediately.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self::new_lazy(run);
        effect.execute();
        effect
    }

    /// Create an effect without running it. Call [`Effect::execute`] to start it.
    pub fn new_lazy<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let inner = Arc::new(EffectInner {
            id: next_effect_id(),
            subscriber_id: SubscriberId::new(),
            run: Box::new(run),
            run_owner: Mutex::new(None),
            dependency_count: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
            run_count: AtomicUsize::new(0),
            handle: Mutex::new(None),
        });

        let handle = Runtime::register(inner.clone());
        *inner.handle.lock() = Some(handle);

        if let Some(owner) = Owner::current() {
            let owned = inner.clone();
            owner.on_cleanup(move || owned.dispose());
        }

        Self { inner }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn subscriber_id(&self) -> SubscriberId {
        self.inner.subscriber_id
    }

    /// Run the effect now, tracking the signals it reads.
    pub fn execute(&self) {
        self.inner.execute();
    }

    /// Re-run the effect as if a dependency had changed.
    pub fn schedule(&self) {
        self.inner.schedule();
    }

    /// Stop the effect and release everything its last run registered.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Number of signals read during the last run.
    pub fn dependency_count(&self) -> usize {
        self.inner.dependency_count.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Create an effect owned by the current owner.
pub fn create_effect<F>(run: F) -> Effect
where
    F: Fn() + Send + Sync + 'static,
{
    Effect::new(run)
}
