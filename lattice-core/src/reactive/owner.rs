//! Owners and Roots
//!
//! An [`Owner`] is a reactive scope. Effects created while an owner is
//! current, and callbacks passed to [`on_cleanup`], are released when that
//! owner is disposed.
//!
//! Each thread keeps a stack of current owners. [`create_root`] pushes a
//! fresh, detached owner for the duration of its closure and hands the
//! closure a [`Disposer`] for it. [`run_with_owner`] re-enters an owner that
//! was captured earlier, which matters during teardown: cleanups that create
//! or read reactive state then resolve against the scope they were written
//! for instead of whatever happens to be current.
//!
//! Disposal is idempotent. The disposed flag is set and the cleanup list
//! taken before any callback runs, so a cleanup may dispose its own owner
//! (or any other) without running anything twice.

use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::context::ReactiveContext;

/// Unique identifier for an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner#{}", self.0)
    }
}

type Cleanup = Box<dyn FnOnce() + Send>;

struct OwnerInner {
    id: OwnerId,
    state: Mutex<OwnerState>,
}

#[derive(Default)]
struct OwnerState {
    cleanups: Vec<Cleanup>,
    disposed: bool,
}

/// Handle to a reactive scope. Clones refer to the same scope.
#[derive(Clone)]
pub struct Owner {
    inner: Arc<OwnerInner>,
}

thread_local! {
    static OWNER_STACK: RefCell<Vec<Owner>> = const { RefCell::new(Vec::new()) };
}

struct OwnerGuard;

impl Drop for OwnerGuard {
    fn drop(&mut self) {
        OWNER_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

impl Owner {
    /// Create a new owner that is not attached to any other scope.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(OwnerInner {
                id: OwnerId::next(),
                state: Mutex::new(OwnerState::default()),
            }),
        }
    }

    /// The owner at the top of this thread's stack.
    pub fn current() -> Option<Owner> {
        OWNER_STACK.with(|stack| stack.borrow().last().cloned())
    }

    pub fn id(&self) -> OwnerId {
        self.inner.id
    }

    /// Run `f` with this owner as the current one.
    pub fn with<T>(&self, f: impl FnOnce() -> T) -> T {
        OWNER_STACK.with(|stack| stack.borrow_mut().push(self.clone()));
        let _guard = OwnerGuard;
        f()
    }

    /// Register a callback to run when this owner is disposed.
    ///
    /// If the owner is already disposed the callback runs immediately.
    pub fn on_cleanup(&self, cleanup: impl FnOnce() + Send + 'static) {
        let mut state = self.inner.state.lock();
        if state.disposed {
            drop(state);
            tracing::debug!(
                owner = %self.id(),
                "cleanup registered on a disposed owner, running it now"
            );
            cleanup();
            return;
        }
        state.cleanups.push(Box::new(cleanup));
    }

    /// Release everything registered on this owner, newest first.
    pub fn dispose(&self) {
        let cleanups = {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            std::mem::take(&mut state.cleanups)
        };

        tracing::trace!(owner = %self.id(), cleanups = cleanups.len(), "disposing owner");
        for cleanup in cleanups.into_iter().rev() {
            cleanup();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }

    /// Number of cleanups waiting for disposal.
    pub fn pending_cleanups(&self) -> usize {
        self.inner.state.lock().cleanups.len()
    }
}

impl Default for Owner {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Owner {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Owner {}

impl fmt::Debug for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Owner")
            .field("id", &self.id())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// A zero-argument function that releases a reactive scope.
#[derive(Clone)]
pub struct Disposer {
    run: Arc<dyn Fn() + Send + Sync>,
}

impl Disposer {
    pub fn new(run: impl Fn() + Send + Sync + 'static) -> Self {
        Self { run: Arc::new(run) }
    }

    /// A disposer that releases `owner`.
    pub fn for_owner(owner: &Owner) -> Self {
        let owner = owner.clone();
        Self::new(move || owner.dispose())
    }

    pub fn dispose(&self) {
        (self.run)()
    }
}

impl fmt::Debug for Disposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disposer").finish_non_exhaustive()
    }
}

/// Run `f` inside a fresh root scope.
///
/// `f` receives the disposer for the root. Signal reads inside `f` are not
/// tracked by any enclosing computation.
pub fn create_root<T>(f: impl FnOnce(Disposer) -> T) -> T {
    let owner = Owner::new();
    let disposer = Disposer::for_owner(&owner);
    owner.with(|| {
        let _ctx = ReactiveContext::untracked();
        f(disposer)
    })
}

/// The owner that is current on this thread.
pub fn get_owner() -> Option<Owner> {
    Owner::current()
}

/// Run `f` with `owner` re-entered as the current owner.
pub fn run_with_owner<T>(owner: &Owner, f: impl FnOnce() -> T) -> T {
    owner.with(f)
}

/// Register a callback on the current owner.
///
/// Outside of any owner the callback can never run; this is logged and the
/// callback is dropped.
pub fn on_cleanup(cleanup: impl FnOnce() + Send + 'static) {
    match Owner::current() {
        Some(owner) => owner.on_cleanup(cleanup),
        None => tracing::warn!("cleanups created outside a `create_root` will never be run"),
    }
}
