//! Tracking Context
//!
//! The tracking context records which computation is currently running so
//! that signal reads can register it as a dependent.
//!
//! Each thread keeps its own stack. An entry is either a tracking frame for
//! a subscriber (an effect or memo run) or an untracked frame. Untracked
//! frames are pushed by [`untrack`] and by [`create_root`](super::create_root),
//! so that the body of a root never subscribes an enclosing effect to the
//! signals it reads.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a subscriber (an effect or a memo).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

#[derive(Debug)]
enum Frame {
    Tracking {
        subscriber_id: SubscriberId,
        dependencies: Vec<u64>,
    },
    Untracked,
}

/// Guard that pops its frame when dropped.
///
/// The stack stays balanced even if the computation panics.
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
}

impl ReactiveContext {
    /// Enter a tracking frame for the given subscriber.
    pub fn enter(subscriber_id: SubscriberId) -> Self {
        CONTEXT_STACK.with(|stack| {
            stack.borrow_mut().push(Frame::Tracking {
                subscriber_id,
                dependencies: Vec::new(),
            });
        });

        Self {
            subscriber_id: Some(subscriber_id),
        }
    }

    /// Enter a frame in which signal reads are not tracked.
    pub fn untracked() -> Self {
        CONTEXT_STACK.with(|stack| stack.borrow_mut().push(Frame::Untracked));
        Self {
            subscriber_id: None,
        }
    }

    /// Whether a signal read right now would be tracked.
    pub fn is_active() -> bool {
        Self::current_subscriber().is_some()
    }

    /// The subscriber of the innermost frame, if that frame is tracking.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| match stack.borrow().last() {
            Some(Frame::Tracking { subscriber_id, .. }) => Some(*subscriber_id),
            _ => None,
        })
    }

    /// Record a read of the given signal in the innermost tracking frame.
    pub fn track_dependency(signal_id: u64) {
        CONTEXT_STACK.with(|stack| {
            if let Some(Frame::Tracking { dependencies, .. }) = stack.borrow_mut().last_mut() {
                if !dependencies.contains(&signal_id) {
                    dependencies.push(signal_id);
                }
            }
        });
    }

    /// The signals read so far in the innermost tracking frame.
    pub fn get_dependencies() -> Vec<u64> {
        CONTEXT_STACK.with(|stack| match stack.borrow().last() {
            Some(Frame::Tracking { dependencies, .. }) => dependencies.clone(),
            _ => Vec::new(),
        })
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            let popped_id = match popped {
                Some(Frame::Tracking { subscriber_id, .. }) => Some(subscriber_id),
                _ => None,
            };
            debug_assert_eq!(
                popped_id, self.subscriber_id,
                "ReactiveContext mismatch: expected {:?}, got {:?}",
                self.subscriber_id, popped_id
            );
        });
    }
}

/// Run `f` without tracking any signal it reads.
pub fn untrack<T>(f: impl FnOnce() -> T) -> T {
    let _ctx = ReactiveContext::untracked();
    f()
}
