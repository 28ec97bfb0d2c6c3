//! Reactive Primitives
//!
//! This module implements the reactive system: signals, memos, effects and
//! the owners that scope them.
//!
//! # Concepts
//!
//! ## Signals
//!
//! A Signal is a container for mutable state. Reading it inside a memo or
//! effect registers that computation as a dependent; writing it re-runs the
//! dependent effects.
//!
//! ## Memos
//!
//! A Memo is a derived value that caches its result and recomputes only
//! after one of its inputs changed.
//!
//! ## Effects
//!
//! An Effect is a side-effecting computation, such as keeping a DOM node in
//! sync with state. Effects run once when created and again after every
//! change to what they read.
//!
//! ## Owners
//!
//! An Owner is a scope that collects effects and cleanup callbacks so they
//! can be released together. [`create_root`] opens a fresh scope and hands
//! back its [`Disposer`].
//!
//! # Implementation Notes
//!
//! Dependency tracking and the owner stack are thread-local. Updates are
//! synchronous: `Signal::set` returns after every dependent effect re-ran.

mod context;
mod effect;
mod memo;
mod owner;
mod runtime;
mod signal;

pub use context::{untrack, ReactiveContext, SubscriberId};
pub use effect::{create_effect, Effect};
pub use memo::{Memo, MemoState};
pub use owner::{
    create_root, get_owner, on_cleanup, run_with_owner, Disposer, Owner, OwnerId,
};
pub use runtime::{Reactive, ReactiveHandle, Runtime};
pub use signal::Signal;
