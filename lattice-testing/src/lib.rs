//! Lattice Testing
//!
//! Render Lattice components and hooks in tests, query the DOM they
//! produce the way a user would see it, and tear everything down between
//! tests.
//!
//! - [`render`] mounts a component into a fresh container in the body of
//!   the thread's document and returns a [`RenderResult`] with queries
//!   scoped to that container.
//! - [`render_hook`] runs a hook in its own reactive root, outside of any
//!   DOM tree.
//! - [`cleanup`] disposes every live render and hook and removes their
//!   containers. Hold the guard from [`setup`] to do it automatically.
//!
//! Each test thread has its own document and [`TestSession`], so the default
//! parallel test runner needs no extra care.
//!
//! # Example
//!
//! ```rust,ignore
//! use lattice_testing::{dynamic, el, fire_event, render, setup, RenderOptions, Signal, View};
//!
//! fn counter() -> View {
//!     let count = Signal::new(0);
//!     let (label, setter) = (count.clone(), count);
//!     el("button")
//!         .on("click", move |_| setter.update(|n| n + 1))
//!         .child(dynamic(move || label.get().to_string().into()))
//!         .into()
//! }
//!
//! #[test]
//! fn increments() {
//!     let _cleanup = setup();
//!     let view = render(counter, RenderOptions::default()).unwrap();
//!     let button = view.get_by_role("button").unwrap();
//!     fire_event::click(&button);
//!     assert_eq!(button.text_content(), "1");
//! }
//! ```

pub mod auto_cleanup;
pub mod config;
pub mod error;
pub mod hook;
pub mod queries;
pub mod render;
pub mod session;

pub use auto_cleanup::{install_auto_cleanup, setup, AfterEachHook, AfterEachHost, CleanupGuard};
pub use self::config::Config;
pub use error::{ConfigError, QueryError};
pub use hook::{render_hook, render_hook_with, HookResult, RenderHookOptions};
pub use queries::*;
pub use render::{render, RenderOptions, RenderResult, WrapperProps};
pub use session::{DisposerContext, MountHandle, MountId, TestSession};

pub use lattice_core::dom::{Document, Event, Node};
pub use lattice_core::error::DomError;
pub use lattice_core::reactive::{
    create_effect, create_root, get_owner, on_cleanup, run_with_owner, Disposer, Effect, Memo,
    Owner, Signal,
};
pub use lattice_core::view::{dynamic, el, fragment, text, NodeRef, View};

/// Tear down every render and hook of the current thread's session.
pub fn cleanup() {
    TestSession::current().cleanup();
}
