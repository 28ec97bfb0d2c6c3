//! Lattice Core
//!
//! This crate provides the core runtime for the Lattice reactive UI framework.
//! It implements:
//!
//! - Reactive primitives (signals, memos, effects) with owner-scoped cleanup
//! - An in-memory, thread-safe DOM
//! - Views and the mount / hydrate pipeline that attaches them to the DOM
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Core reactive primitives, dependency tracking and owners
//! - `dom`: Nodes, documents, events and HTML serialization
//! - `view`: View descriptions, `mount`, `hydrate` and `render_to_string`
//! - `error`: Errors raised by DOM mutations
//!
//! # Example
//!
//! ```rust,ignore
//! use lattice_core::dom::document;
//! use lattice_core::reactive::Signal;
//! use lattice_core::view::{dynamic, el, mount};
//!
//! let count = Signal::new(0);
//! let label = count.clone();
//!
//! let dispose = mount(
//!     move || el("p").child(dynamic(move || label.get().to_string().into())).into(),
//!     document().body(),
//! )?;
//!
//! count.set(5);
//! // <p>5</p>
//! dispose.dispose();
//! ```

pub mod dom;
pub mod error;
pub mod reactive;
pub mod view;

pub use error::{DomError, Result};
