//! In-memory DOM
//!
//! A small, thread-safe DOM used as the mounting target for views and as
//! the surface that tests query.
//!
//! - [`Node`]: shared handle to a document, element, text or comment node
//! - [`Document`]: the `html`/`head`/`body` shell, one default per thread
//! - [`Event`]: synthetic events with bubbling
//! - [`html`]: markup serialization (`inner_html` / `outer_html`)

mod document;
mod event;
pub mod html;
mod node;

pub use document::{document, Document};
pub use event::{Event, EventHandler};
pub use node::{Node, NodeId, NodeKind};
