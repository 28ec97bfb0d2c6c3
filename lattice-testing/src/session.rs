//! The cleanup registry.
//!
//! A [`TestSession`] remembers every render and hook that is still live and
//! tears them all down in [`TestSession::cleanup`]. Each thread has a default
//! session bound to its default document, so tests running on parallel
//! threads never see each other's mounts. Tests of the registry itself can
//! build isolated sessions with [`TestSession::new`].
//!
//! Teardown of one handle:
//!
//! 1. run the disposer, re-entering the captured owner when there is one
//!    (a handle without a disposer is logged and skipped)
//! 2. detach the container if it is a direct child of the session's body
//! 3. forget the handle
//!
//! A handle leaves the registry before its disposer runs and no lock is held
//! while disposing, so a disposer may call back into the session.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use lattice_core::dom::{document, Document, Node};
use lattice_core::reactive::{run_with_owner, Disposer, Owner};
use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::queries::{get_queries_for_element, BoundQueries, QuerySet};

static MOUNT_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Identity of a registered mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MountId(u64);

impl MountId {
    fn next() -> Self {
        Self(MOUNT_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mount#{}", self.0)
    }
}

/// How to release a mount.
#[derive(Clone, Debug)]
pub enum DisposerContext {
    /// Call the disposer directly.
    Bare(Disposer),
    /// Call the disposer with the owner re-entered.
    Scoped(Disposer, Owner),
}

impl DisposerContext {
    pub fn new(disposer: Disposer, owner: Option<Owner>) -> Self {
        match owner {
            Some(owner) => DisposerContext::Scoped(disposer, owner),
            None => DisposerContext::Bare(disposer),
        }
    }

    pub fn disposer(&self) -> &Disposer {
        match self {
            DisposerContext::Bare(disposer) | DisposerContext::Scoped(disposer, _) => disposer,
        }
    }

    pub fn owner(&self) -> Option<&Owner> {
        match self {
            DisposerContext::Bare(_) => None,
            DisposerContext::Scoped(_, owner) => Some(owner),
        }
    }

    fn dispose(self) {
        match self {
            DisposerContext::Bare(disposer) => disposer.dispose(),
            DisposerContext::Scoped(disposer, owner) => {
                run_with_owner(&owner, || disposer.dispose())
            }
        }
    }
}

/// One live render or hook.
#[derive(Debug)]
pub struct MountHandle {
    id: MountId,
    container: Option<Node>,
    context: Option<DisposerContext>,
}

impl MountHandle {
    pub fn new(container: Option<Node>, context: Option<DisposerContext>) -> Self {
        Self {
            id: MountId::next(),
            container,
            context,
        }
    }

    pub fn id(&self) -> MountId {
        self.id
    }

    pub fn container(&self) -> Option<&Node> {
        self.container.as_ref()
    }

    pub fn context(&self) -> Option<&DisposerContext> {
        self.context.as_ref()
    }
}

struct SessionInner {
    document: Document,
    config: RwLock<Config>,
    handles: Mutex<IndexMap<MountId, MountHandle>>,
}

/// Registry of live mounts plus the document they render into.
#[derive(Clone)]
pub struct TestSession {
    inner: Arc<SessionInner>,
}

thread_local! {
    static CURRENT: TestSession = TestSession::with_document(document());
}

impl TestSession {
    /// The default session of the current thread.
    pub fn current() -> TestSession {
        CURRENT.with(Clone::clone)
    }

    /// An isolated session with its own document.
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    /// A session rendering into `document`, configured from the environment.
    pub fn with_document(document: Document) -> Self {
        let config = Config::load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "invalid testing config, using defaults");
            Config::defaults()
        });
        Self::with_config(document, config)
    }

    pub fn with_config(document: Document, config: Config) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                document,
                config: RwLock::new(config),
                handles: Mutex::new(IndexMap::new()),
            }),
        }
    }

    pub fn document(&self) -> &Document {
        &self.inner.document
    }

    pub fn body(&self) -> &Node {
        self.inner.document.body()
    }

    pub fn config(&self) -> Config {
        self.inner.config.read().clone()
    }

    pub fn set_config(&self, config: Config) {
        *self.inner.config.write() = config;
    }

    /// Queries bound to the document body.
    pub fn screen(&self) -> BoundQueries {
        get_queries_for_element(self.body(), QuerySet::from_config(&self.config()))
    }

    /// Add a handle to the registry.
    pub fn register(&self, handle: MountHandle) -> MountId {
        let id = handle.id;
        self.inner.handles.lock().insert(id, handle);
        tracing::debug!(mount = %id, "registered mount");
        id
    }

    pub fn contains(&self, id: MountId) -> bool {
        self.inner.handles.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tear down every registered mount.
    ///
    /// Calling this again, or from inside a disposer, is harmless.
    pub fn cleanup(&self) {
        let mut swept = 0usize;
        loop {
            let next = self.inner.handles.lock().shift_remove_index(0);
            let Some((_, handle)) = next else {
                break;
            };
            self.teardown(handle);
            swept += 1;
        }
        if swept > 0 {
            tracing::debug!(swept, "session cleaned up");
        }
    }

    /// Tear down a single mount. Returns `false` if it was not registered.
    pub fn cleanup_mount(&self, id: MountId) -> bool {
        let handle = self.inner.handles.lock().shift_remove(&id);
        match handle {
            Some(handle) => {
                self.teardown(handle);
                true
            }
            None => false,
        }
    }

    fn teardown(&self, handle: MountHandle) {
        let MountHandle {
            id,
            container,
            context,
        } = handle;

        match context {
            Some(context) => context.dispose(),
            None => tracing::warn!(mount = %id, "mount has no disposer, skipping disposal"),
        }

        if let Some(container) = container {
            if container.parent().as_ref() == Some(self.body()) {
                container.remove();
            }
        }
        tracing::debug!(mount = %id, "mount torn down");
    }
}

impl Default for TestSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TestSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestSession")
            .field("mounts", &self.len())
            .field("body", self.body())
            .finish()
    }
}
