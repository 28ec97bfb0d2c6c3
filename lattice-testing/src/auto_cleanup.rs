//! Sweeping the session after every test.
//!
//! Rust's test harness has no global "after each" hook, so there are two
//! ways in:
//!
//! - a harness that does have one implements [`AfterEachHost`] and calls
//!   [`install_auto_cleanup`] once;
//! - plain `#[test]` functions hold the [`CleanupGuard`] returned by
//!   [`setup`], which sweeps when it goes out of scope.
//!
//! Both are no-ops when `skip_auto_cleanup` is set.

use crate::session::TestSession;

/// Callback registered with an [`AfterEachHost`].
pub type AfterEachHook = Box<dyn FnMut() + Send>;

/// A test environment that can run a callback after each test.
pub trait AfterEachHost {
    fn after_each(&mut self, hook: AfterEachHook);
}

/// Register a sweep of `session` with `host`.
///
/// Returns `false`, registering nothing, when auto cleanup is disabled.
pub fn install_auto_cleanup<H>(host: &mut H, session: &TestSession) -> bool
where
    H: AfterEachHost + ?Sized,
{
    if session.config().skip_auto_cleanup {
        tracing::debug!("auto cleanup disabled, not registering after-each hook");
        return false;
    }
    let session = session.clone();
    host.after_each(Box::new(move || session.cleanup()));
    true
}

/// Sweeps a session when dropped.
#[must_use = "the session is swept when the guard is dropped"]
#[derive(Debug)]
pub struct CleanupGuard {
    session: Option<TestSession>,
}

impl CleanupGuard {
    /// Guard `session`, unless its config disables auto cleanup.
    pub fn new(session: &TestSession) -> Self {
        let armed = !session.config().skip_auto_cleanup;
        Self {
            session: armed.then(|| session.clone()),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.session.is_some()
    }

    /// Drop the guard without sweeping.
    pub fn disarm(mut self) {
        self.session = None;
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.cleanup();
        }
    }
}

/// Guard the current thread's session for the rest of the test.
///
/// ```rust,ignore
/// #[test]
/// fn shows_greeting() {
///     let _cleanup = setup();
///     let view = render(greeting, RenderOptions::default())?;
///     // ...
/// }
/// ```
pub fn setup() -> CleanupGuard {
    CleanupGuard::new(&TestSession::current())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::session::MountHandle;
    use lattice_core::dom::{Document, Node};

    #[derive(Default)]
    struct FakeHost {
        hooks: Vec<AfterEachHook>,
    }

    impl AfterEachHost for FakeHost {
        fn after_each(&mut self, hook: AfterEachHook) {
            self.hooks.push(hook);
        }
    }

    impl FakeHost {
        fn finish_test(&mut self) {
            for hook in &mut self.hooks {
                hook();
            }
        }
    }

    fn session(skip: bool) -> TestSession {
        let config = Config {
            skip_auto_cleanup: skip,
            ..Config::defaults()
        };
        TestSession::with_config(Document::new(), config)
    }

    fn mount_into(session: &TestSession) -> Node {
        let container = Node::element("div");
        session.body().append_child(&container).unwrap();
        session.register(MountHandle::new(Some(container.clone()), None));
        container
    }

    #[test]
    fn host_hook_sweeps_after_each_test() {
        let session = session(false);
        let mut host = FakeHost::default();
        assert!(install_auto_cleanup(&mut host, &session));

        let container = mount_into(&session);
        host.finish_test();

        assert!(session.is_empty());
        assert!(!container.is_connected());
    }

    #[test]
    fn skip_flag_prevents_registration() {
        let session = session(true);
        let mut host = FakeHost::default();
        assert!(!install_auto_cleanup(&mut host, &session));
        assert!(host.hooks.is_empty());
        assert!(!CleanupGuard::new(&session).is_armed());
    }

    #[test]
    fn guard_sweeps_on_drop() {
        let session = session(false);
        {
            let _guard = CleanupGuard::new(&session);
            mount_into(&session);
            assert_eq!(session.len(), 1);
        }
        assert!(session.is_empty());
        assert_eq!(session.body().child_count(), 0);
    }

    #[test]
    fn disarmed_guard_leaves_mounts() {
        let session = session(false);
        let guard = CleanupGuard::new(&session);
        mount_into(&session);
        guard.disarm();
        assert_eq!(session.len(), 1);
    }
}
