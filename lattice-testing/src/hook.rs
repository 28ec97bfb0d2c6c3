//! Running reactive hooks outside of any DOM tree.

use lattice_core::reactive::{create_root, get_owner, Disposer, Owner};

use crate::session::{DisposerContext, MountHandle, TestSession};

/// What a hook returned, plus the means to tear it down.
#[derive(Debug)]
pub struct HookResult<R> {
    pub result: R,
    /// Disposes the hook's root.
    pub cleanup: Disposer,
    pub owner: Option<Owner>,
}

/// Arguments for [`TestSession::render_hook_with`].
///
/// Use a tuple to pass several arguments.
#[derive(Debug, Clone, Default)]
pub struct RenderHookOptions<P> {
    pub initial_props: P,
}

impl<P> RenderHookOptions<P> {
    pub fn new(initial_props: P) -> Self {
        Self { initial_props }
    }
}

impl TestSession {
    /// Run `hook` in a fresh root and register the root for cleanup.
    pub fn render_hook<R, F>(&self, hook: F) -> HookResult<R>
    where
        F: FnOnce() -> R,
    {
        self.render_hook_with(|()| hook(), RenderHookOptions::new(()))
    }

    /// Run `hook` with `options.initial_props` in a fresh root.
    pub fn render_hook_with<P, R, F>(
        &self,
        hook: F,
        options: RenderHookOptions<P>,
    ) -> HookResult<R>
    where
        F: FnOnce(P) -> R,
    {
        let (result, cleanup, owner) = create_root(|dispose| {
            let owner = get_owner();
            (hook(options.initial_props), dispose, owner)
        });
        self.register(MountHandle::new(
            None,
            Some(DisposerContext::Bare(cleanup.clone())),
        ));
        HookResult {
            result,
            cleanup,
            owner,
        }
    }
}

/// Run `hook` in the current thread's session.
pub fn render_hook<R, F>(hook: F) -> HookResult<R>
where
    F: FnOnce() -> R,
{
    TestSession::current().render_hook(hook)
}

/// Run `hook` with props in the current thread's session.
pub fn render_hook_with<P, R, F>(hook: F, options: RenderHookOptions<P>) -> HookResult<R>
where
    F: FnOnce(P) -> R,
{
    TestSession::current().render_hook_with(hook, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use lattice_core::dom::Document;
    use lattice_core::reactive::{create_effect, Signal};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn registers_a_bare_handle_without_container() {
        let session = TestSession::with_config(Document::new(), Config::defaults());
        let hook = session.render_hook(|| 1);

        assert_eq!(hook.result, 1);
        assert!(hook.owner.is_some());
        assert_eq!(session.len(), 1);
        assert_eq!(session.body().child_count(), 0);

        session.cleanup();
        assert!(hook.owner.unwrap().is_disposed());
    }

    #[test]
    fn props_are_passed_through() {
        let session = TestSession::with_config(Document::new(), Config::defaults());
        let hook = session.render_hook_with(
            |(a, b): (i32, &str)| format!("{b}{a}"),
            RenderHookOptions::new((7, "#")),
        );
        assert_eq!(hook.result, "#7");
    }

    #[test]
    fn cleanup_stops_hook_effects() {
        let session = TestSession::with_config(Document::new(), Config::defaults());
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();

        let HookResult { result: count, .. } = session.render_hook(move || {
            let count = Signal::new(0);
            let seen = count.clone();
            create_effect(move || {
                seen.get();
                counter.fetch_add(1, Ordering::SeqCst);
            });
            count
        });

        count.set(1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        session.cleanup();
        count.set(2);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
