// ============================================================
// Layer 5 — Hook Registry
// ============================================================
// burn modules have no notion of forward hooks, so every traced
// module carries a HookRegistry and fires it at the end of its
// own forward().
//
// The registry is interior-mutable (Cell / RefCell): hooks are
// installed through `&self` while the model is shared, as the
// HostModule contract requires. The registry is !Sync, so a
// model being recorded must stay on one thread.

use std::cell::{Cell, RefCell};
use std::fmt;

use crate::domain::traits::{ForwardCall, ForwardHook, HookHandle, Observed};
use crate::domain::tree::Tree;

#[derive(Default)]
pub struct HookRegistry {
    next_handle: Cell<u64>,
    hooks: RefCell<Vec<(HookHandle, ForwardHook)>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hook; it runs after every later call until removed.
    pub fn install(&self, hook: ForwardHook) -> HookHandle {
        let handle = HookHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);
        self.hooks.borrow_mut().push((handle, hook));
        handle
    }

    /// Remove a hook. Returns false if the handle was unknown
    /// (never installed, or already removed).
    pub fn remove(&self, handle: HookHandle) -> bool {
        let mut hooks = self.hooks.borrow_mut();
        let before = hooks.len();
        hooks.retain(|(h, _)| *h != handle);
        hooks.len() != before
    }

    pub fn len(&self) -> usize {
        self.hooks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every installed hook, in installation order.
    pub fn fire(&self, args: &Tree<Observed>, kwargs: &Tree<Observed>, output: &Tree<Observed>) {
        let call = ForwardCall { args, kwargs, output };
        for (_, hook) in self.hooks.borrow_mut().iter_mut() {
            hook(&call);
        }
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry").field("hooks", &self.len()).finish()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_install_fire_remove() {
        let registry = HookRegistry::new();
        let calls = Rc::new(Cell::new(0));

        let counter = Rc::clone(&calls);
        let handle = registry.install(Box::new(move |_: &ForwardCall<'_>| counter.set(counter.get() + 1)));
        assert_eq!(registry.len(), 1);

        let none = Tree::leaf(None);
        registry.fire(&none, &Tree::empty_map(), &none);
        registry.fire(&none, &Tree::empty_map(), &none);
        assert_eq!(calls.get(), 2);

        assert!(registry.remove(handle));
        assert!(!registry.remove(handle));
        assert!(registry.is_empty());

        registry.fire(&none, &Tree::empty_map(), &none);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_handles_are_not_reused() {
        let registry = HookRegistry::new();
        let a = registry.install(Box::new(|_: &ForwardCall<'_>| {}));
        registry.remove(a);
        let b = registry.install(Box::new(|_: &ForwardCall<'_>| {}));
        assert_ne!(a, b);
    }
}
