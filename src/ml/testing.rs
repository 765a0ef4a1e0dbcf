// Test-only host: a module tree built by hand, whose calls are
// triggered explicitly with whatever args/kwargs/output a test
// wants the recorder to see.

use std::cell::Cell;

use indexmap::IndexMap;

use crate::domain::error::{DoctorError, DoctorResult};
use crate::domain::traits::{ForwardHook, HookHandle, HostModule, Observed, TensorMeta};
use crate::domain::tree::Tree;
use crate::ml::hooks::HookRegistry;

pub struct FakeModule {
    class_name: String,
    annotations: IndexMap<String, String>,
    params: Vec<(String, TensorMeta)>,
    children: Vec<(String, FakeModule)>,
    hooks: HookRegistry,
    /// Refuse hook registration once this many hooks were accepted.
    hook_budget: Cell<Option<usize>>,
}

impl FakeModule {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            annotations: IndexMap::new(),
            params: Vec::new(),
            children: Vec::new(),
            hooks: HookRegistry::new(),
            hook_budget: Cell::new(None),
        }
    }

    pub fn child(mut self, name: &str, child: FakeModule) -> Self {
        self.children.push((name.to_string(), child));
        self
    }

    pub fn param(mut self, name: &str, meta: TensorMeta) -> Self {
        self.params.push((name.to_string(), meta.parameter()));
        self
    }

    pub fn annotate(mut self, name: &str, label: &str) -> Self {
        self.annotations.insert(name.to_string(), label.to_string());
        self
    }

    pub fn refuse_hooks(self) -> Self {
        self.hook_budget.set(Some(0));
        self
    }

    pub fn get(&self, name: &str) -> &FakeModule {
        self.children
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
            .unwrap_or_else(|| panic!("no child named {name}"))
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Hooks installed on this module and everything below it.
    pub fn total_hook_count(&self) -> usize {
        self.hooks.len() + self.children.iter().map(|(_, c)| c.total_hook_count()).sum::<usize>()
    }

    pub fn call(&self, args: Tree<Observed>, kwargs: Tree<Observed>, output: Tree<Observed>) {
        self.hooks.fire(&args, &kwargs, &output);
    }
}

impl HostModule for FakeModule {
    fn class_name(&self) -> String {
        self.class_name.clone()
    }

    fn annotations(&self) -> IndexMap<String, String> {
        self.annotations.clone()
    }

    fn named_parameters(&self) -> Vec<(String, TensorMeta)> {
        self.params.clone()
    }

    fn named_children(&self) -> Vec<(String, &dyn HostModule)> {
        self.children
            .iter()
            .map(|(name, child)| (name.clone(), child as &dyn HostModule))
            .collect()
    }

    fn register_forward_hook(&self, hook: ForwardHook) -> DoctorResult<HookHandle> {
        if let Some(budget) = self.hook_budget.get() {
            if budget == 0 {
                return Err(DoctorError::HookRegistration {
                    module: self.class_name.clone(),
                    reason: "hooks disabled".to_string(),
                });
            }
            self.hook_budget.set(Some(budget - 1));
        }
        Ok(self.hooks.install(hook))
    }

    fn remove_forward_hook(&self, handle: HookHandle) {
        self.hooks.remove(handle);
    }
}

pub fn tensor(shape: &[usize]) -> Observed {
    Some(TensorMeta::new(shape.to_vec(), "float32", "cpu"))
}
