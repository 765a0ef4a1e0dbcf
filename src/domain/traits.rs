// ============================================================
// Layer 3 — Host Contract
// ============================================================
// dr-tensor doesn't run models. It watches models that some
// host framework runs. HostModule is everything we need from
// that framework, per module:
//
//   - its class name and declared argument types
//   - the parameters it owns directly (not its children's)
//   - its direct children, by attribute name
//   - a way to install and remove a forward hook that is called
//     after every call with (args, kwargs, output)
//
// Values flowing through a call are reported as Tree<Observed>:
// the host walks its own containers and replaces every tensor
// with its TensorMeta, and everything else with None. The hook
// never sees tensor data, so nothing we record keeps an
// activation alive.

use indexmap::IndexMap;

use crate::domain::error::DoctorResult;
use crate::domain::tree::Tree;

/// What the host tells us about one tensor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorMeta {
    pub shape: Vec<usize>,
    pub dtype: String,
    pub device: String,
    pub is_parameter: bool,
    /// Stable identity of the underlying tensor object, if the
    /// host can provide one. Two observations with the same key
    /// share one TensorFigure within a session.
    pub key: Option<String>,
}

impl TensorMeta {
    pub fn new(shape: Vec<usize>, dtype: impl Into<String>, device: impl Into<String>) -> Self {
        Self {
            shape,
            dtype: dtype.into(),
            device: device.into(),
            is_parameter: false,
            key: None,
        }
    }

    pub fn parameter(mut self) -> Self {
        self.is_parameter = true;
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// A leaf of a call tree: a tensor's metadata, or None for
/// anything that isn't a tensor.
pub type Observed = Option<TensorMeta>;

/// Arguments handed to a forward hook after a module call.
#[derive(Debug, Clone, Copy)]
pub struct ForwardCall<'a> {
    pub args: &'a Tree<Observed>,
    pub kwargs: &'a Tree<Observed>,
    pub output: &'a Tree<Observed>,
}

pub type ForwardHook = Box<dyn FnMut(&ForwardCall<'_>)>;

/// Returned by `register_forward_hook`; hands the hook back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookHandle(pub u64);

/// A module of the host framework that can be described and hooked.
pub trait HostModule {
    /// Class name shown in the module header, e.g. `Linear`.
    fn class_name(&self) -> String;

    /// Declared argument name → type label.
    fn annotations(&self) -> IndexMap<String, String> {
        IndexMap::new()
    }

    /// Parameters owned by this module itself, not by its children.
    fn named_parameters(&self) -> Vec<(String, TensorMeta)> {
        Vec::new()
    }

    /// Direct sub-modules, by attribute name.
    fn named_children(&self) -> Vec<(String, &dyn HostModule)> {
        Vec::new()
    }

    fn register_forward_hook(&self, hook: ForwardHook) -> DoctorResult<HookHandle>;

    /// Remove a hook installed by `register_forward_hook`.
    /// Unknown handles are ignored.
    fn remove_forward_hook(&self, handle: HookHandle);
}

/// `root` and every module nested below it, pre-order, each with
/// its dotted path relative to `root` (`""` for `root` itself).
pub fn named_modules(root: &dyn HostModule) -> Vec<(String, &dyn HostModule)> {
    let mut out = Vec::new();
    collect_modules(String::new(), root, &mut out);
    out
}

fn collect_modules<'a>(
    path: String,
    module: &'a dyn HostModule,
    out: &mut Vec<(String, &'a dyn HostModule)>,
) {
    let children = module.named_children();
    out.push((path.clone(), module));
    for (name, child) in children {
        let child_path = if path.is_empty() { name } else { format!("{path}.{name}") };
        collect_modules(child_path, child, out);
    }
}
