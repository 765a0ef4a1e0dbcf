use std::any::type_name;
use std::fmt::Debug;

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
};
use indexmap::IndexMap;

use crate::domain::error::DoctorResult;
use crate::domain::traits::{ForwardHook, HookHandle, HostModule, Observed, TensorMeta};
use crate::domain::tree::Tree;
use crate::ml::hooks::HookRegistry;

/// Shape, element type and device of a burn tensor.
/// Reading these doesn't touch the tensor's data.
pub fn describe<B: Backend, const D: usize>(tensor: &Tensor<B, D>) -> TensorMeta {
    TensorMeta::new(
        tensor.dims().to_vec(),
        dtype_label::<B::FloatElem>(),
        device_label(&tensor.device()),
    )
}

fn dtype_label<E>() -> String {
    match type_name::<E>() {
        "f32" => "float32".to_string(),
        "f64" => "float64".to_string(),
        other => other.rsplit("::").next().unwrap_or(other).to_string(),
    }
}

fn device_label<D: Debug>(device: &D) -> String {
    format!("{device:?}").to_lowercase()
}

fn observed<B: Backend, const D: usize>(tensor: &Tensor<B, D>) -> Tree<Observed> {
    Tree::leaf(Some(describe(tensor)))
}

/// Single positional tensor argument, no kwargs.
fn positional<B: Backend, const D: usize>(tensor: &Tensor<B, D>) -> Tree<Observed> {
    Tree::Tuple(vec![observed(tensor)])
}

fn tensor_annotations() -> IndexMap<String, String> {
    IndexMap::from([
        ("input".to_string(), "Tensor<B, D>".to_string()),
        ("return".to_string(), "Tensor<B, D>".to_string()),
    ])
}

// ─── TracedLinear ─────────────────────────────────────────────────────────────

/// burn's Linear plus a hook registry fired after each forward.
#[derive(Debug)]
pub struct TracedLinear<B: Backend> {
    pub inner: Linear<B>,
    hooks: HookRegistry,
}

impl<B: Backend> TracedLinear<B> {
    pub fn new(inner: Linear<B>) -> Self {
        Self { inner, hooks: HookRegistry::new() }
    }

    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        let args = positional(&input);
        let output = self.inner.forward(input);
        self.hooks.fire(&args, &Tree::empty_map(), &observed(&output));
        output
    }
}

impl<B: Backend> HostModule for TracedLinear<B> {
    fn class_name(&self) -> String {
        "Linear".to_string()
    }

    fn annotations(&self) -> IndexMap<String, String> {
        tensor_annotations()
    }

    fn named_parameters(&self) -> Vec<(String, TensorMeta)> {
        let mut params = vec![("weight".to_string(), describe(&self.inner.weight.val()).parameter())];
        if let Some(bias) = &self.inner.bias {
            params.push(("bias".to_string(), describe(&bias.val()).parameter()));
        }
        params
    }

    fn register_forward_hook(&self, hook: ForwardHook) -> DoctorResult<HookHandle> {
        Ok(self.hooks.install(hook))
    }

    fn remove_forward_hook(&self, handle: HookHandle) {
        self.hooks.remove(handle);
    }
}

// ─── TracedRelu ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct TracedRelu {
    hooks: HookRegistry,
}

impl TracedRelu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward<B: Backend, const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        let args = positional(&input);
        let output = burn::tensor::activation::relu(input);
        self.hooks.fire(&args, &Tree::empty_map(), &observed(&output));
        output
    }
}

impl HostModule for TracedRelu {
    fn class_name(&self) -> String {
        "ReLU".to_string()
    }

    fn annotations(&self) -> IndexMap<String, String> {
        tensor_annotations()
    }

    fn register_forward_hook(&self, hook: ForwardHook) -> DoctorResult<HookHandle> {
        Ok(self.hooks.install(hook))
    }

    fn remove_forward_hook(&self, handle: HookHandle) {
        self.hooks.remove(handle);
    }
}

// ─── Mlp ──────────────────────────────────────────────────────────────────────

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct MlpConfig {
    pub d_input: usize,
    pub d_hidden: usize,
    pub d_output: usize,
}

impl MlpConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        Mlp {
            fc1: TracedLinear::new(LinearConfig::new(self.d_input, self.d_hidden).init(device)),
            act: TracedRelu::new(),
            fc2: TracedLinear::new(LinearConfig::new(self.d_hidden, self.d_output).init(device)),
            hooks: HookRegistry::new(),
        }
    }
}

/// fc1 → ReLU → fc2, every stage hookable.
#[derive(Debug)]
pub struct Mlp<B: Backend> {
    pub fc1: TracedLinear<B>,
    pub act: TracedRelu,
    pub fc2: TracedLinear<B>,
    hooks: HookRegistry,
}

impl<B: Backend> Mlp<B> {
    /// input: [batch, d_input] → [batch, d_output]
    pub fn forward(&self, input: Tensor<B, 2>) -> Tensor<B, 2> {
        let args = positional(&input);
        let x = self.fc1.forward(input);
        let x = self.act.forward(x);
        let output = self.fc2.forward(x);
        self.hooks.fire(&args, &Tree::empty_map(), &observed(&output));
        output
    }
}

impl<B: Backend> HostModule for Mlp<B> {
    fn class_name(&self) -> String {
        "Mlp".to_string()
    }

    fn annotations(&self) -> IndexMap<String, String> {
        IndexMap::from([
            ("input".to_string(), "Tensor<B, 2>".to_string()),
            ("return".to_string(), "Tensor<B, 2>".to_string()),
        ])
    }

    fn named_children(&self) -> Vec<(String, &dyn HostModule)> {
        vec![
            ("fc1".to_string(), &self.fc1 as &dyn HostModule),
            ("act".to_string(), &self.act as &dyn HostModule),
            ("fc2".to_string(), &self.fc2 as &dyn HostModule),
        ]
    }

    fn register_forward_hook(&self, hook: ForwardHook) -> DoctorResult<HookHandle> {
        Ok(self.hooks.install(hook))
    }

    fn remove_forward_hook(&self, handle: HookHandle) {
        self.hooks.remove(handle);
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::{named_modules, ForwardCall};

    type TestBackend = burn::backend::NdArray;

    fn model() -> Mlp<TestBackend> {
        let device = Default::default();
        MlpConfig::new(3, 8, 2).init::<TestBackend>(&device)
    }

    #[test]
    fn test_describe_reads_shape_and_dtype() {
        let device = Default::default();
        let t = Tensor::<TestBackend, 2>::zeros([2, 3], &device);
        let meta = describe(&t);
        assert_eq!(meta.shape, vec![2, 3]);
        assert_eq!(meta.dtype, "float32");
        assert!(!meta.is_parameter);
    }

    #[test]
    fn test_module_tree() {
        let model = model();
        let paths: Vec<String> = named_modules(&model).into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["", "fc1", "act", "fc2"]);
    }

    #[test]
    fn test_linear_reports_its_weights() {
        let model = model();
        let params = model.fc1.named_parameters();
        let names: Vec<&str> = params.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["weight", "bias"]);
        // burn stores Linear weights as [d_input, d_output]
        assert_eq!(params[0].1.shape, vec![3, 8]);
        assert_eq!(params[1].1.shape, vec![8]);
        assert!(params.iter().all(|(_, meta)| meta.is_parameter));
        assert!(model.act.named_parameters().is_empty());
    }

    #[test]
    fn test_hooks_fire_children_first() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let model = model();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (name, module) in named_modules(&model) {
            let order = Rc::clone(&order);
            module
                .register_forward_hook(Box::new(move |call: &ForwardCall<'_>| {
                    let shape = call.output.leaves()[0].as_ref().map(|m| m.shape.clone());
                    order.borrow_mut().push((name.clone(), shape));
                }))
                .unwrap();
        }

        let device = Default::default();
        model.forward(Tensor::<TestBackend, 2>::ones([4, 3], &device));

        let order = order.borrow();
        let names: Vec<&str> = order.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["fc1", "act", "fc2", ""]);
        assert_eq!(order[0].1, Some(vec![4, 8]));
        assert_eq!(order[3].1, Some(vec![4, 2]));
    }
}
