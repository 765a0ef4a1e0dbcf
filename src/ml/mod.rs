// ============================================================
// Layer 5 — ML / Host Layer (Burn)
// ============================================================
// The only layer that imports burn. It plays the role of the
// "host framework": real modules that run real tensors and
// expose themselves through the HostModule contract.
//
//   hooks.rs   — HookRegistry: install / remove / fire forward
//                hooks on a module that has none of its own
//   model.rs   — TracedLinear, TracedRelu and the demo Mlp,
//                each wrapping burn code and firing its hooks
//                after forward()
//   demo.rs    — DemoModel: an Mlp on the CPU backend fed with
//                random batches, used by the `record` command
//
// Any other framework can be recorded by implementing
// HostModule the same way; nothing above this layer changes.

pub mod hooks;

pub mod model;

pub mod demo;

#[cfg(test)]
pub(crate) mod testing;
