// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe what was recorded. Nothing in
// here knows about burn, files or the command line.
//
//   tree.rs    — Tree<T>, the container shapes of call arguments
//   figure.rs  — TensorFigure / ModuleFigure and their ids
//   traits.rs  — HostModule, the contract a framework implements
//                so its modules can be described and hooked
//   error.rs   — DoctorError

pub mod tree;

pub mod figure;

pub mod traits;

pub mod error;
