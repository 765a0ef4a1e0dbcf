// ============================================================
// dr-tensor
// ============================================================
// Attach recorders to the modules of a neural network, capture
// the shape / dtype / device of everything flowing in and out
// of each call, then save the result as JSON and browse it.
//
// Layers (each one only depends on the layers below it):
//
//   cli/          — Layer 1: clap commands, thin dispatch
//   application/  — Layer 2: record / summary / inspect workflows
//   domain/       — Layer 3: Tree, figures, host contract, errors
//   recording/    — Layer 4: Session, Recorder, Document
//   ml/           — Layer 5: burn-backed hookable host modules
//   infra/        — Layer 6: document persistence on disk

pub mod cli;
pub mod application;
pub mod domain;
pub mod recording;
pub mod ml;
pub mod infra;

pub use domain::error::{DoctorError, DoctorResult};
pub use domain::figure::{ModuleFigure, ModuleId, TensorFigure, TensorId, TensorRole};
pub use domain::traits::{HostModule, TensorMeta};
pub use domain::tree::{map_tree, Tree};
pub use recording::document::Document;
pub use recording::session::Session;
