// ============================================================
// Layer 3 — Errors
// ============================================================
// Library layers return DoctorError; the application and CLI
// layers wrap it in anyhow with context about what they were
// doing.
//
// Note what is NOT an error: a module whose dotted name implies
// a parent that isn't in the session. It simply becomes a root.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::figure::{ModuleId, TensorId};

#[derive(Debug, Error)]
pub enum DoctorError {
    /// A document referenced a module id it never defined.
    #[error("unknown module id '{0}'")]
    UnknownModule(ModuleId),

    /// A document referenced a tensor id it never defined.
    #[error("unknown tensor id '{0}'")]
    UnknownTensor(TensorId),

    /// The host refused to install a forward hook.
    #[error("cannot install forward hook on '{module}': {reason}")]
    HookRegistration { module: String, reason: String },

    #[error("cannot access '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON that doesn't parse, or whose trees don't have the
    /// expected shape.
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DoctorResult<T> = Result<T, DoctorError>;
