// ============================================================
// Layer 3 — Figures (Descriptors)
// ============================================================
// A "figure" is the metadata shell of something live:
//
//   TensorFigure  — shape, dtype, device of one observed tensor
//                   (never the tensor data itself)
//   ModuleFigure  — name, class, annotations and weights of one
//                   module, plus its place in the module forest
//
// Figures never point at each other directly. Every link goes
// through an id (ModuleId / TensorId) into a table owned by the
// Session, so the graph has no reference cycles and the JSON
// document uses the same ids.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::traits::TensorMeta;
use crate::domain::tree::Tree;

/// A random identifier in the canonical UUID v4 text form.
fn fresh_id() -> String {
    let bits: u128 = rand::random();
    // Version nibble = 4, variant bits = 10.
    let bits = (bits & !(0xF_u128 << 76)) | (0x4_u128 << 76);
    let bits = (bits & !(0x3_u128 << 62)) | (0x2_u128 << 62);
    format!(
        "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
        (bits >> 96) as u32,
        ((bits >> 80) & 0xFFFF) as u16,
        ((bits >> 64) & 0xFFFF) as u16,
        ((bits >> 48) & 0xFFFF) as u16,
        (bits & 0xFFFF_FFFF_FFFF) as u64,
    )
}

macro_rules! figure_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn fresh() -> Self {
                Self(fresh_id())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

figure_id!(
    /// Identifier of a TensorFigure, unique within a session.
    TensorId
);
figure_id!(
    /// Identifier of a ModuleFigure, unique within a session.
    ModuleId
);

/// Which part of a module call a tensor was seen in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TensorRole {
    Args,
    Kwargs,
    Output,
}

impl fmt::Display for TensorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TensorRole::Args => "args",
            TensorRole::Kwargs => "kwargs",
            TensorRole::Output => "output",
        })
    }
}

/// One module call that touched a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorEncounter {
    pub module_id: ModuleId,
    pub tensor_role: TensorRole,
}

/// One recorded call of a module: the three trees of tensor ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleEncounter {
    pub args: Tree<TensorId>,
    pub kwargs: Tree<TensorId>,
    pub output: Tree<TensorId>,
}

impl ModuleEncounter {
    /// Every tensor id in args, kwargs and output, in that order.
    pub fn tensor_ids(&self) -> impl Iterator<Item = &TensorId> {
        self.args
            .leaves()
            .into_iter()
            .chain(self.kwargs.leaves())
            .chain(self.output.leaves())
    }
}

// ─── TensorFigure ─────────────────────────────────────────────────────────────

/// Metadata of one observed tensor.
///
/// A figure with `shape == None` stands for "no tensor here"
/// (a `None` output, a non-tensor argument) and then always has
/// `dtype == None` and `device == None`.
#[derive(Debug, Clone, PartialEq)]
pub struct TensorFigure {
    pub id: TensorId,
    pub shape: Option<Vec<usize>>,
    pub dtype: Option<String>,
    pub device: Option<String>,
    pub is_parameter: bool,
    /// Every module call that touched this tensor, in discovery order.
    pub encounters: Vec<TensorEncounter>,
}

impl TensorFigure {
    /// Figure for a leaf that isn't a tensor.
    pub fn absent() -> Self {
        Self::with_id(TensorId::fresh(), None, None, None, false)
    }

    /// Figure for an observed tensor. Only the metadata is kept.
    pub fn from_meta(meta: &TensorMeta) -> Self {
        Self::with_id(
            TensorId::fresh(),
            Some(meta.shape.clone()),
            Some(meta.dtype.clone()),
            Some(meta.device.clone()),
            meta.is_parameter,
        )
    }

    /// Build a figure with a known id, normalising the
    /// "no tensor" case so dtype and device follow shape.
    pub fn with_id(
        id: TensorId,
        shape: Option<Vec<usize>>,
        dtype: Option<String>,
        device: Option<String>,
        is_parameter: bool,
    ) -> Self {
        let (dtype, device) = match shape {
            Some(_) => (dtype, device),
            None => (None, None),
        };
        Self { id, shape, dtype, device, is_parameter, encounters: Vec::new() }
    }

    pub fn is_present(&self) -> bool {
        self.shape.is_some()
    }

    /// Number of elements; 0 when there is no tensor.
    pub fn numel(&self) -> usize {
        self.shape.as_ref().map_or(0, |dims| dims.iter().product())
    }

    pub fn rank(&self) -> usize {
        self.shape.as_ref().map_or(0, Vec::len)
    }

    /// Size of the leading dimension; 0 for scalars and absent tensors.
    pub fn len(&self) -> usize {
        self.shape.as_ref().and_then(|dims| dims.first().copied()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(2 x 3)` style rendering of the shape.
    pub fn shape_label(&self) -> String {
        match &self.shape {
            Some(dims) => {
                let dims: Vec<String> = dims.iter().map(ToString::to_string).collect();
                format!("({})", dims.join(" x "))
            }
            None => "(none)".to_string(),
        }
    }
}

impl fmt::Display for TensorFigure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_present() {
            return f.write_str("(none)");
        }
        let kind = if self.is_parameter { "param" } else { "tensor" };
        write!(
            f,
            "{kind} {} {} @ {}",
            self.shape_label(),
            self.dtype.as_deref().unwrap_or("?"),
            self.device.as_deref().unwrap_or("?"),
        )
    }
}

// ─── ModuleFigure ─────────────────────────────────────────────────────────────

/// Metadata of one module and its place in the module forest.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleFigure {
    pub id: ModuleId,
    /// Dotted path such as `net.encoder.0`, unique in a session.
    pub name: String,
    pub class_name: String,
    /// Parameter name → type label, as declared by the module.
    pub annotations: IndexMap<String, String>,
    /// Weight name → id of its TensorFigure in the session table.
    pub weights: IndexMap<String, TensorId>,
    pub parent: Option<ModuleId>,
    pub children: Vec<ModuleId>,
    /// One entry per recorded call, in call order.
    pub encounters: Vec<ModuleEncounter>,
}

impl ModuleFigure {
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self::with_id(ModuleId::fresh(), name, class_name)
    }

    pub fn with_id(id: ModuleId, name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            class_name: class_name.into(),
            annotations: IndexMap::new(),
            weights: IndexMap::new(),
            parent: None,
            children: Vec::new(),
            encounters: Vec::new(),
        }
    }

    /// Depth in the name hierarchy: `net` is 1, `net.fc1` is 2.
    pub fn hierarchy(&self) -> usize {
        self.name.split('.').count()
    }

    /// Name of the module this one would hang under, if any.
    pub fn parent_name(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(parent, _)| parent)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn last_encounter(&self) -> Option<&ModuleEncounter> {
        self.encounters.last()
    }
}

impl fmt::Display for ModuleFigure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let weights: Vec<&str> = self.weights.keys().map(String::as_str).collect();
        write!(f, "{} ({}), weights: [{}]", self.name, self.class_name, weights.join(", "))
    }
}
