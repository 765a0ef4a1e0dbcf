// ============================================================
// Layer 4 — Document
// ============================================================
// The serialised form of a Session. The in-memory graph has
// shared references everywhere (a tensor seen by three modules,
// a child pointing at its parent), so the document flattens it
// into id-keyed tables and every link becomes an id:
//
//   modules             id → name, class, annotations, weight ids
//   tensors             id → shape, dtype, device, is_parameter
//   module_to_parent    id → parent id          (roots omitted)
//   module_to_children  id → [child id, ...]    (leaves omitted)
//   tensor_encounters   id → [{module_id, tensor_role}, ...]
//   module_encounters   id → [{args, kwargs, output}, ...]
//                            (trees whose leaves are tensor ids)
//
// Each tensor appears in `tensors` exactly once, however many
// encounters point at it. Tables keep session order, so saving
// the same session twice gives the same bytes.
//
// Rebuilding goes in dependency order: tensors and modules
// first, so every id resolves; then the forest; then the
// encounters on both sides.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::domain::error::{DoctorError, DoctorResult};
use crate::domain::figure::{
    ModuleEncounter, ModuleFigure, ModuleId, TensorEncounter, TensorFigure, TensorId,
};
use crate::recording::ledger::Ledger;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub id: ModuleId,
    pub name: String,
    pub class_name: String,
    #[serde(default)]
    pub annotations: IndexMap<String, String>,
    #[serde(default)]
    pub weights: IndexMap<String, TensorId>,
}

impl From<&ModuleFigure> for ModuleRecord {
    fn from(figure: &ModuleFigure) -> Self {
        Self {
            id: figure.id.clone(),
            name: figure.name.clone(),
            class_name: figure.class_name.clone(),
            annotations: figure.annotations.clone(),
            weights: figure.weights.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorRecord {
    pub id: TensorId,
    pub shape: Option<Vec<usize>>,
    pub dtype: Option<String>,
    pub device: Option<String>,
    #[serde(default)]
    pub is_parameter: bool,
}

impl From<&TensorFigure> for TensorRecord {
    fn from(figure: &TensorFigure) -> Self {
        Self {
            id: figure.id.clone(),
            shape: figure.shape.clone(),
            dtype: figure.dtype.clone(),
            device: figure.device.clone(),
            is_parameter: figure.is_parameter,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub modules: IndexMap<ModuleId, ModuleRecord>,
    pub tensors: IndexMap<TensorId, TensorRecord>,
    #[serde(default)]
    pub module_to_parent: IndexMap<ModuleId, ModuleId>,
    #[serde(default)]
    pub module_to_children: IndexMap<ModuleId, Vec<ModuleId>>,
    #[serde(default)]
    pub tensor_encounters: IndexMap<TensorId, Vec<TensorEncounter>>,
    #[serde(default)]
    pub module_encounters: IndexMap<ModuleId, Vec<ModuleEncounter>>,
}

impl Document {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let mut doc = Document::default();

        for module in ledger.modules() {
            doc.modules.insert(module.id.clone(), ModuleRecord::from(module));
            if let Some(parent) = &module.parent {
                doc.module_to_parent.insert(module.id.clone(), parent.clone());
            }
            if !module.children.is_empty() {
                doc.module_to_children.insert(module.id.clone(), module.children.clone());
            }
            if !module.encounters.is_empty() {
                doc.module_encounters.insert(module.id.clone(), module.encounters.clone());
            }
        }

        for tensor in ledger.tensors() {
            doc.tensors.insert(tensor.id.clone(), TensorRecord::from(tensor));
            if !tensor.encounters.is_empty() {
                doc.tensor_encounters.insert(tensor.id.clone(), tensor.encounters.clone());
            }
        }

        doc
    }

    /// Rebuild the ledger this document was flattened from.
    /// Fails on the first id that isn't defined in the document.
    pub fn rebuild(&self) -> DoctorResult<Ledger> {
        let mut ledger = Ledger::default();

        for (id, record) in &self.tensors {
            ledger.insert_tensor(TensorFigure::with_id(
                id.clone(),
                record.shape.clone(),
                record.dtype.clone(),
                record.device.clone(),
                record.is_parameter,
            ));
        }

        for (id, record) in &self.modules {
            let mut figure = ModuleFigure::with_id(id.clone(), record.name.clone(), record.class_name.clone());
            figure.annotations = record.annotations.clone();
            for (weight, tensor) in &record.weights {
                ledger.require_tensor(tensor)?;
                figure.weights.insert(weight.clone(), tensor.clone());
            }
            ledger.insert_module(figure);
        }

        for (child, parent) in &self.module_to_parent {
            ledger.require_module(parent)?;
            ledger.module_mut(child)?.parent = Some(parent.clone());
        }

        for (parent, children) in &self.module_to_children {
            for child in children {
                ledger.require_module(child)?;
            }
            ledger.module_mut(parent)?.children.extend(children.iter().cloned());
        }

        for (tensor, encounters) in &self.tensor_encounters {
            for encounter in encounters {
                ledger.require_module(&encounter.module_id)?;
            }
            ledger.tensor_mut(tensor)?.encounters.extend(encounters.iter().cloned());
        }

        for (module, encounters) in &self.module_encounters {
            for encounter in encounters {
                ledger.resolve(&encounter.args)?;
                ledger.resolve(&encounter.kwargs)?;
                ledger.resolve(&encounter.output)?;
            }
            ledger.module_mut(module)?.encounters.extend(encounters.iter().cloned());
        }

        Ok(ledger)
    }

    pub fn to_json(&self, pretty: bool) -> DoctorResult<String> {
        let json = match pretty {
            true => serde_json::to_string_pretty(self)?,
            false => serde_json::to_string(self)?,
        };
        Ok(json)
    }

    pub fn from_json(json: &str) -> DoctorResult<Self> {
        serde_json::from_str(json).map_err(DoctorError::from)
    }
}
