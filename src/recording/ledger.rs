// ============================================================
// Layer 4 — Ledger
// ============================================================
// Everything a Session knows, in flat id-keyed tables:
//
//   modules  — ModuleId → ModuleFigure, in construction order
//   tensors  — TensorId → TensorFigure, in discovery order
//   log      — one LogRecord per recorded call, in call order
//
// The Session and every Recorder share one Ledger through a
// SharedLedger (recording::recorder), which queues calls that
// arrive while a reader holds `Session::ledger()`.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::debug;

use crate::domain::error::{DoctorError, DoctorResult};
use crate::domain::figure::{ModuleFigure, ModuleId, TensorEncounter, TensorFigure, TensorId, TensorRole};
use crate::domain::traits::{Observed, TensorMeta};
use crate::domain::tree::Tree;

/// One recorded call, flattened, in the session-wide log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub name: String,
    pub module: ModuleId,
    pub args: Tree<TensorId>,
    pub kwargs: Tree<TensorId>,
    pub output: Tree<TensorId>,
}

#[derive(Debug, Default)]
pub struct Ledger {
    modules: IndexMap<ModuleId, ModuleFigure>,
    by_name: HashMap<String, ModuleId>,
    tensors: IndexMap<TensorId, TensorFigure>,
    /// Host identity key → figure already created for it.
    keyed: HashMap<String, TensorId>,
    log: Vec<LogRecord>,
}

impl Ledger {
    // ── Reading ──────────────────────────────────────────────────────────────

    /// All modules, in the order the session enumerated them.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleFigure> {
        self.modules.values()
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn module(&self, name: &str) -> Option<&ModuleFigure> {
        self.by_name.get(name).and_then(|id| self.modules.get(id))
    }

    pub fn module_by_id(&self, id: &ModuleId) -> Option<&ModuleFigure> {
        self.modules.get(id)
    }

    /// Modules without a parent, in session order.
    pub fn roots(&self) -> impl Iterator<Item = &ModuleFigure> {
        self.modules.values().filter(|m| m.is_root())
    }

    pub fn parent_of(&self, module: &ModuleFigure) -> Option<&ModuleFigure> {
        module.parent.as_ref().and_then(|id| self.modules.get(id))
    }

    pub fn children_of<'a>(&'a self, module: &'a ModuleFigure) -> impl Iterator<Item = &'a ModuleFigure> {
        module.children.iter().filter_map(|id| self.modules.get(id))
    }

    pub fn tensors(&self) -> impl Iterator<Item = &TensorFigure> {
        self.tensors.values()
    }

    pub fn tensor_count(&self) -> usize {
        self.tensors.len()
    }

    pub fn tensor(&self, id: &TensorId) -> Option<&TensorFigure> {
        self.tensors.get(id)
    }

    pub fn log(&self) -> &[LogRecord] {
        &self.log
    }

    /// Swap every id in `tree` for its figure.
    pub fn resolve(&self, tree: &Tree<TensorId>) -> DoctorResult<Tree<&TensorFigure>> {
        tree.try_map(&mut |id: &TensorId| {
            self.tensors
                .get(id)
                .ok_or_else(|| DoctorError::UnknownTensor(id.clone()))
        })
    }

    // ── Writing ──────────────────────────────────────────────────────────────

    /// Add a module. A module with the same name replaces the
    /// previous one in the name index.
    pub(crate) fn insert_module(&mut self, figure: ModuleFigure) {
        self.by_name.insert(figure.name.clone(), figure.id.clone());
        self.modules.insert(figure.id.clone(), figure);
    }

    pub(crate) fn insert_tensor(&mut self, figure: TensorFigure) -> TensorId {
        let id = figure.id.clone();
        self.tensors.insert(id.clone(), figure);
        id
    }

    /// Figure for an observed tensor: the one already created for
    /// the same host key, or a new one.
    pub(crate) fn insert_meta(&mut self, meta: &TensorMeta) -> TensorId {
        let existing = meta.key.as_ref().and_then(|key| self.keyed.get(key)).cloned();
        if let Some(id) = existing {
            return id;
        }
        let id = self.insert_tensor(TensorFigure::from_meta(meta));
        if let Some(key) = &meta.key {
            self.keyed.insert(key.clone(), id.clone());
        }
        id
    }

    /// Turn one leaf of a call into a figure and note that
    /// `module` saw it in `role`.
    pub(crate) fn observe(&mut self, leaf: &Observed, module: &ModuleId, role: TensorRole) -> TensorId {
        let id = match leaf {
            Some(meta) => self.insert_meta(meta),
            None => self.insert_tensor(TensorFigure::absent()),
        };
        if let Some(tensor) = self.tensors.get_mut(&id) {
            tensor.encounters.push(TensorEncounter { module_id: module.clone(), tensor_role: role });
        }
        id
    }

    pub(crate) fn push_log(&mut self, record: LogRecord) {
        self.log.push(record);
    }

    pub(crate) fn module_mut(&mut self, id: &ModuleId) -> DoctorResult<&mut ModuleFigure> {
        self.modules
            .get_mut(id)
            .ok_or_else(|| DoctorError::UnknownModule(id.clone()))
    }

    pub(crate) fn tensor_mut(&mut self, id: &TensorId) -> DoctorResult<&mut TensorFigure> {
        self.tensors
            .get_mut(id)
            .ok_or_else(|| DoctorError::UnknownTensor(id.clone()))
    }

    pub(crate) fn require_module(&self, id: &ModuleId) -> DoctorResult<()> {
        match self.modules.contains_key(id) {
            true => Ok(()),
            false => Err(DoctorError::UnknownModule(id.clone())),
        }
    }

    pub(crate) fn require_tensor(&self, id: &TensorId) -> DoctorResult<()> {
        match self.tensors.contains_key(id) {
            true => Ok(()),
            false => Err(DoctorError::UnknownTensor(id.clone())),
        }
    }

    /// Hang every module under the module named like its name
    /// minus the last segment. If no such module exists the
    /// module stays a root.
    pub(crate) fn link_hierarchy(&mut self) {
        let links: Vec<(ModuleId, ModuleId)> = self
            .modules
            .values()
            .filter_map(|module| {
                let parent_name = module.parent_name()?;
                match self.by_name.get(parent_name) {
                    Some(parent) => Some((module.id.clone(), parent.clone())),
                    None => {
                        debug!(module = %module.name, "parent '{}' not in session, kept as root", parent_name);
                        None
                    }
                }
            })
            .collect();

        for (child, parent) in links {
            if let Some(module) = self.modules.get_mut(&parent) {
                module.children.push(child.clone());
            }
            if let Some(module) = self.modules.get_mut(&child) {
                module.parent = Some(parent);
            }
        }
    }
}
