// ============================================================
// Layer 2 — SummaryUseCase
// ============================================================
// Loads a saved document and prints the module forest, one
// line per module, indented by depth:
//
//   mlp (Mlp) — 3 calls
//     mlp.fc1 (Linear) — 3 calls, weights: weight (16 x 32), bias (32)

use std::fmt::Write as _;

use anyhow::{Context, Result};

use crate::domain::figure::ModuleFigure;
use crate::infra::document_store::DocumentStore;
use crate::recording::ledger::Ledger;

pub struct SummaryUseCase {
    path: String,
}

impl SummaryUseCase {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn execute(&self) -> Result<String> {
        let session = DocumentStore::new(&self.path)
            .load_session()
            .with_context(|| format!("Cannot load recording '{}'", self.path))?;
        let ledger = session.ledger();
        Ok(render_summary(&ledger))
    }
}

pub fn render_summary(ledger: &Ledger) -> String {
    let mut out = String::new();
    for root in ledger.roots() {
        write_module(ledger, root, 0, &mut out);
    }
    let _ = writeln!(
        out,
        "{} modules, {} tensors, {} calls",
        ledger.module_count(),
        ledger.tensor_count(),
        ledger.modules().map(|m| m.encounters.len()).sum::<usize>()
    );
    out
}

fn write_module(ledger: &Ledger, module: &ModuleFigure, depth: usize, out: &mut String) {
    let calls = match module.encounters.len() {
        1 => "1 call".to_string(),
        n => format!("{n} calls"),
    };
    let _ = write!(out, "{}{} ({}) — {calls}", "  ".repeat(depth), module.name, module.class_name);

    let weights: Vec<String> = module
        .weights
        .iter()
        .map(|(name, id)| match ledger.tensor(id) {
            Some(tensor) => format!("{name} {}", tensor.shape_label()),
            None => name.clone(),
        })
        .collect();
    if !weights.is_empty() {
        let _ = write!(out, ", weights: {}", weights.join(", "));
    }
    out.push('\n');

    for child in ledger.children_of(module) {
        write_module(ledger, child, depth + 1, out);
    }
}
