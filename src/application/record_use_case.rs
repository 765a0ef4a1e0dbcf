// ============================================================
// Layer 2 — RecordUseCase
// ============================================================
// Records a demo network end to end:
//
//   Step 1: Build the Mlp on the CPU backend      (Layer 5 - ml)
//   Step 2: Describe it as a Session              (Layer 4 - recording)
//   Step 3: Run `steps` forward passes inside a
//           recording window                      (Layer 4 / 5)
//   Step 4: Flatten and save the document         (Layer 6 - infra)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::infra::document_store::DocumentStore;
use crate::ml::{demo::DemoModel, model::MlpConfig};
use crate::recording::session::Session;

// ─── Record Configuration ────────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    pub output:     String,
    pub d_input:    usize,
    pub d_hidden:   usize,
    pub d_output:   usize,
    pub batch_size: usize,
    pub steps:      usize,
    pub pretty:     bool,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            output:     "recordings/mlp.json".to_string(),
            d_input:    16,
            d_hidden:   32,
            d_output:   4,
            batch_size: 8,
            steps:      3,
            pretty:     false,
        }
    }
}

/// What a recording run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    pub modules: usize,
    pub tensors: usize,
    pub calls:   usize,
}

pub struct RecordUseCase {
    config: RecordConfig,
}

impl RecordUseCase {
    pub fn new(config: RecordConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<RecordReport> {
        let cfg = &self.config;

        // ── Step 1: Build the model ──────────────────────────────────────────
        let demo = DemoModel::new(&MlpConfig::new(cfg.d_input, cfg.d_hidden, cfg.d_output), cfg.batch_size);

        // ── Step 2: Describe every module ────────────────────────────────────
        let session = Session::new([("mlp", demo.module())]);

        // ── Step 3: Run forward passes with recorders attached ───────────────
        session
            .recording(|| {
                for step in 0..cfg.steps {
                    let dims = demo.step();
                    tracing::debug!("Forward pass {} produced {:?}", step + 1, dims);
                }
            })
            .context("Failed to attach recorders to the model")?;

        // ── Step 4: Save ─────────────────────────────────────────────────────
        let document = session.to_document();
        DocumentStore::new(&cfg.output)
            .save(&document, cfg.pretty)
            .with_context(|| format!("Cannot save recording to '{}'", cfg.output))?;

        let report = RecordReport {
            modules: document.modules.len(),
            tensors: document.tensors.len(),
            calls:   session.ledger().log().len(),
        };
        tracing::info!(
            "Recorded {} calls over {} modules ({} tensors)",
            report.calls,
            report.modules,
            report.tensors
        );
        Ok(report)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_writes_a_loadable_document() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("mlp.json");
        let config = RecordConfig {
            output: output.display().to_string(),
            d_input: 3,
            d_hidden: 5,
            d_output: 2,
            batch_size: 4,
            steps: 2,
            pretty: true,
        };

        let report = RecordUseCase::new(config).execute().unwrap();
        // mlp, fc1, act, fc2: each called once per step
        assert_eq!(report.modules, 4);
        assert_eq!(report.calls, 8);
        // 4 weights + (input, output) for each of 8 calls
        assert_eq!(report.tensors, 4 + 16);

        let session = DocumentStore::new(&output).load_session().unwrap();
        let ledger = session.ledger();
        let fc2 = ledger.module("mlp.fc2").unwrap();
        assert_eq!(fc2.encounters.len(), 2);
        let out = ledger.resolve(&fc2.encounters[1].output).unwrap();
        assert_eq!(out.leaves()[0].shape, Some(vec![4, 2]));
        assert_eq!(ledger.parent_of(fc2).unwrap().name, "mlp");
    }
}
