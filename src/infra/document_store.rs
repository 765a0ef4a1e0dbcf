// ============================================================
// Layer 6 — Document Store
// ============================================================
// Saves and loads session documents as JSON files.
//
// File layout: one self-contained JSON file per recording, the
// six tables of recording::document at the top level. Nothing
// else is written next to it, so a document can be copied,
// diffed or opened in any JSON viewer.
//
// Parent directories are created on save. Read and parse errors
// are returned as they are; there is no partial recovery.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::error::{DoctorError, DoctorResult};
use crate::recording::document::Document;
use crate::recording::session::Session;

/// A JSON document on disk.
pub struct DocumentStore {
    path: PathBuf,
}

impl DocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `document`, replacing whatever was at the path.
    pub fn save(&self, document: &Document, pretty: bool) -> DoctorResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| DoctorError::Io { path: dir.to_path_buf(), source })?;
        }

        let json = document.to_json(pretty)?;
        fs::write(&self.path, json).map_err(|source| DoctorError::Io { path: self.path.clone(), source })?;

        tracing::info!(
            "Saved {} modules / {} tensors to '{}'",
            document.modules.len(),
            document.tensors.len(),
            self.path.display()
        );
        Ok(())
    }

    pub fn load(&self) -> DoctorResult<Document> {
        let json = fs::read_to_string(&self.path)
            .map_err(|source| DoctorError::Io { path: self.path.clone(), source })?;
        let document = Document::from_json(&json)?;

        tracing::debug!("Loaded document from '{}'", self.path.display());
        Ok(document)
    }

    /// Flatten and save a session in one step.
    pub fn save_session(&self, session: &Session<'_>, pretty: bool) -> DoctorResult<()> {
        self.save(&session.to_document(), pretty)
    }

    /// Load a document and rebuild the session it describes.
    pub fn load_session(&self) -> DoctorResult<Session<'static>> {
        Session::from_document(&self.load()?)
    }
}
