// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that don't belong to any one layer:
//
//   document_store.rs — writes session documents to JSON files
//                       and reads them back, with the file path
//                       in every error
//
// Keeping file I/O here means the recording layer never
// touches the filesystem and stays testable in memory.

/// JSON persistence for session documents
pub mod document_store;
