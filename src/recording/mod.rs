// ============================================================
// Layer 4 — Recording Layer
// ============================================================
// Turns live modules into figures and keeps them:
//
//   ledger.rs    — id-keyed tables of modules, tensors and the
//                  call log, shared by session and recorders
//   recorder.rs  — the hook attached to one module
//   window.rs    — scoped attach / detach of all recorders
//   session.rs   — builds the module forest, opens windows,
//                  converts to and from Document
//   document.rs  — the flat, JSON-ready form of a session
//
// Everything here is single-threaded (Rc / RefCell).

pub mod ledger;

pub mod recorder;

pub mod window;

pub mod session;

pub mod document;
