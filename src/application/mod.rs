// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer strings the other layers together for one goal
// each (record a model, summarise or browse a recording).
//
// Rules for this layer:
//   - No tensor or burn code here (that's Layer 5)
//   - No argument parsing (that's Layer 1)
//   - File access only through Layer 6
//   - Only workflow coordination

// Text pages for one module at a time
pub mod browser;

// Run the demo model and save what was recorded
pub mod record_use_case;

// One-screen overview of a saved recording
pub mod summary_use_case;

// Interactive module-by-module browsing
pub mod inspect_use_case;
