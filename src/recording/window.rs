// ============================================================
// Layer 4 — Recording Window
// ============================================================
// The scoped interval during which recorders are attached.
//
//   open  — install one Recorder hook per live module
//   drop  — remove every hook that was installed, exactly once
//
// Drop runs on normal exit, on early `?` returns and while
// unwinding from a panic, so a failed forward pass never leaves
// hooks behind. If installation fails part-way, the hooks that
// did go in are removed before the error is returned.
//
// Closing the window also writes out any calls that were queued
// while the ledger was being read.
//
// The window is neither reentrant nor thread-safe: opening two
// windows over the same modules installs two recorders on each,
// and every call is then recorded twice.

use std::rc::Rc;

use tracing::{debug, info};

use crate::domain::error::DoctorResult;
use crate::domain::figure::ModuleId;
use crate::domain::traits::{HookHandle, HostModule};
use crate::recording::recorder::{Recorder, SharedLedger};

/// A module the window should attach a recorder to.
pub(crate) struct Target<'m> {
    pub id: ModuleId,
    pub name: String,
    pub module: &'m dyn HostModule,
}

#[must_use = "recorders are detached as soon as the window is dropped"]
pub struct RecordingWindow<'m> {
    ledger: Rc<SharedLedger>,
    installed: Vec<(String, &'m dyn HostModule, HookHandle)>,
}

impl<'m> RecordingWindow<'m> {
    pub(crate) fn open(ledger: &Rc<SharedLedger>, targets: Vec<Target<'m>>) -> DoctorResult<Self> {
        let mut window = Self { ledger: Rc::clone(ledger), installed: Vec::with_capacity(targets.len()) };
        for target in targets {
            let recorder = Recorder::new(target.id, Rc::clone(ledger));
            // On error `window` drops here and detaches what went in so far.
            let handle = target.module.register_forward_hook(recorder.into_hook())?;
            debug!(module = %target.name, "recorder attached");
            window.installed.push((target.name, target.module, handle));
        }
        info!(hooks = window.installed.len(), "recording window opened");
        Ok(window)
    }

    /// Number of recorders currently attached.
    pub fn hook_count(&self) -> usize {
        self.installed.len()
    }

    /// Detach all recorders now. Same as dropping the window.
    pub fn close(self) {}
}

impl Drop for RecordingWindow<'_> {
    fn drop(&mut self) {
        let count = self.installed.len();
        for (name, module, handle) in self.installed.drain(..) {
            module.remove_forward_hook(handle);
            debug!(module = %name, "recorder detached");
        }
        self.ledger.flush();
        info!(hooks = count, pending = self.ledger.pending_count(), "recording window closed");
    }
}
