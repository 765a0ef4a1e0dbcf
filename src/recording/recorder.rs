// ============================================================
// Layer 4 — Recorder
// ============================================================
// The hook installed on one module while a recording window is
// open. On every call of that module it:
//
//   1. takes an owned copy of the call's args / kwargs / output
//   2. queues it on the SharedLedger
//   3. lets the SharedLedger write out every queued call, oldest
//      first, if nobody is reading the ledger right now
//
// Writing a call means turning each leaf into a TensorFigure
// (non-tensors become "absent" figures), noting on each figure
// which module saw it and in which role, appending the id trees
// to the module's encounters and one record to the session log.
//
// A caller may hold `Session::ledger()` while the model runs.
// Calls made meanwhile stay queued and are written, in call
// order, on the next read or when the window closes.

use std::cell::{Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::domain::figure::{ModuleEncounter, ModuleId, TensorRole};
use crate::domain::traits::{ForwardCall, ForwardHook, Observed};
use crate::domain::tree::Tree;
use crate::recording::ledger::{Ledger, LogRecord};

/// One call, copied out of the hook, not yet in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PendingCall {
    module: ModuleId,
    args: Tree<Observed>,
    kwargs: Tree<Observed>,
    output: Tree<Observed>,
}

impl PendingCall {
    fn capture(module: &ModuleId, call: &ForwardCall<'_>) -> Self {
        Self {
            module: module.clone(),
            args: call.args.clone(),
            kwargs: call.kwargs.clone(),
            output: call.output.clone(),
        }
    }
}

/// The ledger shared by a Session and its recorders, plus the
/// calls waiting to be written into it.
#[derive(Debug, Default)]
pub struct SharedLedger {
    ledger: RefCell<Ledger>,
    pending: RefCell<VecDeque<PendingCall>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self { ledger: RefCell::new(ledger), pending: RefCell::new(VecDeque::new()) }
    }

    /// Write out queued calls, then borrow the ledger for reading.
    pub fn read(&self) -> Ref<'_, Ledger> {
        self.flush();
        self.ledger.borrow()
    }

    /// Calls recorded but not yet written.
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    pub(crate) fn submit(&self, call: PendingCall) {
        self.pending.borrow_mut().push_back(call);
        self.flush();
    }

    /// Write every queued call, oldest first. Does nothing while
    /// the ledger is borrowed. Returns how many were written.
    pub(crate) fn flush(&self) -> usize {
        let Ok(mut ledger) = self.ledger.try_borrow_mut() else {
            debug!(pending = self.pending_count(), "ledger is being read; call queued");
            return 0;
        };
        let mut pending = self.pending.borrow_mut();
        let written = pending.len();
        for call in pending.drain(..) {
            write_call(&mut ledger, call);
        }
        written
    }
}

fn write_call(ledger: &mut Ledger, call: PendingCall) {
    let PendingCall { module, args, kwargs, output } = call;
    let Some(name) = ledger.module_by_id(&module).map(|m| m.name.clone()) else {
        warn!(module = %module, "recorder bound to a module the session doesn't know");
        return;
    };

    let args = args.map_with(&mut |leaf: &Observed| ledger.observe(leaf, &module, TensorRole::Args));
    let kwargs = kwargs.map_with(&mut |leaf: &Observed| ledger.observe(leaf, &module, TensorRole::Kwargs));
    let output = output.map_with(&mut |leaf: &Observed| ledger.observe(leaf, &module, TensorRole::Output));

    if let Ok(figure) = ledger.module_mut(&module) {
        figure.encounters.push(ModuleEncounter {
            args: args.clone(),
            kwargs: kwargs.clone(),
            output: output.clone(),
        });
    }

    debug!(module = %name, calls = ledger.log().len() + 1, "recorded call");
    ledger.push_log(LogRecord { name, module, args, kwargs, output });
}

pub struct Recorder {
    module_id: ModuleId,
    ledger: Rc<SharedLedger>,
}

impl Recorder {
    pub fn new(module_id: ModuleId, ledger: Rc<SharedLedger>) -> Self {
        Self { module_id, ledger }
    }

    pub fn record(&self, call: &ForwardCall<'_>) {
        self.ledger.submit(PendingCall::capture(&self.module_id, call));
    }

    pub fn into_hook(self) -> ForwardHook {
        Box::new(move |call: &ForwardCall<'_>| self.record(call))
    }
}
