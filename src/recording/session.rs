// ============================================================
// Layer 4 — Session
// ============================================================
// The top-level object. Given named root modules it:
//
//   1. enumerates every root and all modules nested below it,
//      naming each by dotted path (`net`, `net.fc1`, ...)
//   2. describes each one as a ModuleFigure, with its own
//      weights as parameter TensorFigures
//   3. links parents and children once every figure exists
//
// After that the set of modules never changes; only encounters
// accumulate, through recorders attached by `record()`.
//
// A Session borrows the host modules for 'm so it can attach
// hooks to them later. A session rebuilt from a document has no
// live modules (Session<'static>); it can be read and browsed
// but opening a window on it attaches nothing.

use std::cell::Ref;
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{info, warn};

use crate::domain::error::DoctorResult;
use crate::domain::figure::{ModuleFigure, ModuleId};
use crate::domain::traits::{named_modules, HostModule};
use crate::recording::document::Document;
use crate::recording::ledger::Ledger;
use crate::recording::recorder::SharedLedger;
use crate::recording::window::{RecordingWindow, Target};

pub struct Session<'m> {
    ledger: Rc<SharedLedger>,
    handles: HashMap<ModuleId, &'m dyn HostModule>,
}

impl<'m> Session<'m> {
    /// Describe `roots` and everything below them.
    ///
    /// If two modules end up with the same dotted name, the one
    /// enumerated last wins (it keeps the first one's position).
    pub fn new<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = (S, &'m dyn HostModule)>,
        S: Into<String>,
    {
        let mut found: IndexMap<String, &'m dyn HostModule> = IndexMap::new();
        for (root, module) in roots {
            let root = root.into();
            for (path, sub) in named_modules(module) {
                let name = if path.is_empty() { root.clone() } else { format!("{root}.{path}") };
                if found.insert(name.clone(), sub).is_some() {
                    warn!(module = %name, "module name seen twice; keeping the later one");
                }
            }
        }

        let mut ledger = Ledger::default();
        let mut handles = HashMap::with_capacity(found.len());
        for (name, module) in found {
            let mut figure = ModuleFigure::new(name, module.class_name());
            figure.annotations = module.annotations();
            for (weight, meta) in module.named_parameters() {
                let id = ledger.insert_meta(&meta);
                figure.weights.insert(weight, id);
            }
            handles.insert(figure.id.clone(), module);
            ledger.insert_module(figure);
        }
        ledger.link_hierarchy();

        info!(
            modules = ledger.module_count(),
            weights = ledger.tensor_count(),
            "session created"
        );
        Self { ledger: Rc::new(SharedLedger::new(ledger)), handles }
    }

    /// Read access to everything recorded so far.
    ///
    /// Calls made while the returned guard is held are queued and
    /// show up on the next call to `ledger()`.
    pub fn ledger(&self) -> Ref<'_, Ledger> {
        self.ledger.read()
    }

    /// True if the session can attach to live modules, false for
    /// a session rebuilt from a document.
    pub fn is_live(&self) -> bool {
        !self.handles.is_empty()
    }

    /// Attach a recorder to every live module until the returned
    /// window is dropped.
    pub fn record(&self) -> DoctorResult<RecordingWindow<'m>> {
        let targets: Vec<Target<'m>> = self
            .ledger
            .read()
            .modules()
            .filter_map(|figure| {
                self.handles.get(&figure.id).map(|module| Target {
                    id: figure.id.clone(),
                    name: figure.name.clone(),
                    module: *module,
                })
            })
            .collect();
        RecordingWindow::open(&self.ledger, targets)
    }

    /// Run `f` inside a recording window.
    pub fn recording<R>(&self, f: impl FnOnce() -> R) -> DoctorResult<R> {
        let _window = self.record()?;
        Ok(f())
    }

    /// Flatten the session into its id-keyed document form.
    pub fn to_document(&self) -> Document {
        Document::from_ledger(&self.ledger.read())
    }

    /// Rebuild a session from a document. Every id the document
    /// references must be defined in it.
    pub fn from_document(document: &Document) -> DoctorResult<Session<'static>> {
        let ledger = document.rebuild()?;
        info!(
            modules = ledger.module_count(),
            tensors = ledger.tensor_count(),
            "session rebuilt from document"
        );
        Ok(Session { ledger: Rc::new(SharedLedger::new(ledger)), handles: HashMap::new() })
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::figure::TensorRole;
    use crate::domain::traits::TensorMeta;
    use crate::domain::tree::Tree;
    use crate::ml::testing::{tensor, FakeModule};

    #[test]
    fn test_hierarchy_wiring() {
        let a = FakeModule::new("A").child("b", FakeModule::new("B").child("c", FakeModule::new("C")));
        let x = FakeModule::new("X");
        let session = Session::new([("a", &a as &dyn HostModule), ("x", &x as &dyn HostModule)]);

        let ledger = session.ledger();
        let names: Vec<&str> = ledger.modules().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "a.b", "a.b.c", "x"]);

        let a = ledger.module("a").unwrap();
        let ab = ledger.module("a.b").unwrap();
        let abc = ledger.module("a.b.c").unwrap();
        assert_eq!(ledger.parent_of(abc).unwrap().name, "a.b");
        assert_eq!(ledger.parent_of(ab).unwrap().name, "a");
        assert!(a.parent.is_none());
        assert!(ledger.module("x").unwrap().parent.is_none());
        assert_eq!(a.children, vec![ab.id.clone()]);
        assert_eq!(ab.class_name, "B");
    }

    #[test]
    fn test_root_with_dotted_name_and_no_parent() {
        let orphan = FakeModule::new("Orphan");
        let session = Session::new([("a.b", &orphan as &dyn HostModule)]);
        let ledger = session.ledger();
        assert_eq!(ledger.module_count(), 1);
        assert!(ledger.module("a.b").unwrap().parent.is_none());
    }

    #[test]
    fn test_weights_are_parameter_figures() {
        let net = FakeModule::new("Net")
            .annotate("x", "Tensor")
            .param("weight", TensorMeta::new(vec![4, 3], "float32", "cpu"));
        let session = Session::new([("net", &net as &dyn HostModule)]);

        let ledger = session.ledger();
        let module = ledger.module("net").unwrap();
        assert_eq!(module.annotations.get("x").map(String::as_str), Some("Tensor"));
        let weight = ledger.tensor(&module.weights["weight"]).unwrap();
        assert_eq!(weight.shape, Some(vec![4, 3]));
        assert!(weight.is_parameter);
        assert!(weight.encounters.is_empty());
    }

    #[test]
    fn test_duplicate_names_keep_the_later_module() {
        let a = FakeModule::new("A").child("b", FakeModule::new("Inner"));
        let other = FakeModule::new("Outer");
        let session = Session::new([("a", &a as &dyn HostModule), ("a.b", &other as &dyn HostModule)]);

        let ledger = session.ledger();
        assert_eq!(ledger.module_count(), 2);
        assert_eq!(ledger.module("a.b").unwrap().class_name, "Outer");
    }

    #[test]
    fn test_empty_window_leaves_no_hooks() {
        let net = FakeModule::new("Net").child("fc", FakeModule::new("Linear"));
        let session = Session::new([("net", &net as &dyn HostModule)]);

        let window = session.record().unwrap();
        assert_eq!(window.hook_count(), 2);
        assert_eq!(net.total_hook_count(), 2);
        drop(window);

        assert_eq!(net.total_hook_count(), 0);
        assert!(session.ledger().log().is_empty());
    }

    #[test]
    fn test_failed_install_detaches_earlier_hooks() {
        let net = FakeModule::new("Net").child("fc", FakeModule::new("Linear").refuse_hooks());
        let session = Session::new([("net", &net as &dyn HostModule)]);

        assert!(session.record().is_err());
        assert_eq!(net.total_hook_count(), 0);
    }

    #[test]
    fn test_panic_inside_window_still_detaches() {
        let net = FakeModule::new("Net");
        let session = Session::new([("net", &net as &dyn HostModule)]);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            session.recording(|| panic!("forward failed")).ok();
        }));
        assert!(result.is_err());
        assert_eq!(net.hook_count(), 0);
    }

    #[test]
    fn test_calls_outside_window_are_not_recorded() {
        let net = FakeModule::new("Net");
        let session = Session::new([("net", &net as &dyn HostModule)]);
        let call = || net.call(Tree::Tuple(vec![Tree::leaf(tensor(&[1]))]), Tree::empty_map(), Tree::leaf(None));

        call();
        session.recording(call).unwrap();
        call();

        let ledger = session.ledger();
        assert_eq!(ledger.log().len(), 1);
        assert_eq!(ledger.module("net").unwrap().encounters.len(), 1);
    }

    #[test]
    fn test_calls_while_ledger_is_held_are_not_lost() {
        let net = FakeModule::new("Net").child("fc", FakeModule::new("Linear"));
        let session = Session::new([("net", &net as &dyn HostModule)]);
        let call = |m: &FakeModule| m.call(Tree::Tuple(vec![Tree::leaf(tensor(&[2, 3]))]), Tree::empty_map(), Tree::leaf(None));

        session
            .recording(|| {
                call(net.get("fc"));
                let held = session.ledger();
                call(&net);
                assert_eq!(held.log().len(), 1);
                drop(held);
                call(net.get("fc"));
            })
            .unwrap();

        let ledger = session.ledger();
        let order: Vec<&str> = ledger.log().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, vec!["net.fc", "net", "net.fc"]);
        assert_eq!(ledger.module("net").unwrap().encounters.len(), 1);
        assert_eq!(ledger.module("net.fc").unwrap().encounters.len(), 2);
    }

    #[test]
    fn test_closing_window_writes_queued_calls() {
        let net = FakeModule::new("Net");
        let session = Session::new([("net", &net as &dyn HostModule)]);

        let window = session.record().unwrap();
        {
            let _held = session.ledger();
            net.call(Tree::leaf(tensor(&[1])), Tree::empty_map(), Tree::leaf(None));
        }
        drop(window);

        assert_eq!(session.ledger.pending_count(), 0);
        assert_eq!(session.ledger().log().len(), 1);
    }

    #[test]
    fn test_recorded_calls_reach_module_and_log() {
        let net = FakeModule::new("Net").child("fc", FakeModule::new("Linear"));
        let session = Session::new([("net", &net as &dyn HostModule)]);

        session
            .recording(|| {
                let fc = net.get("fc");
                fc.call(Tree::Tuple(vec![Tree::leaf(tensor(&[2, 3]))]), Tree::empty_map(), Tree::leaf(tensor(&[2, 4])));
                net.call(Tree::Tuple(vec![Tree::leaf(tensor(&[2, 3]))]), Tree::empty_map(), Tree::leaf(tensor(&[2, 4])));
            })
            .unwrap();

        let ledger = session.ledger();
        let order: Vec<&str> = ledger.log().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(order, vec!["net.fc", "net"]);
        let fc = ledger.module("net.fc").unwrap();
        assert_eq!(ledger.log()[0].module, fc.id);
        assert_eq!(fc.last_encounter(), fc.encounters.first());
    }

    #[test]
    fn test_same_tensor_through_two_modules_shares_one_figure() {
        let net = FakeModule::new("Net").child("a", FakeModule::new("A")).child("b", FakeModule::new("B"));
        let session = Session::new([("net", &net as &dyn HostModule)]);
        let hidden = Some(TensorMeta::new(vec![2, 8], "float32", "cpu").with_key("hidden"));

        session
            .recording(|| {
                net.get("a").call(Tree::Tuple(vec![Tree::leaf(tensor(&[2, 3]))]), Tree::empty_map(), Tree::leaf(hidden.clone()));
                net.get("b").call(Tree::Tuple(vec![Tree::leaf(hidden.clone())]), Tree::empty_map(), Tree::leaf(tensor(&[2, 1])));
            })
            .unwrap();

        let ledger = session.ledger();
        let out_a = ledger.module("net.a").unwrap().encounters[0].output.leaves()[0].clone();
        let in_b = ledger.module("net.b").unwrap().encounters[0].args.leaves()[0].clone();
        assert_eq!(out_a, in_b);

        let roles: Vec<_> = ledger.tensor(&out_a).unwrap().encounters.iter().map(|e| e.tensor_role).collect();
        assert_eq!(roles, vec![TensorRole::Output, TensorRole::Args]);
    }
}
