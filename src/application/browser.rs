// ============================================================
// Layer 2 — Browser
// ============================================================
// A read-only view over a session's module forest. One module
// is selected at a time; the view renders it as a text page:
//
//   header            name and class
//   annotated types   declared argument types
//   inputs            args and kwargs of the most recent call
//   output            output of the most recent call
//   weights           the module's own parameters
//   navigation        parent and children to jump to
//
// Navigation only moves the selection; nothing is mutated.

use std::fmt::Write as _;

use crate::domain::figure::{ModuleFigure, TensorId};
use crate::domain::tree::Tree;
use crate::recording::ledger::Ledger;

pub struct Browser<'a> {
    ledger: &'a Ledger,
    selected: &'a ModuleFigure,
}

impl<'a> Browser<'a> {
    /// Start at the first root. None if the ledger is empty.
    pub fn new(ledger: &'a Ledger) -> Option<Self> {
        let selected = ledger.roots().next()?;
        Some(Self { ledger, selected })
    }

    pub fn current(&self) -> &'a ModuleFigure {
        self.selected
    }

    fn move_to(&mut self, target: Option<&'a ModuleFigure>) -> bool {
        match target {
            Some(module) => {
                self.selected = module;
                true
            }
            None => false,
        }
    }

    /// Jump to a module by dotted name.
    pub fn select(&mut self, name: &str) -> bool {
        let ledger = self.ledger;
        self.move_to(ledger.module(name))
    }

    pub fn select_parent(&mut self) -> bool {
        let ledger = self.ledger;
        self.move_to(ledger.parent_of(self.selected))
    }

    pub fn select_child(&mut self, index: usize) -> bool {
        let ledger = self.ledger;
        self.move_to(ledger.children_of(self.selected).nth(index))
    }

    pub fn select_root(&mut self, index: usize) -> bool {
        let ledger = self.ledger;
        self.move_to(ledger.roots().nth(index))
    }

    fn describe(&self, tree: &Tree<TensorId>) -> Tree<String> {
        tree.map_with(&mut |id: &TensorId| match self.ledger.tensor(id) {
            Some(tensor) => tensor.to_string(),
            None => format!("<unknown tensor {id}>"),
        })
    }

    /// The page for the selected module.
    pub fn render(&self) -> String {
        let module = self.current();
        let mut page = String::new();

        let _ = writeln!(page, "== {} ({}) ==", module.name, module.class_name);

        let _ = writeln!(page, "Annotated types:");
        for (name, label) in &module.annotations {
            let _ = writeln!(page, "  {name}: {label}");
        }

        let last = module.last_encounter();
        let _ = writeln!(page, "Inputs ({} calls recorded):", module.encounters.len());
        if let Some(encounter) = last {
            let args = self.describe(&encounter.args);
            let _ = writeln!(page, "  Arguments:");
            for (label, value) in args.entries() {
                let _ = writeln!(page, "    {label}: {value}");
            }
            let kwargs = self.describe(&encounter.kwargs);
            if !kwargs.is_empty() {
                let _ = writeln!(page, "  Kwargs:");
                for (label, value) in kwargs.entries() {
                    let _ = writeln!(page, "    {label}: {value}");
                }
            }
        }

        let _ = writeln!(page, "Output:");
        if let Some(encounter) = last {
            let _ = writeln!(page, "  {}", self.describe(&encounter.output));
        }

        let _ = writeln!(page, "Weights:");
        for (name, id) in &module.weights {
            let _ = writeln!(page, "  {name}: {}", self.describe(&Tree::leaf(id.clone())));
        }

        let _ = writeln!(page, "Navigation:");
        if let Some(parent) = self.ledger.parent_of(module) {
            let _ = writeln!(page, "  [p]   parent: {}", parent.name);
        }
        for (idx, child) in self.ledger.children_of(module).enumerate() {
            let _ = writeln!(page, "  [c {idx}] {}", child.name);
        }

        page
    }
}
