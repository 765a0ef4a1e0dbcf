// ============================================================
// Layer 3 — Tree
// ============================================================
// Module calls take and return arbitrarily nested containers:
// a tuple of positional arguments, a map of keyword arguments,
// a list of hidden states, a tuple of (output, cache), ...
//
// Tree<T> is the closed set of container shapes we care about.
// Recording, serialising and rebuilding all work by mapping the
// leaves of a tree while keeping every container exactly as it
// was: same kind, same order, same keys.
//
//   Leaf(T)                  — a single value
//   Seq([..])                — an ordered, growable list
//   Tuple([..])              — a fixed-size group (positional args)
//   Map([(key, ..), ..])     — keyword-style entries, order kept
//
// On disk each node is tagged with its kind, so a tuple never
// comes back as a list and a map never loses its key order:
//
//   {"tuple": [{"leaf": "4f0c…"}, {"map": [["mask", {"leaf": "91ad…"}]]}]}

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tree<T> {
    Leaf(T),
    Seq(Vec<Tree<T>>),
    Tuple(Vec<Tree<T>>),
    Map(Vec<(String, Tree<T>)>),
}

impl<T> Tree<T> {
    pub fn leaf(value: T) -> Self {
        Tree::Leaf(value)
    }

    /// An empty keyword map — what a call without kwargs records.
    pub fn empty_map() -> Self {
        Tree::Map(Vec::new())
    }

    /// Apply `f` to every leaf, keeping the container shape.
    ///
    /// Siblings are visited left to right (map entries in key
    /// order of insertion), so a stateful callback sees leaves in
    /// the same order `leaves()` returns them.
    pub fn map_with<U, F>(&self, f: &mut F) -> Tree<U>
    where
        F: FnMut(&T) -> U,
    {
        match self {
            Tree::Leaf(value) => Tree::Leaf(f(value)),
            Tree::Seq(items) => Tree::Seq(items.iter().map(|item| item.map_with(&mut *f)).collect()),
            Tree::Tuple(items) => {
                Tree::Tuple(items.iter().map(|item| item.map_with(&mut *f)).collect())
            }
            Tree::Map(entries) => Tree::Map(
                entries
                    .iter()
                    .map(|(key, item)| (key.clone(), item.map_with(&mut *f)))
                    .collect(),
            ),
        }
    }

    /// Fallible version of `map_with`: stops at the first leaf
    /// whose callback fails and returns that error.
    pub fn try_map<U, E, F>(&self, f: &mut F) -> Result<Tree<U>, E>
    where
        F: FnMut(&T) -> Result<U, E>,
    {
        Ok(match self {
            Tree::Leaf(value) => Tree::Leaf(f(value)?),
            Tree::Seq(items) => {
                let mut mapped = Vec::with_capacity(items.len());
                for item in items {
                    mapped.push(item.try_map(&mut *f)?);
                }
                Tree::Seq(mapped)
            }
            Tree::Tuple(items) => {
                let mut mapped = Vec::with_capacity(items.len());
                for item in items {
                    mapped.push(item.try_map(&mut *f)?);
                }
                Tree::Tuple(mapped)
            }
            Tree::Map(entries) => {
                let mut mapped = Vec::with_capacity(entries.len());
                for (key, item) in entries {
                    mapped.push((key.clone(), item.try_map(&mut *f)?));
                }
                Tree::Map(mapped)
            }
        })
    }

    /// All leaves, depth-first, left to right.
    pub fn leaves(&self) -> Vec<&T> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a T>) {
        match self {
            Tree::Leaf(value) => out.push(value),
            Tree::Seq(items) | Tree::Tuple(items) => {
                for item in items {
                    item.collect_leaves(out);
                }
            }
            Tree::Map(entries) => {
                for (_, item) in entries {
                    item.collect_leaves(out);
                }
            }
        }
    }

    /// Number of top-level entries. A bare leaf counts as one.
    pub fn len(&self) -> usize {
        match self {
            Tree::Leaf(_) => 1,
            Tree::Seq(items) | Tree::Tuple(items) => items.len(),
            Tree::Map(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Top-level entries labelled for display: positions for
    /// sequences and tuples, keys for maps, nothing for a leaf.
    pub fn entries(&self) -> Vec<(String, &Tree<T>)> {
        match self {
            Tree::Leaf(_) => vec![(String::new(), self)],
            Tree::Seq(items) | Tree::Tuple(items) => items
                .iter()
                .enumerate()
                .map(|(idx, item)| (idx.to_string(), item))
                .collect(),
            Tree::Map(entries) => entries.iter().map(|(key, item)| (key.clone(), item)).collect(),
        }
    }
}

/// Map every leaf of `tree` through `callback`, preserving the
/// container structure around it.
pub fn map_tree<T, U>(mut callback: impl FnMut(&T) -> U, tree: &Tree<T>) -> Tree<U> {
    tree.map_with(&mut callback)
}

impl<T: fmt::Display> fmt::Display for Tree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tree::Leaf(value) => write!(f, "{value}"),
            Tree::Seq(items) => {
                f.write_str("[")?;
                write_joined(f, items.iter())?;
                f.write_str("]")
            }
            Tree::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items.iter())?;
                // Single-element tuples keep their trailing comma.
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Tree::Map(entries) => {
                f.write_str("{")?;
                for (idx, (key, item)) in entries.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
        }
    }
}

fn write_joined<'a, T: fmt::Display + 'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Tree<T>>,
) -> fmt::Result {
    for (idx, item) in items.enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}
