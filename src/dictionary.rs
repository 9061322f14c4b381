//! Ordered, lowercase-keyed word table.
//!
//! A sorted `Vec` searched by binary search rather than a hash map. Since
//! `define_variable`/`define_function` register new words at runtime
//! rather than from a fixed key set known ahead of time, a sorted `Vec`
//! with `binary_search_by` the insertion point is a natural fit.

use crate::error::CompileError;
use crate::word::Word;
use std::rc::Rc;

/// A single dictionary slot: a name paired with its current word.
/// `ReplaceExprWord` swaps the `word` in place, which is observed
/// immediately by anything still holding the old `Rc<Word>` only at the
/// registry level, where compiled programs get patched explicitly.
struct Entry {
    name: String,
    word: Rc<Word>,
}

/// The dictionary backing one [`crate::registry::ExpressionTable`].
///
/// Entries are sorted by `name` so `search` is O(log n); `add` keeps the
/// order invariant on insert.
pub struct Dictionary {
    entries: Vec<Entry>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    fn position(&self, name: &str) -> Result<usize, usize> {
        self.entries.binary_search_by(|entry| entry.name.as_str().cmp(name))
    }

    /// Exact, case-insensitive lookup. Callers are expected to have already
    /// lowercased `name` (the dictionary itself treats keys literally).
    pub fn search(&self, name: &str) -> Option<Rc<Word>> {
        self.position(name).ok().map(|i| self.entries[i].word.clone())
    }

    /// Insert a new word under `name`, or replace the existing one.
    /// Returns the previous word, if any, so callers (the registry) can
    /// patch compiled programs that reference it.
    pub fn add(&mut self, name: &str, word: Rc<Word>) -> Option<Rc<Word>> {
        match self.position(name) {
            Ok(i) => {
                let previous = std::mem::replace(&mut self.entries[i].word, word);
                Some(previous)
            }
            Err(i) => {
                self.entries.insert(
                    i,
                    Entry {
                        name: name.to_string(),
                        word,
                    },
                );
                None
            }
        }
    }

    /// Remove and return the entry under `name`, if any. Used when a
    /// variant parser renames a builtin to a different key.
    pub fn remove(&mut self, name: &str) -> Option<Rc<Word>> {
        self.position(name).ok().map(|i| self.entries.remove(i).word)
    }

    /// Every currently-registered variable, in dictionary order, used by
    /// `get_generated_vars` to report identifiers the parser synthesized
    /// rather than ones the caller declared up front.
    pub fn generated_variable_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| matches!(*entry.word, Word::GeneratedVariable { .. }))
            .map(|entry| entry.name.clone())
            .collect()
    }

    /// Validate that a replacement word is arity-compatible with the word
    /// it is replacing: a function can only be replaced by one with the
    /// same argument count.
    pub fn check_replacement_arity(old: &Word, new: &Word) -> Result<(), CompileError> {
        if matches!(old, Word::Function { .. } | Word::BooleanFunction { .. })
            && matches!(new, Word::Function { .. } | Word::BooleanFunction { .. })
            && old.n_args() != new.n_args()
        {
            return Err(CompileError::Arity {
                expected: old.n_args(),
                found: new.n_args(),
            });
        }
        Ok(())
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::{new_double_cell, FunctionSpec, Kernel};

    fn var(name: &str) -> Rc<Word> {
        Rc::new(Word::DoubleVariable {
            name: name.to_string(),
            cell: new_double_cell(0.0),
        })
    }

    #[test]
    fn add_then_search_round_trips() {
        let mut dict = Dictionary::new();
        dict.add("x", var("x"));
        assert!(dict.search("x").is_some());
        assert!(dict.search("y").is_none());
    }

    #[test]
    fn add_keeps_entries_sorted_for_binary_search() {
        let mut dict = Dictionary::new();
        for name in ["zeta", "alpha", "mid"] {
            dict.add(name, var(name));
        }
        let names: Vec<_> = dict.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn replacement_arity_mismatch_is_rejected() {
        let old = Word::Function {
            name: "f".into(),
            spec: FunctionSpec {
                kernel: Kernel::Unary(|x| Ok(x)),
                precedence: 10,
                is_operator: false,
                can_vary: false,
            },
        };
        let new = Word::Function {
            name: "f".into(),
            spec: FunctionSpec {
                kernel: Kernel::Binary(|a, b| Ok(a + b)),
                precedence: 10,
                is_operator: false,
                can_vary: false,
            },
        };
        assert!(Dictionary::check_replacement_arity(&old, &new).is_err());
    }
}
