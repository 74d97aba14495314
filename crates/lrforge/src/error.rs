//! Error types reported while building an automaton.

use crate::state::StateID;
use std::{fmt, slice, vec};

/// A problem in the grammar or in the constructed automaton.
///
/// These are accumulated rather than raised: construction always runs to
/// completion and the caller decides whether the result is still usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum GeneratingError {
    #[error("the start rule `{name}' is not defined")]
    MissingStartRule { name: String },

    #[error("the start rule `{name}' must have exactly one alternative, found {count}")]
    DuplicateStartRule { name: String, count: usize },

    #[error("no type is declared for the intermediate `{intermediate}'")]
    MissingType { intermediate: String },

    #[error("reduce/reduce conflict in state {state}: {}", .items.join(", "))]
    ReduceReduceConflict { state: StateID, items: Vec<String> },

    #[error("multiple accepting items in state {state}: {}", .items.join(", "))]
    MultipleAccept { state: StateID, items: Vec<String> },
}

/// A contract violation that makes automaton construction impossible.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("the grammar has no start rule `{name}'")]
    MissingStartRule { name: String },
}

/// An ordered collection of accumulated errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Errors<E> {
    inner: Vec<E>,
}

impl<E> Default for Errors<E> {
    fn default() -> Self {
        Self { inner: Vec::new() }
    }
}

impl<E> Errors<E> {
    pub fn push(&mut self, err: E) {
        self.inner.push(err);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, E> {
        self.inner.iter()
    }
}

impl<E> Extend<E> for Errors<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        self.inner.extend(iter)
    }
}

impl<E> IntoIterator for Errors<E> {
    type Item = E;
    type IntoIter = vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a Errors<E> {
    type Item = &'a E;
    type IntoIter = slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<E: fmt::Display> fmt::Display for Errors<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for err in &self.inner {
            writeln!(f, "error: {}", err)?;
        }
        Ok(())
    }
}
