//! Collection aliases shared across the crate.

use std::{collections::VecDeque, hash::Hash};

type BuildHasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

/// Insertion-ordered hash map.
pub type Map<K, V> = indexmap::IndexMap<K, V, BuildHasher>;

/// Insertion-ordered hash set.
pub type Set<T> = indexmap::IndexSet<T, BuildHasher>;

/// A FIFO worklist that holds each pending value at most once.
#[derive(Debug)]
pub struct Worklist<T> {
    queue: VecDeque<T>,
    pending: Set<T>,
}

impl<T> Default for Worklist<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            pending: Set::default(),
        }
    }
}

impl<T> Worklist<T>
where
    T: Clone + Eq + Hash,
{
    /// Schedule `value`, unless it is already waiting in the list.
    pub fn push(&mut self, value: T) -> bool {
        let inserted = self.pending.insert(value.clone());
        if inserted {
            self.queue.push_back(value);
        }
        inserted
    }

    pub fn pop(&mut self) -> Option<T> {
        let value = self.queue.pop_front()?;
        self.pending.swap_remove(&value);
        Some(value)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
