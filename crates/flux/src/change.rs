//! Changed-field sets
//!
//! Reducers describe what they changed with a set of application-declared
//! field keys. An empty set means nothing changed.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

/// A symbolic key naming a logical part of a state value
///
/// Implemented for any hashable, cloneable, thread-safe type; `&'static str`
/// and field enums are the usual choices.
pub trait Field: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> Field for T where T: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

/// Set of fields changed by one reducer invocation
#[derive(Clone, PartialEq, Eq)]
pub struct ChangeSet<F: Field> {
    fields: HashSet<F>,
}

impl<F: Field> ChangeSet<F> {
    /// The empty set: "nothing changed"
    pub fn none() -> Self {
        Self {
            fields: HashSet::new(),
        }
    }

    pub fn insert(&mut self, field: F) -> bool {
        self.fields.insert(field)
    }

    pub fn contains(&self, field: &F) -> bool {
        self.fields.contains(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Non-empty intersection with `other`
    pub fn intersects(&self, other: &ChangeSet<F>) -> bool {
        !self.fields.is_disjoint(&other.fields)
    }

    pub fn iter(&self) -> impl Iterator<Item = &F> {
        self.fields.iter()
    }
}

impl<F: Field> Default for ChangeSet<F> {
    fn default() -> Self {
        Self::none()
    }
}

impl<F: Field> fmt::Debug for ChangeSet<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.fields.iter()).finish()
    }
}

impl<F: Field> FromIterator<F> for ChangeSet<F> {
    fn from_iter<I: IntoIterator<Item = F>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<F: Field, const N: usize> From<[F; N]> for ChangeSet<F> {
    fn from(fields: [F; N]) -> Self {
        fields.into_iter().collect()
    }
}

impl<F: Field> From<Vec<F>> for ChangeSet<F> {
    fn from(fields: Vec<F>) -> Self {
        fields.into_iter().collect()
    }
}

impl<F: Field> Extend<F> for ChangeSet<F> {
    fn extend<I: IntoIterator<Item = F>>(&mut self, iter: I) {
        self.fields.extend(iter);
    }
}

/// Which side of a state transition a notification belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreEvent {
    /// Before the new state is installed; carries the original state
    WillChange,
    /// After the new state is installed; carries the new state
    DidChange,
}
