//! Ephemeral selection set.
//!
//! Kept as an ordered, duplicate-free list so that "first selected" is
//! well defined for dialogs and inspector defaults. Never persisted.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use crate::doc::ElementId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<ElementId>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// More than one element is selected.
    #[must_use]
    pub fn is_multi(&self) -> bool {
        self.ids.len() > 1
    }

    #[must_use]
    pub fn ids(&self) -> &[ElementId] {
        &self.ids
    }

    #[must_use]
    pub fn first(&self) -> Option<&ElementId> {
        self.ids.first()
    }

    /// Replace the selection with exactly `id`.
    pub fn select_only(&mut self, id: &str) {
        self.ids.clear();
        self.ids.push(id.to_owned());
    }

    /// Add `id` if absent.
    pub fn add(&mut self, id: &str) {
        if !self.contains(id) {
            self.ids.push(id.to_owned());
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.ids.retain(|s| s != id);
    }

    /// Flip membership of `id`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.contains(id) {
            self.remove(id);
            false
        } else {
            self.ids.push(id.to_owned());
            true
        }
    }

    /// Replace the selection with `ids`, dropping duplicates.
    pub fn replace<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ids.clear();
        self.extend(ids);
    }

    /// Union `ids` into the selection.
    pub fn extend<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in ids {
            self.add(id.as_ref());
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids for which `exists` returns false.
    pub fn retain_existing<F>(&mut self, exists: F)
    where
        F: Fn(&str) -> bool,
    {
        self.ids.retain(|id| exists(id));
    }
}
