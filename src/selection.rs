use std::collections::BTreeSet;

use crate::LinkId;

/// Set of links picked for a bulk action.
///
/// Kept separate from the store: selection is view state and is never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<LinkId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the ID if absent, removes it if present.
    pub fn toggle(&mut self, id: LinkId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    pub fn contains(&self, id: LinkId) -> bool {
        self.ids.contains(&id)
    }

    pub fn remove(&mut self, id: LinkId) {
        self.ids.remove(&id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selects or deselects every visible link.
    ///
    /// If all visible links are already selected they are deselected;
    /// otherwise all of them are added. Selected links outside the visible
    /// set are left alone.
    ///
    /// # Examples
    ///
    /// ```
    /// use shelf::{LinkId, Selection};
    ///
    /// let visible = [LinkId::new(1), LinkId::new(2)];
    /// let mut selection = Selection::new();
    ///
    /// selection.toggle_all(&visible);
    /// assert_eq!(selection.len(), 2);
    ///
    /// selection.toggle_all(&visible);
    /// assert!(selection.is_empty());
    /// ```
    pub fn toggle_all(&mut self, visible: &[LinkId]) {
        let all_selected = visible.iter().all(|id| self.ids.contains(id));
        if all_selected {
            for id in visible {
                self.ids.remove(id);
            }
        } else {
            self.ids.extend(visible.iter().copied());
        }
    }

    /// Returns `true` if every visible link is selected (and there is one).
    pub fn covers(&self, visible: &[LinkId]) -> bool {
        !visible.is_empty() && visible.iter().all(|id| self.ids.contains(id))
    }

    /// Selected IDs in ascending order.
    pub fn ids(&self) -> Vec<LinkId> {
        self.ids.iter().copied().collect()
    }
}
