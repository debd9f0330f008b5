use slint::{Model, SharedString, VecModel};
use std::collections::HashSet;
use std::hash::Hash;
use uuid::Uuid;

/// A set of selected ids with click/shift-click semantics.
#[derive(Debug, Clone)]
pub struct SelectionManager<T = Uuid> {
    selected: HashSet<T>,
}

impl<T> Default for SelectionManager<T> {
    fn default() -> Self {
        Self {
            selected: HashSet::new(),
        }
    }
}

impl<T> SelectionManager<T>
where
    T: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a click on `id`: plain clicks replace the selection, modified
    /// clicks toggle membership.
    pub fn handle_interaction(&mut self, id: T, toggle: bool) {
        if toggle {
            self.toggle(id);
        } else {
            self.select_only(id);
        }
    }

    /// Replace the selection with exactly `{id}`.
    pub fn select_only(&mut self, id: T) {
        if self.selected.len() == 1 && self.selected.contains(&id) {
            return;
        }
        self.selected.clear();
        self.selected.insert(id);
    }

    /// Add or remove `id`. Returns `true` if it is selected afterwards.
    pub fn toggle(&mut self, id: T) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    pub fn remove(&mut self, id: T) -> bool {
        self.selected.remove(&id)
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn replace_selection<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.selected.clear();
        self.selected.extend(ids);
    }

    pub fn contains(&self, id: T) -> bool {
        self.selected.contains(&id)
    }

    pub fn iter(&self) -> std::collections::hash_set::Iter<'_, T> {
        self.selected.iter()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.selected.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

impl SelectionManager<Uuid> {
    /// Sync the selection into a Slint model of id strings (sorted, so the
    /// model does not churn between identical selections).
    pub fn sync_to_model(&self, model: &VecModel<SharedString>) {
        let mut ids: Vec<String> = self.selected.iter().map(Uuid::to_string).collect();
        ids.sort();
        model.set_vec(ids.into_iter().map(SharedString::from).collect::<Vec<_>>());
    }

    /// Replace the selection from a Slint model of id strings. Rows that do
    /// not parse as ids are ignored.
    pub fn sync_from_model(&mut self, model: &dyn Model<Data = SharedString>) {
        self.selected.clear();
        for i in 0..model.row_count() {
            if let Some(id) = model.row_data(i).and_then(|s| Uuid::parse_str(s.as_str()).ok()) {
                self.selected.insert(id);
            }
        }
    }
}
