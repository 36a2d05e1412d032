//! Grid operations grouped under one compaction and one change event.

use cardgrid_layout::{GridItem, ItemId, ItemPatch, LayoutStore};

use crate::error::Result;

/// Handle passed to the closure of [`crate::Grid::batch`].
///
/// Each call mutates the layout at once, but compaction waits until the
/// batch closes. Adds and removals are reported as [`crate::GridEvent::Added`]
/// and [`crate::GridEvent::Removed`] when it does.
#[derive(Debug)]
pub struct GridBatch<'a> {
    store: &'a mut LayoutStore,
    added: Vec<ItemId>,
    removed: Vec<ItemId>,
}

impl<'a> GridBatch<'a> {
    pub(crate) fn new(store: &'a mut LayoutStore) -> Self {
        Self {
            store,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<ItemId>, Vec<ItemId>) {
        (self.added, self.removed)
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&GridItem> {
        self.store.item(id)
    }

    #[must_use]
    pub fn items(&self) -> &[GridItem] {
        self.store.items()
    }

    pub fn add_item(&mut self, item: GridItem) -> Result<ItemId> {
        let id = self.store.add_item(item, false)?;
        self.added.push(id.clone());
        Ok(id)
    }

    pub fn remove_item(&mut self, id: &str) -> Option<GridItem> {
        let removed = self.store.remove_item(id)?;
        self.removed.push(removed.id.clone());
        Some(removed)
    }

    pub fn update_item(&mut self, id: &str, patch: &ItemPatch) -> bool {
        self.store.update_item(id, patch)
    }

    pub fn move_item(&mut self, id: &str, x: u16, y: u16) -> bool {
        self.store.move_item(id, x, y)
    }

    pub fn resize_item(&mut self, id: &str, w: u16, h: u16) -> bool {
        self.store.resize_item(id, w, h)
    }
}
