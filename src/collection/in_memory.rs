//! InMemoryCollection - ordered, Vec-backed collection.

use std::fmt;
use std::sync::{Arc, RwLock};

use super::{DataCollection, StoreEvent, StoreListener};
use crate::geo::LatLng;
use crate::item::MapItem;
use crate::locks::{read, write};

/// In-memory ordered collection keyed by item id.
///
/// Notifications are delivered synchronously after the storage lock is
/// released, so listeners may read from (or write to) the collection.
/// Clone-friendly via Arc.
#[derive(Clone, Default)]
pub struct InMemoryCollection {
    items: Arc<RwLock<Vec<MapItem>>>,
    listeners: Arc<RwLock<Vec<StoreListener>>>,
}

impl InMemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a collection holding `items`, without notifying anyone.
    pub fn with_items(items: Vec<MapItem>) -> Self {
        let collection = Self::new();
        *write(&collection.items) = items;
        collection
    }

    /// Append an item. Returns `false` if the id is already taken.
    pub fn add(&self, item: MapItem) -> bool {
        {
            let mut items = write(&self.items);
            if items.iter().any(|existing| existing.id == item.id) {
                return false;
            }
            items.push(item.clone());
        }
        self.notify(&StoreEvent::add(item));
        true
    }

    /// Replace the item with the same id. Returns `false` for an unknown id.
    pub fn update(&self, item: MapItem) -> bool {
        {
            let mut items = write(&self.items);
            match items.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => *existing = item.clone(),
                None => return false,
            }
        }
        self.notify(&StoreEvent::update(item));
        true
    }

    /// Mutate an item in place and emit an update for it.
    pub fn update_with<F>(&self, id: &str, change: F) -> Option<MapItem>
    where
        F: FnOnce(&mut MapItem),
    {
        let updated = {
            let mut items = write(&self.items);
            let item = items.iter_mut().find(|existing| existing.id == id)?;
            change(item);
            item.clone()
        };
        self.notify(&StoreEvent::update(updated.clone()));
        Some(updated)
    }

    pub fn remove(&self, id: &str) -> Option<MapItem> {
        let removed = {
            let mut items = write(&self.items);
            let index = items.iter().position(|existing| existing.id == id)?;
            items.remove(index)
        };
        self.notify(&StoreEvent::delete(removed.clone()));
        Some(removed)
    }

    pub fn len(&self) -> usize {
        read(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        read(&self.items).is_empty()
    }

    pub fn listener_count(&self) -> usize {
        read(&self.listeners).len()
    }

    fn notify(&self, event: &StoreEvent) {
        let listeners = read(&self.listeners).clone();
        tracing::trace!(op = ?event.op, id = ?event.id, "collection notification");
        for listener in listeners {
            listener(event);
        }
    }
}

impl DataCollection for InMemoryCollection {
    fn items(&self) -> Vec<MapItem> {
        read(&self.items).clone()
    }

    fn get(&self, id: &str) -> Option<MapItem> {
        read(&self.items).iter().find(|item| item.id == id).cloned()
    }

    fn set_position(&self, id: &str, position: LatLng) -> Option<MapItem> {
        let mut items = write(&self.items);
        let item = items.iter_mut().find(|item| item.id == id)?;
        item.set_position(position);
        Some(item.clone())
    }

    /// Items whose id is already present replace the stored item in place;
    /// the rest are appended. One reset notification covers the batch.
    fn parse(&self, batch: Vec<MapItem>) {
        {
            let mut items = write(&self.items);
            for item in batch {
                match items.iter_mut().find(|existing| existing.id == item.id) {
                    Some(existing) => *existing = item,
                    None => items.push(item),
                }
            }
        }
        self.notify(&StoreEvent::reset());
    }

    fn clear(&self) {
        write(&self.items).clear();
        self.notify(&StoreEvent::reset());
    }

    fn subscribe(&self, listener: StoreListener) {
        write(&self.listeners).push(listener);
    }
}

impl fmt::Debug for InMemoryCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryCollection")
            .field("items", &read(&self.items).len())
            .field("listeners", &read(&self.listeners).len())
            .finish()
    }
}
