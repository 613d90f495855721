//! The backing data collection, as seen by the widget.
//!
//! The collection owns its items. The widget only reads snapshots, writes
//! drag positions back silently, and reacts to [`StoreEvent`]s.

mod in_memory;

use std::sync::Arc;

use crate::geo::LatLng;
use crate::item::MapItem;

pub use in_memory::InMemoryCollection;

/// Kind of mutation a store notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Add,
    Update,
    Delete,
    /// Batch load, clear, re-sort or any change not covered above.
    Reset,
}

/// A mutation notification. `id` and `item` are set for single-item ops.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreEvent {
    pub id: Option<String>,
    pub item: Option<MapItem>,
    pub op: StoreOp,
}

impl StoreEvent {
    pub fn add(item: MapItem) -> Self {
        StoreEvent {
            id: Some(item.id.clone()),
            item: Some(item),
            op: StoreOp::Add,
        }
    }

    pub fn update(item: MapItem) -> Self {
        StoreEvent {
            id: Some(item.id.clone()),
            item: Some(item),
            op: StoreOp::Update,
        }
    }

    pub fn delete(item: MapItem) -> Self {
        StoreEvent {
            id: Some(item.id.clone()),
            item: Some(item),
            op: StoreOp::Delete,
        }
    }

    pub fn reset() -> Self {
        StoreEvent {
            id: None,
            item: None,
            op: StoreOp::Reset,
        }
    }
}

pub type StoreListener = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

/// Capability interface of the host data collection.
pub trait DataCollection: Send + Sync {
    /// Ordered snapshot of every item.
    fn items(&self) -> Vec<MapItem>;

    fn get(&self, id: &str) -> Option<MapItem>;

    /// Overwrite an item's coordinates without emitting a notification.
    /// Returns the updated item, or `None` for an unknown id.
    fn set_position(&self, id: &str, position: LatLng) -> Option<MapItem>;

    /// Load a batch of items.
    fn parse(&self, items: Vec<MapItem>);

    fn clear(&self);

    /// Receive every notification, in emission order.
    fn subscribe(&self, listener: StoreListener);
}
