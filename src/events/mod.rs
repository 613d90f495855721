//! Semantic events produced by the widget.
//!
//! `WidgetEvents` is a synchronous, typed listener registry. Listeners are
//! called on the thread that produced the event, after every internal lock
//! has been released, so a listener may call back into the widget.

#[cfg(feature = "emitter")]
mod bridge;

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::json;

use crate::engine::{HeatmapHandle, MapEngine};
use crate::item::MapItem;
use crate::locks::{read, write};

#[cfg(feature = "emitter")]
pub use bridge::EmitterBridge;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemRender,
    ItemClick,
    Drag,
    AfterDrop,
    HeatmapRender,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::ItemRender,
        EventKind::ItemClick,
        EventKind::Drag,
        EventKind::AfterDrop,
        EventKind::HeatmapRender,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ItemRender => "onItemRender",
            EventKind::ItemClick => "onItemClick",
            EventKind::Drag => "onDrag",
            EventKind::AfterDrop => "onAfterDrop",
            EventKind::HeatmapRender => "onHeatMapRender",
        }
    }
}

pub enum MapEvent<E: MapEngine> {
    /// A marker was created or refreshed for the item.
    ItemRender(MapItem),
    ItemClick { id: String, marker: E::Marker },
    /// Intermediate drag frame; the item already carries the new position.
    Drag { id: String, item: MapItem },
    /// The drag gesture finished.
    AfterDrop { id: String, item: MapItem },
    /// A heat layer was rebuilt.
    HeatmapRender(E::Heatmap),
}

impl<E: MapEngine> MapEvent<E> {
    pub fn kind(&self) -> EventKind {
        match self {
            MapEvent::ItemRender(_) => EventKind::ItemRender,
            MapEvent::ItemClick { .. } => EventKind::ItemClick,
            MapEvent::Drag { .. } => EventKind::Drag,
            MapEvent::AfterDrop { .. } => EventKind::AfterDrop,
            MapEvent::HeatmapRender(_) => EventKind::HeatmapRender,
        }
    }

    /// JSON rendering of the event data; engine handles are summarized.
    pub fn payload(&self) -> serde_json::Value {
        match self {
            MapEvent::ItemRender(item) => json!({ "item": item }),
            MapEvent::ItemClick { id, .. } => json!({ "id": id }),
            MapEvent::Drag { id, item } | MapEvent::AfterDrop { id, item } => {
                json!({ "id": id, "item": item })
            }
            MapEvent::HeatmapRender(heatmap) => json!({ "points": heatmap.point_count() }),
        }
    }
}

impl<E: MapEngine> Clone for MapEvent<E> {
    fn clone(&self) -> Self {
        match self {
            MapEvent::ItemRender(item) => MapEvent::ItemRender(item.clone()),
            MapEvent::ItemClick { id, marker } => MapEvent::ItemClick {
                id: id.clone(),
                marker: marker.clone(),
            },
            MapEvent::Drag { id, item } => MapEvent::Drag {
                id: id.clone(),
                item: item.clone(),
            },
            MapEvent::AfterDrop { id, item } => MapEvent::AfterDrop {
                id: id.clone(),
                item: item.clone(),
            },
            MapEvent::HeatmapRender(heatmap) => MapEvent::HeatmapRender(heatmap.clone()),
        }
    }
}

impl<E: MapEngine> fmt::Debug for MapEvent<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapEvent")
            .field("kind", &self.kind().name())
            .field("payload", &self.payload())
            .finish()
    }
}

pub type EventListener<E> = Arc<dyn Fn(&MapEvent<E>) + Send + Sync>;

/// Listener registry for produced events. Clones share listeners.
pub struct WidgetEvents<E: MapEngine> {
    listeners: Arc<RwLock<HashMap<EventKind, Vec<EventListener<E>>>>>,
}

impl<E: MapEngine> Clone for WidgetEvents<E> {
    fn clone(&self) -> Self {
        WidgetEvents {
            listeners: Arc::clone(&self.listeners),
        }
    }
}

impl<E: MapEngine> Default for WidgetEvents<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: MapEngine> WidgetEvents<E> {
    pub fn new() -> Self {
        WidgetEvents {
            listeners: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn on<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(&MapEvent<E>) + Send + Sync + 'static,
    {
        write(&self.listeners)
            .entry(kind)
            .or_default()
            .push(Arc::new(listener));
    }

    pub fn on_item_render<F>(&self, listener: F)
    where
        F: Fn(&MapItem) + Send + Sync + 'static,
    {
        self.on(EventKind::ItemRender, move |event| {
            if let MapEvent::ItemRender(item) = event {
                listener(item);
            }
        });
    }

    pub fn on_item_click<F>(&self, listener: F)
    where
        F: Fn(&str, &E::Marker) + Send + Sync + 'static,
    {
        self.on(EventKind::ItemClick, move |event| {
            if let MapEvent::ItemClick { id, marker } = event {
                listener(id, marker);
            }
        });
    }

    pub fn on_drag<F>(&self, listener: F)
    where
        F: Fn(&str, &MapItem) + Send + Sync + 'static,
    {
        self.on(EventKind::Drag, move |event| {
            if let MapEvent::Drag { id, item } = event {
                listener(id, item);
            }
        });
    }

    pub fn on_after_drop<F>(&self, listener: F)
    where
        F: Fn(&str, &MapItem) + Send + Sync + 'static,
    {
        self.on(EventKind::AfterDrop, move |event| {
            if let MapEvent::AfterDrop { id, item } = event {
                listener(id, item);
            }
        });
    }

    pub fn on_heatmap_render<F>(&self, listener: F)
    where
        F: Fn(&E::Heatmap) + Send + Sync + 'static,
    {
        self.on(EventKind::HeatmapRender, move |event| {
            if let MapEvent::HeatmapRender(heatmap) = event {
                listener(heatmap);
            }
        });
    }

    pub fn emit(&self, event: &MapEvent<E>) {
        let listeners = read(&self.listeners)
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        read(&self.listeners).get(&kind).map_or(0, Vec::len)
    }
}

impl<E: MapEngine> fmt::Debug for WidgetEvents<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = read(&self.listeners);
        let mut map = f.debug_map();
        for kind in EventKind::ALL {
            map.entry(&kind.name(), &listeners.get(&kind).map_or(0, Vec::len));
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RecordingEngine;
    use std::sync::Mutex;

    #[test]
    fn names() {
        assert_eq!(EventKind::ItemRender.name(), "onItemRender");
        assert_eq!(EventKind::HeatmapRender.name(), "onHeatMapRender");
    }

    #[test]
    fn typed_listeners_only_see_their_kind() {
        let events: WidgetEvents<RecordingEngine> = WidgetEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        events.on_drag(move |id, item| {
            sink.lock().unwrap().push(format!("drag {} {}", id, item.lat));
        });
        let sink = Arc::clone(&seen);
        events.on_after_drop(move |id, _| sink.lock().unwrap().push(format!("drop {}", id)));

        let item = MapItem::new("m", 10.0, 20.0);
        events.emit(&MapEvent::Drag {
            id: "m".into(),
            item: item.clone(),
        });
        events.emit(&MapEvent::ItemRender(item.clone()));
        events.emit(&MapEvent::AfterDrop {
            id: "m".into(),
            item,
        });

        assert_eq!(*seen.lock().unwrap(), vec!["drag m 10", "drop m"]);
        assert_eq!(events.listener_count(EventKind::Drag), 1);
        assert_eq!(events.listener_count(EventKind::ItemClick), 0);
    }

    #[test]
    fn listener_may_register_listeners() {
        let events: WidgetEvents<RecordingEngine> = WidgetEvents::new();
        let registry = events.clone();
        events.on_item_render(move |_| registry.on_item_render(|_| {}));

        events.emit(&MapEvent::ItemRender(MapItem::new("a", 0.0, 0.0)));
        assert_eq!(events.listener_count(EventKind::ItemRender), 2);
    }

    #[test]
    fn payloads() {
        let item = MapItem::new("a", 1.0, 2.0);
        let event: MapEvent<RecordingEngine> = MapEvent::AfterDrop {
            id: "a".into(),
            item,
        };
        let payload = event.payload();
        assert_eq!(payload["id"], "a");
        assert_eq!(payload["item"]["lng"], 2.0);
    }
}
