//! Marker gestures routed back into the collection.

use std::sync::Arc;

use crate::collection::DataCollection;
use crate::engine::{MapEngine, MarkerHandle};
use crate::events::{MapEvent, WidgetEvents};

/// Wires click and drag listeners on markers and turns gestures into
/// collection writes and widget events.
pub struct DragInteraction<E: MapEngine> {
    collection: Arc<dyn DataCollection>,
    events: WidgetEvents<E>,
}

impl<E: MapEngine> Clone for DragInteraction<E> {
    fn clone(&self) -> Self {
        DragInteraction {
            collection: Arc::clone(&self.collection),
            events: self.events.clone(),
        }
    }
}

impl<E: MapEngine> DragInteraction<E> {
    pub fn new(collection: Arc<dyn DataCollection>, events: WidgetEvents<E>) -> Self {
        DragInteraction { collection, events }
    }

    /// Click routing, for every marker.
    pub fn wire_click(&self, id: &str, marker: &E::Marker) {
        let events = self.events.clone();
        let id = id.to_string();
        marker.on_click(Box::new(move |marker: &E::Marker| {
            events.emit(&MapEvent::ItemClick {
                id: id.clone(),
                marker: marker.clone(),
            });
        }));
    }

    /// Drag routing, for markers of draggable items.
    pub fn wire_drag(&self, id: &str, marker: &E::Marker) {
        let frame = self.clone();
        let frame_id = id.to_string();
        marker.on_drag(Box::new(move |marker: &E::Marker| {
            frame.on_drag(&frame_id, marker, false);
        }));

        let end = self.clone();
        let end_id = id.to_string();
        marker.on_drag_end(Box::new(move |marker: &E::Marker| {
            end.on_drag(&end_id, marker, true);
        }));
    }

    /// Write the marker's live position into the item and emit `onDrag`, or
    /// `onAfterDrop` when the gesture ended.
    pub fn on_drag(&self, id: &str, marker: &E::Marker, finished: bool) {
        let position = marker.position();
        let Some(item) = self.collection.set_position(id, position) else {
            tracing::warn!(%id, "drag on a marker whose item left the collection");
            return;
        };

        let event = if finished {
            MapEvent::AfterDrop {
                id: id.to_string(),
                item,
            }
        } else {
            MapEvent::Drag {
                id: id.to_string(),
                item,
            }
        };
        self.events.emit(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::InMemoryCollection;
    use crate::engine::{MarkerOptions, RecordingEngine, RecordingMarker};
    use crate::geo::LatLng;
    use crate::item::MapItem;
    use std::sync::Mutex;

    fn setup() -> (
        InMemoryCollection,
        WidgetEvents<RecordingEngine>,
        RecordingMarker,
        DragInteraction<RecordingEngine>,
    ) {
        let item = MapItem::new("M", 0.0, 0.0).with_draggable(true);
        let collection = InMemoryCollection::with_items(vec![item.clone()]);
        let events = WidgetEvents::new();
        let engine = RecordingEngine::new();
        let marker = engine.create_marker(&MarkerOptions::from_item(&item), None);
        let drag = DragInteraction::new(Arc::new(collection.clone()), events.clone());
        (collection, events, marker, drag)
    }

    #[test]
    fn drag_frames_then_drop() {
        let (collection, events, marker, drag) = setup();
        drag.wire_drag("M", &marker);

        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        events.on_drag(move |id, item| sink.lock().unwrap().push(("drag", id.to_string(), item.lat)));
        let sink = Arc::clone(&log);
        events.on_after_drop(move |id, item| {
            sink.lock().unwrap().push(("drop", id.to_string(), item.lat))
        });

        marker.drag_to(LatLng::new(10.0, 20.0));
        assert_eq!(collection.get("M").unwrap().position(), LatLng::new(10.0, 20.0));
        assert_eq!(log.lock().unwrap().len(), 1);

        marker.drag_end_at(LatLng::new(11.0, 21.0));
        assert_eq!(collection.get("M").unwrap().position(), LatLng::new(11.0, 21.0));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                ("drag", "M".to_string(), 10.0),
                ("drop", "M".to_string(), 11.0)
            ]
        );
    }

    #[test]
    fn click_reports_id_and_marker() {
        let (_collection, events, marker, drag) = setup();
        drag.wire_click("M", &marker);

        let clicked = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&clicked);
        events.on_item_click(move |id, marker| {
            *sink.lock().unwrap() = Some((id.to_string(), marker.serial()));
        });

        marker.click();
        assert_eq!(
            *clicked.lock().unwrap(),
            Some(("M".to_string(), marker.serial()))
        );
    }

    #[test]
    fn drag_of_removed_item_is_ignored() {
        let (collection, events, marker, drag) = setup();
        drag.wire_drag("M", &marker);
        collection.remove("M");

        let fired = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&fired);
        events.on_drag(move |_, _| *sink.lock().unwrap() += 1);

        marker.drag_to(LatLng::new(1.0, 1.0));
        assert_eq!(*fired.lock().unwrap(), 0);
    }
}
