use std::collections::{HashMap, HashSet};
use std::marker::PhantomData;

use super::{OverlaySyncStrategy, SyncContext};
use crate::collection::{StoreEvent, StoreOp};
use crate::config::{ItemTemplate, LayerType};
use crate::engine::{MapEngine, MarkerHandle, MarkerOptions};
use crate::events::MapEvent;
use crate::item::MapItem;

struct MarkerEntry<K> {
    marker: K,
    drag_wired: bool,
}

/// One marker per item, kept in an id → marker association.
///
/// Hidden items keep their marker, detached from the map, so showing them
/// again reuses the same object.
pub struct MarkerStrategy<E: MapEngine> {
    template: Option<ItemTemplate>,
    markers: HashMap<String, MarkerEntry<E::Marker>>,
    _engine: PhantomData<fn() -> E>,
}

impl<E: MapEngine> MarkerStrategy<E> {
    pub fn new(template: Option<ItemTemplate>) -> Self {
        MarkerStrategy {
            template,
            markers: HashMap::new(),
            _engine: PhantomData,
        }
    }

    fn render(
        &mut self,
        map: &E::Map,
        item: &MapItem,
        ctx: &SyncContext<'_, E>,
        out: &mut Vec<MapEvent<E>>,
    ) {
        let mut options = MarkerOptions::from_item(item);
        let target = if item.hidden { None } else { Some(map) };

        match self.markers.get_mut(&item.id) {
            None => {
                options.content = self.template.as_ref().map(|template| template(item));
                let marker = ctx.engine.create_marker(&options, target);
                ctx.drag.wire_click(&item.id, &marker);
                if item.draggable {
                    ctx.drag.wire_drag(&item.id, &marker);
                }
                self.markers.insert(
                    item.id.clone(),
                    MarkerEntry {
                        marker,
                        drag_wired: item.draggable,
                    },
                );
            }
            Some(entry) => {
                options.content = self.template.as_ref().map(|template| template(item));
                entry.marker.apply(&options);
                if item.draggable && !entry.drag_wired {
                    ctx.drag.wire_drag(&item.id, &entry.marker);
                    entry.drag_wired = true;
                }
                entry.marker.set_map(target);
            }
        }

        out.push(MapEvent::ItemRender(item.clone()));
    }

    fn remove(&mut self, id: &str) {
        if let Some(entry) = self.markers.remove(id) {
            entry.marker.set_map(None);
        }
    }

    // Full pass over the collection: markers for ids that left are removed,
    // the rest are created or brought in line with the current item.
    fn reset(&mut self, map: &E::Map, ctx: &SyncContext<'_, E>, out: &mut Vec<MapEvent<E>>) {
        let items = ctx.collection.items();
        let live: HashSet<&str> = items.iter().map(|item| item.id.as_str()).collect();
        let stale: Vec<String> = self
            .markers
            .keys()
            .filter(|id| !live.contains(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            self.remove(&id);
        }

        for item in &items {
            self.render(map, item, ctx, out);
        }
    }
}

impl<E: MapEngine> OverlaySyncStrategy<E> for MarkerStrategy<E> {
    fn layer_type(&self) -> LayerType {
        LayerType::Marker
    }

    fn apply(
        &mut self,
        map: &E::Map,
        event: &StoreEvent,
        ctx: &SyncContext<'_, E>,
    ) -> Vec<MapEvent<E>> {
        let mut out = Vec::new();
        match (event.op, &event.item) {
            (StoreOp::Add, Some(item)) => self.render(map, item, ctx, &mut out),
            (StoreOp::Update, Some(item)) => {
                if self.markers.contains_key(&item.id) {
                    self.render(map, item, ctx, &mut out);
                } else {
                    tracing::trace!(id = %item.id, "update for an item without a marker");
                }
            }
            (StoreOp::Delete, _) => {
                if let Some(id) = event.id.as_deref() {
                    self.remove(id);
                }
            }
            _ => self.reset(map, ctx, &mut out),
        }
        out
    }

    fn marker(&self, id: &str) -> Option<E::Marker> {
        self.markers.get(id).map(|entry| entry.marker.clone())
    }

    fn associated_ids(&self) -> Vec<String> {
        self.markers.keys().cloned().collect()
    }

    fn detach_all(&mut self) {
        for entry in self.markers.values() {
            entry.marker.set_map(None);
        }
    }
}
