//! Incremental projection of the collection onto map overlays.
//!
//! [`OverlaySync`] listens to the collection and feeds every notification,
//! in emission order, to the [`OverlaySyncStrategy`] chosen for the layer
//! type. Notifications that arrive before the map exists are buffered and
//! replayed, oldest first, as soon as the readiness gate resolves.
//!
//! ```text
//!  collection ──StoreEvent──▶ pending queue ──(map ready)──▶ strategy ──▶ engine
//!                                                               │
//!                                                               └──▶ WidgetEvents
//! ```

mod heatmap;
mod marker;

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use crate::collection::{DataCollection, StoreEvent};
use crate::config::{LayerType, MapConfig};
use crate::drag::DragInteraction;
use crate::engine::MapEngine;
use crate::events::{MapEvent, WidgetEvents};
use crate::locks::lock;
use crate::ready::ReadinessGate;

pub use heatmap::HeatmapStrategy;
pub use marker::MarkerStrategy;

/// Collaborators a strategy may use while applying a notification.
pub struct SyncContext<'a, E: MapEngine> {
    pub engine: &'a E,
    pub collection: &'a dyn DataCollection,
    pub drag: &'a DragInteraction<E>,
}

/// Layer-specific projection of collection notifications.
///
/// `apply` only runs once the map exists. Events to emit are returned rather
/// than emitted so listeners run outside the strategy lock.
pub trait OverlaySyncStrategy<E: MapEngine>: Send {
    fn layer_type(&self) -> LayerType;

    fn apply(
        &mut self,
        map: &E::Map,
        event: &StoreEvent,
        ctx: &SyncContext<'_, E>,
    ) -> Vec<MapEvent<E>>;

    /// The marker associated with an item id.
    fn marker(&self, _id: &str) -> Option<E::Marker> {
        None
    }

    /// Ids with a live overlay association, in no particular order.
    fn associated_ids(&self) -> Vec<String> {
        Vec::new()
    }

    fn heatmap(&self) -> Option<E::Heatmap> {
        None
    }

    /// Remove every overlay from view without dropping associations.
    fn detach_all(&mut self) {}
}

/// The strategy for a layer type, or `None` when the layer type has no sync
/// path.
pub fn strategy_for<E: MapEngine>(config: &MapConfig) -> Option<Box<dyn OverlaySyncStrategy<E>>> {
    match &config.layer_type {
        LayerType::Marker => Some(Box::new(MarkerStrategy::<E>::new(
            config.template.clone(),
        ))),
        LayerType::Heatmap => Some(Box::new(HeatmapStrategy::<E>::new(
            config.heatmap_config.clone(),
        ))),
        LayerType::Other(name) => {
            tracing::warn!(layer_type = %name, "no overlay sync for layer type");
            None
        }
    }
}

struct SyncState<M> {
    map: Option<M>,
    pending: VecDeque<StoreEvent>,
    draining: bool,
}

struct SyncInner<E: MapEngine> {
    engine: Arc<E>,
    collection: Arc<dyn DataCollection>,
    events: WidgetEvents<E>,
    drag: DragInteraction<E>,
    strategy: Mutex<Box<dyn OverlaySyncStrategy<E>>>,
    state: Mutex<SyncState<E::Map>>,
}

/// Buffers collection notifications until the map exists, then applies them
/// strictly in arrival order.
pub struct OverlaySync<E: MapEngine> {
    inner: Arc<SyncInner<E>>,
}

impl<E: MapEngine> Clone for OverlaySync<E> {
    fn clone(&self) -> Self {
        OverlaySync {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: MapEngine> OverlaySync<E> {
    /// Subscribe `strategy` to the collection and to the readiness gate.
    pub fn attach(
        engine: Arc<E>,
        collection: Arc<dyn DataCollection>,
        events: WidgetEvents<E>,
        strategy: Box<dyn OverlaySyncStrategy<E>>,
        gate: &ReadinessGate<E::Map>,
    ) -> Self {
        let drag = DragInteraction::new(Arc::clone(&collection), events.clone());
        let inner = Arc::new(SyncInner {
            engine,
            collection: Arc::clone(&collection),
            events,
            drag,
            strategy: Mutex::new(strategy),
            state: Mutex::new(SyncState {
                map: None,
                pending: VecDeque::new(),
                draining: false,
            }),
        });

        // The collection outlives the widget; hold the sync weakly from it.
        let weak: Weak<SyncInner<E>> = Arc::downgrade(&inner);
        collection.subscribe(Arc::new(move |event: &StoreEvent| {
            if let Some(inner) = weak.upgrade() {
                OverlaySync { inner }.notify(event.clone());
            }
        }));

        let sync = OverlaySync { inner };
        let ready = sync.clone();
        gate.when_ready(move |map| ready.on_ready(map));
        sync
    }

    /// Queue a notification and apply everything queued if the map exists.
    pub fn notify(&self, event: StoreEvent) {
        {
            let mut state = lock(&self.inner.state);
            state.pending.push_back(event);
            if state.map.is_none() || state.draining {
                return;
            }
            state.draining = true;
        }
        self.drain();
    }

    fn on_ready(&self, map: E::Map) {
        {
            let mut state = lock(&self.inner.state);
            if state.map.is_some() {
                return;
            }
            tracing::debug!(
                buffered = state.pending.len(),
                "map ready, replaying buffered notifications"
            );
            state.map = Some(map);
            if state.draining {
                return;
            }
            state.draining = true;
        }
        self.drain();
    }

    // Runs with `draining` set. Notifications arriving from listeners while
    // draining are appended to `pending` and picked up by this loop.
    fn drain(&self) {
        loop {
            let (map, event) = {
                let mut state = lock(&self.inner.state);
                match (state.map.clone(), state.pending.pop_front()) {
                    (Some(map), Some(event)) => (map, event),
                    _ => {
                        state.draining = false;
                        return;
                    }
                }
            };

            tracing::trace!(op = ?event.op, id = ?event.id, "applying notification");
            let produced = {
                let ctx = SyncContext {
                    engine: self.inner.engine.as_ref(),
                    collection: self.inner.collection.as_ref(),
                    drag: &self.inner.drag,
                };
                lock(&self.inner.strategy).apply(&map, &event, &ctx)
            };

            for event in &produced {
                self.inner.events.emit(event);
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        lock(&self.inner.state).map.is_some()
    }

    /// Notifications waiting for the map.
    pub fn pending(&self) -> usize {
        lock(&self.inner.state).pending.len()
    }

    pub fn layer_type(&self) -> LayerType {
        lock(&self.inner.strategy).layer_type()
    }

    pub fn marker(&self, id: &str) -> Option<E::Marker> {
        lock(&self.inner.strategy).marker(id)
    }

    pub fn associated_ids(&self) -> Vec<String> {
        lock(&self.inner.strategy).associated_ids()
    }

    pub fn heatmap(&self) -> Option<E::Heatmap> {
        lock(&self.inner.strategy).heatmap()
    }

    pub fn detach_all(&self) {
        lock(&self.inner.strategy).detach_all();
    }
}

impl<E: MapEngine> fmt::Debug for OverlaySync<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlaySync")
            .field("layer_type", &self.layer_type())
            .field("ready", &self.is_ready())
            .field("pending", &self.pending())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::InMemoryCollection;
    use crate::engine::{MapOptions, RecordingEngine, RecordingMap};
    use crate::geo::LatLng;
    use crate::config::MapType;
    use crate::item::MapItem;

    fn map(engine: &RecordingEngine) -> RecordingMap {
        engine.create_map(
            "surface",
            &MapOptions {
                zoom: 5.0,
                center: LatLng::new(0.0, 0.0),
                map_type: MapType::Roadmap,
                map_id: None,
            },
        )
    }

    fn attach(
        engine: &RecordingEngine,
        collection: &InMemoryCollection,
        layer_type: LayerType,
    ) -> (OverlaySync<RecordingEngine>, ReadinessGate<RecordingMap>) {
        let gate = ReadinessGate::new();
        let config = MapConfig::new().with_layer_type(layer_type);
        let strategy = strategy_for::<RecordingEngine>(&config).unwrap();
        let sync = OverlaySync::attach(
            Arc::new(engine.clone()),
            Arc::new(collection.clone()),
            WidgetEvents::new(),
            strategy,
            &gate,
        );
        (sync, gate)
    }

    #[test]
    fn buffers_until_ready() {
        let engine = RecordingEngine::new();
        let collection = InMemoryCollection::new();
        let (sync, gate) = attach(&engine, &collection, LayerType::Marker);

        collection.add(MapItem::new("a", 1.0, 1.0));
        collection.add(MapItem::new("b", 2.0, 2.0));
        assert_eq!(sync.pending(), 2);
        assert_eq!(engine.markers_created(), 0);

        gate.resolve(map(&engine));

        assert_eq!(sync.pending(), 0);
        assert!(sync.is_ready());
        assert_eq!(engine.markers_created(), 2);
    }

    #[test]
    fn live_notifications_after_ready() {
        let engine = RecordingEngine::new();
        let collection = InMemoryCollection::new();
        let (sync, gate) = attach(&engine, &collection, LayerType::Marker);
        gate.resolve(map(&engine));

        collection.add(MapItem::new("a", 1.0, 1.0));
        assert!(sync.marker("a").is_some());
        assert_eq!(sync.pending(), 0);
    }

    #[test]
    fn unknown_layer_type_has_no_strategy() {
        let config = MapConfig::new().with_layer_type("polygons");
        assert!(strategy_for::<RecordingEngine>(&config).is_none());
    }

    #[test]
    fn dropped_sync_stops_listening() {
        let engine = RecordingEngine::new();
        let collection = InMemoryCollection::new();
        let (sync, gate) = attach(&engine, &collection, LayerType::Marker);
        drop(sync);
        drop(gate);

        collection.add(MapItem::new("a", 1.0, 1.0));
        assert_eq!(engine.markers_created(), 0);
    }

    #[test]
    fn layer_type_reported() {
        let engine = RecordingEngine::new();
        let collection = InMemoryCollection::new();
        let (sync, _gate) = attach(&engine, &collection, LayerType::Heatmap);
        assert_eq!(sync.layer_type(), LayerType::Heatmap);
    }
}
