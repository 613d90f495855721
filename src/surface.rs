//! The engine map bound to the widget's surface.

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::config::{MapConfig, MapType};
use crate::engine::{MapEngine, MapHandle, MapOptions};
use crate::host::WidgetHost;
use crate::locks::lock;
use crate::ready::ReadinessGate;

#[derive(Debug, Clone, PartialEq)]
struct ViewState {
    zoom: f64,
    center: [f64; 2],
    map_type: MapType,
    map_id: Option<String>,
}

/// Owns the map handle and translates view settings into engine calls.
///
/// Setters always store the value; they reach the engine only once the map
/// exists, and values set earlier are used when the map is created.
pub struct MapSurface<E: MapEngine> {
    engine: Arc<E>,
    host: Arc<dyn WidgetHost>,
    gate: ReadinessGate<E::Map>,
    view: Mutex<ViewState>,
    // Held across the existence check and `create_map`.
    created: Mutex<Option<E::Map>>,
}

impl<E: MapEngine> MapSurface<E> {
    pub fn new(
        engine: Arc<E>,
        host: Arc<dyn WidgetHost>,
        gate: ReadinessGate<E::Map>,
        config: &MapConfig,
    ) -> Self {
        MapSurface {
            engine,
            host,
            gate,
            view: Mutex::new(ViewState {
                zoom: config.zoom,
                center: config.center,
                map_type: config.map_type.clone(),
                map_id: config.map_id.clone(),
            }),
            created: Mutex::new(None),
        }
    }

    /// Create the map if the widget is visible and resolve the readiness gate
    /// with it.
    ///
    /// Returns the existing map if one was already created. Returns `None`,
    /// without touching the gate, while the widget is hidden; a later render
    /// has to call this again.
    pub fn create(&self) -> Option<E::Map> {
        let map = {
            let mut created = lock(&self.created);
            if let Some(map) = created.as_ref() {
                return Some(map.clone());
            }

            let widget_id = self.host.widget_id();
            if !self.host.is_visible(&widget_id) {
                tracing::debug!(widget = %widget_id, "widget hidden, map creation skipped");
                return None;
            }

            let options = {
                let view = lock(&self.view);
                MapOptions {
                    zoom: view.zoom,
                    center: view.center.into(),
                    map_type: view.map_type.clone(),
                    map_id: view.map_id.clone(),
                }
            };

            let map = self.engine.create_map(&self.host.surface(), &options);
            map.disable_host_drag();
            tracing::debug!(
                widget = %widget_id,
                zoom = options.zoom,
                map_type = %options.map_type,
                "map created"
            );
            *created = Some(map.clone());
            map
        };

        // Resolved outside the lock; gate callbacks may call back in.
        self.gate.resolve(map.clone());
        Some(map)
    }

    pub fn map(&self) -> Option<E::Map> {
        lock(&self.created).clone()
    }

    pub fn set_center(&self, lat: f64, lng: f64) -> [f64; 2] {
        let center = [lat, lng];
        lock(&self.view).center = center;
        if let Some(map) = self.map() {
            map.set_center(center.into());
        }
        center
    }

    pub fn set_zoom(&self, zoom: f64) -> f64 {
        lock(&self.view).zoom = zoom;
        if let Some(map) = self.map() {
            map.set_zoom(zoom);
        }
        zoom
    }

    pub fn set_map_type(&self, map_type: impl Into<MapType>) -> MapType {
        let map_type = map_type.into();
        lock(&self.view).map_type = map_type.clone();
        if let Some(map) = self.map() {
            map.set_map_type(&map_type);
        }
        map_type
    }

    pub fn center(&self) -> [f64; 2] {
        lock(&self.view).center
    }

    pub fn zoom(&self) -> f64 {
        lock(&self.view).zoom
    }

    pub fn map_type(&self) -> MapType {
        lock(&self.view).map_type.clone()
    }

    /// Forward a container resize to the engine.
    pub fn on_resize(&self) {
        if let Some(map) = self.map() {
            self.engine.trigger_resize(&map);
        }
    }
}

impl<E: MapEngine> fmt::Debug for MapSurface<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapSurface")
            .field("view", &*lock(&self.view))
            .field("created", &lock(&self.created).is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineCall, RecordingEngine, RecordingMap};
    use crate::geo::LatLng;
    use crate::host::HeadlessHost;
    use std::sync::Barrier;
    use std::thread;

    fn surface(
        config: &MapConfig,
    ) -> (
        RecordingEngine,
        HeadlessHost,
        ReadinessGate<RecordingMap>,
        MapSurface<RecordingEngine>,
    ) {
        let engine = RecordingEngine::new();
        let host = HeadlessHost::new("map1");
        let gate = ReadinessGate::new();
        let surface = MapSurface::new(
            Arc::new(engine.clone()),
            Arc::new(host.clone()),
            gate.clone(),
            config,
        );
        (engine, host, gate, surface)
    }

    #[test]
    fn create_uses_config_and_resolves_gate() {
        let config = MapConfig::new()
            .with_zoom(8.0)
            .with_center(10.0, 20.0)
            .with_map_type(MapType::Satellite)
            .with_map_id("style");
        let (engine, _host, gate, surface) = surface(&config);

        let map = surface.create().unwrap();

        assert_eq!(gate.get(), Some(map.clone()));
        assert!(map.host_drag_disabled());
        assert_eq!(map.center(), LatLng::new(10.0, 20.0));
        assert_eq!(map.map_id().as_deref(), Some("style"));
        match &engine.calls()[0] {
            EngineCall::CreateMap { surface, options, .. } => {
                assert_eq!(surface, "map1_map_content");
                assert_eq!(options.zoom, 8.0);
                assert_eq!(options.map_type, MapType::Satellite);
            }
            other => panic!("unexpected call {:?}", other),
        }
    }

    #[test]
    fn hidden_widget_skips_creation() {
        let (engine, host, gate, surface) = surface(&MapConfig::new());
        host.set_visible(false);

        assert!(surface.create().is_none());
        assert!(!gate.is_resolved());
        assert_eq!(engine.maps_created(), 0);

        host.set_visible(true);
        assert!(surface.create().is_some());
        assert!(gate.is_resolved());
    }

    #[test]
    fn map_is_never_recreated() {
        let (engine, _host, _gate, surface) = surface(&MapConfig::new());
        let first = surface.create().unwrap();
        let second = surface.create().unwrap();

        assert_eq!(first, second);
        assert_eq!(engine.maps_created(), 1);
    }

    #[test]
    fn concurrent_creates_build_one_map() {
        let (engine, _host, gate, surface) = surface(&MapConfig::new());
        let surface = Arc::new(surface);
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let surface = Arc::clone(&surface);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    surface.create()
                })
            })
            .collect();
        let maps: Vec<RecordingMap> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().unwrap())
            .collect();

        assert_eq!(engine.maps_created(), 1);
        let resolved = gate.get().unwrap();
        assert!(maps.iter().all(|map| *map == resolved));
    }

    #[test]
    fn setters_before_creation_are_stored() {
        let (_engine, _host, _gate, surface) = surface(&MapConfig::new());

        assert_eq!(surface.set_center(1.0, 2.0), [1.0, 2.0]);
        assert_eq!(surface.set_zoom(11.0), 11.0);
        assert_eq!(surface.set_map_type("HYBRID"), MapType::Hybrid);

        let map = surface.create().unwrap();
        assert_eq!(map.center(), LatLng::new(1.0, 2.0));
        assert_eq!(map.zoom(), 11.0);
        assert_eq!(map.map_type(), MapType::Hybrid);
    }

    #[test]
    fn setters_after_creation_reach_the_map() {
        let (_engine, _host, _gate, surface) = surface(&MapConfig::new());
        let map = surface.create().unwrap();

        surface.set_center(-5.0, 5.0);
        surface.set_zoom(3.0);
        surface.set_map_type("CUSTOM");

        assert_eq!(map.center(), LatLng::new(-5.0, 5.0));
        assert_eq!(map.zoom(), 3.0);
        assert_eq!(map.map_type(), MapType::Other("CUSTOM".into()));
        assert_eq!(surface.center(), [-5.0, 5.0]);
    }

    #[test]
    fn resize_only_with_map() {
        let (engine, _host, _gate, surface) = surface(&MapConfig::new());
        surface.on_resize();
        assert_eq!(engine.resize_count(), 0);

        surface.create();
        surface.on_resize();
        assert_eq!(engine.resize_count(), 1);
    }
}
