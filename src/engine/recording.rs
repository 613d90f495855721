//! RecordingEngine - headless engine for tests and server-side use.
//!
//! Every engine call is appended to a shared log, and handles keep their
//! visual state so callers can inspect what a real engine would display.
//! Marker gestures can be simulated with [`RecordingMarker::click`],
//! [`RecordingMarker::drag_to`] and [`RecordingMarker::drag_end_at`].

use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};

use super::{
    GestureListener, HeatPoint, HeatmapHandle, HeatmapOptions, MapEngine, MapHandle, MapOptions,
    MarkerContent, MarkerHandle, MarkerOptions,
};
use crate::config::MapType;
use crate::geo::LatLng;
use crate::locks::lock;

/// A call made against the engine, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    CreateMap {
        serial: u64,
        surface: String,
        options: MapOptions,
    },
    CreateMarker {
        serial: u64,
        options: MarkerOptions,
        attached: bool,
    },
    CreateHeatmap {
        serial: u64,
        points: usize,
    },
    Resize {
        map: u64,
    },
}

#[derive(Default)]
struct EngineLog {
    calls: Vec<EngineCall>,
    next_serial: u64,
}

impl EngineLog {
    fn next_serial(&mut self) -> u64 {
        self.next_serial += 1;
        self.next_serial
    }
}

/// Headless [`MapEngine`]. Clone-friendly via Arc; clones share the log.
#[derive(Clone, Default)]
pub struct RecordingEngine {
    log: Arc<Mutex<EngineLog>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.log).calls.clone()
    }

    pub fn maps_created(&self) -> usize {
        self.count(|call| matches!(call, EngineCall::CreateMap { .. }))
    }

    pub fn markers_created(&self) -> usize {
        self.count(|call| matches!(call, EngineCall::CreateMarker { .. }))
    }

    pub fn heatmaps_created(&self) -> usize {
        self.count(|call| matches!(call, EngineCall::CreateHeatmap { .. }))
    }

    pub fn resize_count(&self) -> usize {
        self.count(|call| matches!(call, EngineCall::Resize { .. }))
    }

    fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        lock(&self.log).calls.iter().filter(|&call| predicate(call)).count()
    }
}

impl fmt::Debug for RecordingEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingEngine")
            .field("calls", &lock(&self.log).calls.len())
            .finish()
    }
}

impl MapEngine for RecordingEngine {
    type Map = RecordingMap;
    type Marker = RecordingMarker;
    type Heatmap = RecordingHeatmap;

    fn create_map(&self, surface: &str, options: &MapOptions) -> RecordingMap {
        let mut log = lock(&self.log);
        let serial = log.next_serial();
        log.calls.push(EngineCall::CreateMap {
            serial,
            surface: surface.to_string(),
            options: options.clone(),
        });

        RecordingMap {
            serial,
            state: Arc::new(Mutex::new(MapState {
                center: options.center,
                zoom: options.zoom,
                map_type: options.map_type.clone(),
                map_id: options.map_id.clone(),
                host_drag_disabled: false,
            })),
        }
    }

    fn create_marker(&self, options: &MarkerOptions, map: Option<&RecordingMap>) -> RecordingMarker {
        let mut log = lock(&self.log);
        let serial = log.next_serial();
        log.calls.push(EngineCall::CreateMarker {
            serial,
            options: options.clone(),
            attached: map.is_some(),
        });

        RecordingMarker {
            serial,
            state: Arc::new(Mutex::new(MarkerState {
                options: options.clone(),
                map: map.map(RecordingMap::serial),
                click: Vec::new(),
                drag: Vec::new(),
                drag_end: Vec::new(),
            })),
        }
    }

    fn create_heatmap(&self, options: &HeatmapOptions, map: &RecordingMap) -> RecordingHeatmap {
        let mut log = lock(&self.log);
        let serial = log.next_serial();
        log.calls.push(EngineCall::CreateHeatmap {
            serial,
            points: options.data.len(),
        });

        RecordingHeatmap {
            serial,
            points: Arc::new(options.data.clone()),
            config: Arc::new(options.config.clone()),
            map: Arc::new(Mutex::new(Some(map.serial()))),
        }
    }

    fn trigger_resize(&self, map: &RecordingMap) {
        lock(&self.log).calls.push(EngineCall::Resize { map: map.serial() });
    }
}

struct MapState {
    center: LatLng,
    zoom: f64,
    map_type: MapType,
    map_id: Option<String>,
    host_drag_disabled: bool,
}

#[derive(Clone)]
pub struct RecordingMap {
    serial: u64,
    state: Arc<Mutex<MapState>>,
}

impl RecordingMap {
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn center(&self) -> LatLng {
        lock(&self.state).center
    }

    pub fn zoom(&self) -> f64 {
        lock(&self.state).zoom
    }

    pub fn map_type(&self) -> MapType {
        lock(&self.state).map_type.clone()
    }

    pub fn map_id(&self) -> Option<String> {
        lock(&self.state).map_id.clone()
    }

    pub fn host_drag_disabled(&self) -> bool {
        lock(&self.state).host_drag_disabled
    }
}

impl PartialEq for RecordingMap {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial
    }
}

impl fmt::Debug for RecordingMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingMap")
            .field("serial", &self.serial)
            .finish()
    }
}

impl MapHandle for RecordingMap {
    fn set_center(&self, center: LatLng) {
        lock(&self.state).center = center;
    }

    fn set_zoom(&self, zoom: f64) {
        lock(&self.state).zoom = zoom;
    }

    fn set_map_type(&self, map_type: &MapType) {
        lock(&self.state).map_type = map_type.clone();
    }

    fn disable_host_drag(&self) {
        lock(&self.state).host_drag_disabled = true;
    }
}

type SharedListener = Arc<dyn Fn(&RecordingMarker) + Send + Sync>;

struct MarkerState {
    options: MarkerOptions,
    map: Option<u64>,
    click: Vec<SharedListener>,
    drag: Vec<SharedListener>,
    drag_end: Vec<SharedListener>,
}

#[derive(Clone)]
pub struct RecordingMarker {
    serial: u64,
    state: Arc<Mutex<MarkerState>>,
}

impl RecordingMarker {
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.state).map.is_some()
    }

    /// Serial of the map the marker is attached to.
    pub fn map_serial(&self) -> Option<u64> {
        lock(&self.state).map
    }

    pub fn options(&self) -> MarkerOptions {
        lock(&self.state).options.clone()
    }

    pub fn title(&self) -> String {
        lock(&self.state).options.title.clone()
    }

    pub fn draggable(&self) -> bool {
        lock(&self.state).options.draggable
    }

    pub fn content(&self) -> Option<MarkerContent> {
        lock(&self.state).options.content.clone()
    }

    /// Number of (click, drag, drag-end) listeners registered.
    pub fn listener_counts(&self) -> (usize, usize, usize) {
        let state = lock(&self.state);
        (state.click.len(), state.drag.len(), state.drag_end.len())
    }

    pub fn click(&self) {
        let listeners = lock(&self.state).click.clone();
        self.fire(&listeners);
    }

    /// Move the marker and fire an intermediate drag frame.
    pub fn drag_to(&self, position: LatLng) {
        let listeners = {
            let mut state = lock(&self.state);
            state.options.position = position;
            state.drag.clone()
        };
        self.fire(&listeners);
    }

    /// Move the marker and fire the end of the drag gesture.
    pub fn drag_end_at(&self, position: LatLng) {
        let listeners = {
            let mut state = lock(&self.state);
            state.options.position = position;
            state.drag_end.clone()
        };
        self.fire(&listeners);
    }

    fn fire(&self, listeners: &[SharedListener]) {
        for listener in listeners {
            listener(self);
        }
    }
}

impl PartialEq for RecordingMarker {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial
    }
}

impl fmt::Debug for RecordingMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("RecordingMarker")
            .field("serial", &self.serial)
            .field("options", &state.options)
            .field("map", &state.map)
            .finish()
    }
}

impl MarkerHandle<RecordingMap> for RecordingMarker {
    fn set_map(&self, map: Option<&RecordingMap>) {
        lock(&self.state).map = map.map(RecordingMap::serial);
    }

    fn apply(&self, options: &MarkerOptions) {
        let mut state = lock(&self.state);
        state.options.position = options.position;
        state.options.title = options.title.clone();
        state.options.draggable = options.draggable;
        if let Some(content) = &options.content {
            state.options.content = Some(content.clone());
        }
    }

    fn position(&self) -> LatLng {
        lock(&self.state).options.position
    }

    fn on_click(&self, listener: GestureListener<Self>) {
        lock(&self.state).click.push(Arc::from(listener));
    }

    fn on_drag(&self, listener: GestureListener<Self>) {
        lock(&self.state).drag.push(Arc::from(listener));
    }

    fn on_drag_end(&self, listener: GestureListener<Self>) {
        lock(&self.state).drag_end.push(Arc::from(listener));
    }
}

#[derive(Clone)]
pub struct RecordingHeatmap {
    serial: u64,
    points: Arc<Vec<HeatPoint>>,
    config: Arc<Map<String, Value>>,
    map: Arc<Mutex<Option<u64>>>,
}

impl RecordingHeatmap {
    pub fn serial(&self) -> u64 {
        self.serial
    }

    pub fn points(&self) -> &[HeatPoint] {
        &self.points
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn is_attached(&self) -> bool {
        lock(&self.map).is_some()
    }
}

impl PartialEq for RecordingHeatmap {
    fn eq(&self, other: &Self) -> bool {
        self.serial == other.serial
    }
}

impl fmt::Debug for RecordingHeatmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingHeatmap")
            .field("serial", &self.serial)
            .field("points", &self.points.len())
            .finish()
    }
}

impl HeatmapHandle<RecordingMap> for RecordingHeatmap {
    fn set_map(&self, map: Option<&RecordingMap>) {
        *lock(&self.map) = map.map(RecordingMap::serial);
    }

    fn point_count(&self) -> usize {
        self.points.len()
    }
}
