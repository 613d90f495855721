mod collection;
mod config;
mod drag;
mod engine;
mod error;
mod events;
mod geo;
mod host;
mod item;
mod loader;
mod locks;
mod ready;
mod surface;
mod sync;
mod widget;

pub use collection::{DataCollection, InMemoryCollection, StoreEvent, StoreListener, StoreOp};
pub use config::{
    ItemTemplate, LayerType, LoaderConfig, MapConfig, MapType, DEFAULT_CENTER, DEFAULT_SCRIPT_SRC,
    DEFAULT_ZOOM,
};
pub use drag::DragInteraction;
pub use engine::{
    EngineCall, GestureListener, HeatPoint, HeatmapHandle, HeatmapOptions, MapEngine, MapHandle,
    MapOptions, MarkerContent, MarkerHandle, MarkerOptions, PinOptions, RecordingEngine,
    RecordingHeatmap, RecordingMap, RecordingMarker,
};
pub use error::ConfigError;
#[cfg(feature = "emitter")]
pub use events::EmitterBridge;
pub use events::{EventKind, MapEvent, WidgetEvents};
pub use geo::LatLng;
pub use host::{HeadlessHost, ScriptHost, WidgetHost};
pub use item::MapItem;
pub use loader::ResourceLoader;
pub use ready::{ReadinessGate, WaitReady};
pub use surface::MapSurface;
pub use sync::{strategy_for, HeatmapStrategy, MarkerStrategy, OverlaySync, OverlaySyncStrategy, SyncContext};
pub use widget::MapWidget;

// Re-export the emitter so hosts can bridge widget events without a direct dependency.
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
