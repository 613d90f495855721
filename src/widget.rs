//! The widget facade tying loader, surface and overlay sync together.

use std::fmt;
use std::sync::Arc;

use crate::collection::DataCollection;
use crate::config::{LayerType, MapConfig, MapType};
use crate::engine::MapEngine;
use crate::error::ConfigError;
use crate::events::WidgetEvents;
use crate::host::WidgetHost;
use crate::item::MapItem;
use crate::loader::ResourceLoader;
use crate::ready::{ReadinessGate, WaitReady};
use crate::surface::MapSurface;
use crate::sync::{strategy_for, OverlaySync};

/// A map widget bound to one data collection.
///
/// Construction subscribes the overlay sync to the collection right away, so
/// items added before the map exists are rendered once it does.
pub struct MapWidget<E: MapEngine> {
    config: MapConfig,
    loader: ResourceLoader,
    collection: Arc<dyn DataCollection>,
    events: WidgetEvents<E>,
    gate: ReadinessGate<E::Map>,
    surface: Arc<MapSurface<E>>,
    sync: Option<OverlaySync<E>>,
}

impl<E: MapEngine> MapWidget<E> {
    pub fn new(
        config: MapConfig,
        engine: Arc<E>,
        host: Arc<dyn WidgetHost>,
        loader: ResourceLoader,
        collection: Arc<dyn DataCollection>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let events = WidgetEvents::new();
        let gate = ReadinessGate::new();
        let widget_id = host.widget_id();
        let surface = Arc::new(MapSurface::new(
            Arc::clone(&engine),
            host,
            gate.clone(),
            &config,
        ));
        let sync = strategy_for::<E>(&config).map(|strategy| {
            OverlaySync::attach(
                engine,
                Arc::clone(&collection),
                events.clone(),
                strategy,
                &gate,
            )
        });

        tracing::debug!(
            widget = %widget_id,
            layer_type = %config.layer_type,
            "map widget created"
        );

        Ok(MapWidget {
            config,
            loader,
            collection,
            events,
            gate,
            surface,
            sync,
        })
    }

    /// Make sure the engine is loaded, then create the map.
    ///
    /// Safe to call repeatedly. A render while the widget is hidden loads
    /// the engine but leaves the map uncreated until a later render.
    pub fn render(&self) {
        let surface = Arc::clone(&self.surface);
        self.loader
            .ensure_loaded(&self.config.loader_config(), move || {
                surface.create();
            });
    }

    pub fn map(&self) -> Option<E::Map> {
        self.gate.get()
    }

    /// A future resolving to the map once it exists.
    pub fn wait_map(&self) -> WaitReady<E::Map> {
        self.gate.wait()
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_resolved()
    }

    /// Load items into the collection once the map exists.
    pub fn parse(&self, items: Vec<MapItem>) {
        if self.gate.is_resolved() {
            self.collection.parse(items);
            return;
        }

        tracing::debug!(items = items.len(), "map not ready, deferring parse");
        let collection = Arc::clone(&self.collection);
        self.gate.when_ready(move |_| collection.parse(items));
    }

    pub fn set_center(&self, lat: f64, lng: f64) -> [f64; 2] {
        self.surface.set_center(lat, lng)
    }

    pub fn set_zoom(&self, zoom: f64) -> f64 {
        self.surface.set_zoom(zoom)
    }

    pub fn set_map_type(&self, map_type: impl Into<MapType>) -> MapType {
        self.surface.set_map_type(map_type)
    }

    pub fn center(&self) -> [f64; 2] {
        self.surface.center()
    }

    pub fn zoom(&self) -> f64 {
        self.surface.zoom()
    }

    pub fn map_type(&self) -> MapType {
        self.surface.map_type()
    }

    pub fn on_resize(&self) {
        self.surface.on_resize();
    }

    /// Center the map on an item. Returns the new center, or `None` for an
    /// unknown id.
    pub fn show_item(&self, id: &str) -> Option<[f64; 2]> {
        let item = self.collection.get(id)?;
        Some(self.surface.set_center(item.lat, item.lng))
    }

    /// Remove every overlay from view and empty the collection.
    pub fn clear_all(&self) {
        if let Some(sync) = &self.sync {
            sync.detach_all();
        }
        self.collection.clear();
    }

    pub fn marker(&self, id: &str) -> Option<E::Marker> {
        self.sync.as_ref().and_then(|sync| sync.marker(id))
    }

    pub fn heatmap(&self) -> Option<E::Heatmap> {
        self.sync.as_ref().and_then(|sync| sync.heatmap())
    }

    pub fn layer_type(&self) -> &LayerType {
        &self.config.layer_type
    }

    pub fn events(&self) -> &WidgetEvents<E> {
        &self.events
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn collection(&self) -> &Arc<dyn DataCollection> {
        &self.collection
    }
}

impl<E: MapEngine> fmt::Debug for MapWidget<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapWidget")
            .field("config", &self.config)
            .field("surface", &self.surface)
            .field("sync", &self.sync)
            .finish()
    }
}
