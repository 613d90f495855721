//! Shared fixture for the integration suites.
//!
//! A [`Harness`] wires one recording engine, one headless host and one
//! loader, so several widgets built from it share the same script load.

#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use map_sync::{
    HeadlessHost, InMemoryCollection, MapConfig, MapItem, MapWidget, RecordingEngine,
    ResourceLoader,
};

static TRACING: Once = Once::new();

/// Route crate logs through the test writer. Filter with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct Harness {
    pub engine: RecordingEngine,
    pub host: HeadlessHost,
    pub loader: ResourceLoader,
}

impl Harness {
    pub fn new() -> Self {
        init_tracing();
        let host = HeadlessHost::new("map");
        Harness {
            engine: RecordingEngine::new(),
            loader: ResourceLoader::new(Arc::new(host.clone())),
            host,
        }
    }

    /// A harness whose page already links the engine library.
    pub fn preloaded() -> Self {
        let harness = Harness::new();
        harness.host.set_library_present(true);
        harness
    }

    pub fn widget(
        &self,
        config: MapConfig,
        collection: &InMemoryCollection,
    ) -> MapWidget<RecordingEngine> {
        self.widget_on(config, collection, self.host.clone())
    }

    /// Build a widget mounted on its own host surface, sharing this
    /// harness's loader.
    pub fn widget_on(
        &self,
        config: MapConfig,
        collection: &InMemoryCollection,
        host: HeadlessHost,
    ) -> MapWidget<RecordingEngine> {
        MapWidget::new(
            config,
            Arc::new(self.engine.clone()),
            Arc::new(host),
            self.loader.clone(),
            Arc::new(collection.clone()),
        )
        .unwrap()
    }
}

/// Records widget events as `"<event>:<id>"` strings, in emission order.
#[derive(Clone, Default)]
pub struct EventLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl EventLog {
    pub fn attach(widget: &MapWidget<RecordingEngine>) -> Self {
        let log = EventLog::default();
        let events = widget.events();

        let entries = Arc::clone(&log.entries);
        events.on_item_render(move |item: &MapItem| {
            entries.lock().unwrap().push(format!("render:{}", item.id));
        });
        let entries = Arc::clone(&log.entries);
        events.on_item_click(move |id, _| {
            entries.lock().unwrap().push(format!("click:{}", id));
        });
        let entries = Arc::clone(&log.entries);
        events.on_drag(move |id, _| {
            entries.lock().unwrap().push(format!("drag:{}", id));
        });
        let entries = Arc::clone(&log.entries);
        events.on_after_drop(move |id, _| {
            entries.lock().unwrap().push(format!("drop:{}", id));
        });
        let entries = Arc::clone(&log.entries);
        events.on_heatmap_render(move |layer| {
            entries
                .lock()
                .unwrap()
                .push(format!("heatmap:{}", map_sync::HeatmapHandle::point_count(layer)));
        });

        log
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.starts_with(prefix))
            .count()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}
