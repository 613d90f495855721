use std::marker::PhantomData;

use serde_json::{Map, Value};

use super::{OverlaySyncStrategy, SyncContext};
use crate::collection::StoreEvent;
use crate::config::LayerType;
use crate::engine::{HeatPoint, HeatmapHandle, HeatmapOptions, MapEngine};
use crate::events::MapEvent;

/// A single heat layer, rebuilt from the full collection on every
/// notification. There is no incremental path for heat data.
pub struct HeatmapStrategy<E: MapEngine> {
    config: Map<String, Value>,
    layer: Option<E::Heatmap>,
    _engine: PhantomData<fn() -> E>,
}

impl<E: MapEngine> HeatmapStrategy<E> {
    pub fn new(config: Map<String, Value>) -> Self {
        HeatmapStrategy {
            config,
            layer: None,
            _engine: PhantomData,
        }
    }
}

impl<E: MapEngine> OverlaySyncStrategy<E> for HeatmapStrategy<E> {
    fn layer_type(&self) -> LayerType {
        LayerType::Heatmap
    }

    fn apply(
        &mut self,
        map: &E::Map,
        _event: &StoreEvent,
        ctx: &SyncContext<'_, E>,
    ) -> Vec<MapEvent<E>> {
        if let Some(layer) = self.layer.take() {
            layer.set_map(None);
        }

        let data: Vec<HeatPoint> = ctx
            .collection
            .items()
            .iter()
            .map(HeatPoint::from_item)
            .collect();
        if data.is_empty() {
            tracing::trace!("heat layer cleared, no points");
            return Vec::new();
        }

        // Computed keys win over passthrough keys of the same name.
        let mut config = self.config.clone();
        config.remove("data");
        config.remove("map");
        let options = HeatmapOptions { config, data };
        let layer = ctx.engine.create_heatmap(&options, map);
        tracing::trace!(points = options.data.len(), "heat layer rebuilt");
        self.layer = Some(layer.clone());
        vec![MapEvent::HeatmapRender(layer)]
    }

    fn heatmap(&self) -> Option<E::Heatmap> {
        self.layer.clone()
    }

    fn detach_all(&mut self) {
        if let Some(layer) = &self.layer {
            layer.set_map(None);
        }
    }
}
