//! Capability interface of the external mapping engine.
//!
//! The crate never renders anything itself. It drives an engine through
//! [`MapEngine`] and keeps engine handles (maps, markers, heat layers) as
//! opaque, cheaply cloneable references, the same way a script-side widget
//! holds references to engine objects.

mod recording;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::MapType;
use crate::geo::LatLng;
use crate::item::MapItem;

pub use recording::{EngineCall, RecordingEngine, RecordingHeatmap, RecordingMap, RecordingMarker};

/// Listener for a marker gesture. Receives the marker the gesture happened on.
pub type GestureListener<M> = Box<dyn Fn(&M) + Send + Sync>;

/// Options used to construct the engine map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    pub zoom: f64,
    pub center: LatLng,
    pub map_type: MapType,
    pub map_id: Option<String>,
}

/// Pin-element styling for the default marker glyph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub glyph: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

/// Custom visual content of a marker, produced by the item template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerContent {
    Html(String),
    Pin(PinOptions),
}

/// Visual properties of a marker.
///
/// When applied to an existing marker, `content: None` leaves the current
/// content in place.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerOptions {
    pub position: LatLng,
    pub title: String,
    pub draggable: bool,
    pub content: Option<MarkerContent>,
}

impl MarkerOptions {
    pub fn from_item(item: &MapItem) -> Self {
        MarkerOptions {
            position: item.position(),
            title: item.title.clone().unwrap_or_default(),
            draggable: item.draggable,
            content: None,
        }
    }
}

/// One weighted location of a heat layer, carrying the source item's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatPoint {
    pub location: LatLng,
    pub fields: Map<String, Value>,
}

impl HeatPoint {
    pub fn from_item(item: &MapItem) -> Self {
        HeatPoint {
            location: item.position(),
            fields: item.to_fields(),
        }
    }
}

/// Construction options of a heat layer: the configured passthrough keys plus
/// the computed point list.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapOptions {
    pub config: Map<String, Value>,
    pub data: Vec<HeatPoint>,
}

pub trait MapHandle: Clone + Send + Sync + 'static {
    fn set_center(&self, center: LatLng);
    fn set_zoom(&self, zoom: f64);
    fn set_map_type(&self, map_type: &MapType);
    /// Tag the engine's internal drag layer so the host's own gesture system
    /// ignores drags that start on the map.
    fn disable_host_drag(&self);
}

pub trait MarkerHandle<M: MapHandle>: Clone + Send + Sync + 'static {
    /// Attach to a map, or detach from view with `None`.
    fn set_map(&self, map: Option<&M>);
    /// Merge visual properties into the marker.
    fn apply(&self, options: &MarkerOptions);
    fn position(&self) -> LatLng;
    fn on_click(&self, listener: GestureListener<Self>);
    fn on_drag(&self, listener: GestureListener<Self>);
    fn on_drag_end(&self, listener: GestureListener<Self>);
}

pub trait HeatmapHandle<M: MapHandle>: Clone + Send + Sync + 'static {
    fn set_map(&self, map: Option<&M>);
    fn point_count(&self) -> usize;
}

pub trait MapEngine: Send + Sync + 'static {
    type Map: MapHandle;
    type Marker: MarkerHandle<Self::Map>;
    type Heatmap: HeatmapHandle<Self::Map>;

    /// Build the map inside the host surface identified by `surface`.
    fn create_map(&self, surface: &str, options: &MapOptions) -> Self::Map;

    /// Build a marker; `map: None` creates it detached from view.
    fn create_marker(&self, options: &MarkerOptions, map: Option<&Self::Map>) -> Self::Marker;

    fn create_heatmap(&self, options: &HeatmapOptions, map: &Self::Map) -> Self::Heatmap;

    /// Tell the engine its container changed size.
    fn trigger_resize(&self, map: &Self::Map);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn marker_options_from_item() {
        let item = MapItem::new("a", 1.0, 2.0).with_draggable(true);
        let options = MarkerOptions::from_item(&item);

        assert_eq!(options.position, LatLng::new(1.0, 2.0));
        assert_eq!(options.title, "");
        assert!(options.draggable);
        assert!(options.content.is_none());
    }

    #[test]
    fn heat_point_keeps_item_fields() {
        let item = MapItem::new("h", 3.0, 4.0).with_field("weight", 2);
        let point = HeatPoint::from_item(&item);

        assert_eq!(point.location, LatLng::new(3.0, 4.0));
        assert_eq!(point.fields.get("weight"), Some(&json!(2)));
        assert_eq!(point.fields.get("id"), Some(&json!("h")));
    }
}
