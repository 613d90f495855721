use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::geo::LatLng;

/// A record in the backing data collection.
///
/// Only `id`, `lat` and `lng` are required. Any other fields are kept in
/// `extra` and travel with the item into heat-map points and event payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapItem {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub draggable: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MapItem {
    pub fn new(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        MapItem {
            id: id.into(),
            lat,
            lng,
            title: None,
            hidden: false,
            draggable: false,
            extra: Map::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn set_position(&mut self, position: LatLng) {
        self.lat = position.lat;
        self.lng = position.lng;
    }

    /// All fields of the item as a JSON object, `extra` flattened in.
    pub fn to_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(fields)) => fields,
            _ => Map::new(),
        }
    }
}
