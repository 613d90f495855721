//! Declarative widget configuration.
//!
//! `MapConfig` mirrors the option object a host framework hands to the widget:
//! camelCase keys, every field optional, defaults filled in on decode.
//!
//! ```
//! use map_sync::{LayerType, MapConfig};
//!
//! let config = MapConfig::from_json(r#"{ "layerType": "heatmap", "zoom": 7 }"#).unwrap();
//! assert_eq!(config.layer_type, LayerType::Heatmap);
//! assert_eq!(config.center, [39.5, -98.5]);
//! ```

mod types;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::engine::MarkerContent;
use crate::error::ConfigError;
use crate::item::MapItem;

pub use types::{LayerType, MapType};

/// Script fetched when no `src` override is configured.
pub const DEFAULT_SCRIPT_SRC: &str = "//maps.google.com/maps/api/js";
pub const DEFAULT_ZOOM: f64 = 5.0;
pub const DEFAULT_CENTER: [f64; 2] = [39.5, -98.5];

/// Produces the custom visual content of a marker for an item.
pub type ItemTemplate = Arc<dyn Fn(&MapItem) -> MarkerContent + Send + Sync>;

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapConfig {
    /// Script URL override.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// API credential appended to the script URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Extra engine feature modules; accepts a list or a comma separated string.
    #[serde(deserialize_with = "libraries_list")]
    pub libraries: Vec<String>,
    /// Map styling id, passed to map creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_id: Option<String>,
    pub zoom: f64,
    pub center: [f64; 2],
    pub map_type: MapType,
    pub layer_type: LayerType,
    #[serde(deserialize_with = "object_or_empty")]
    pub heatmap_config: Map<String, Value>,
    #[serde(skip)]
    pub template: Option<ItemTemplate>,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            src: None,
            key: None,
            libraries: Vec::new(),
            map_id: None,
            zoom: DEFAULT_ZOOM,
            center: DEFAULT_CENTER,
            map_type: MapType::default(),
            layer_type: LayerType::default(),
            heatmap_config: Map::new(),
            template: None,
        }
    }
}

impl fmt::Debug for MapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapConfig")
            .field("src", &self.src)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("libraries", &self.libraries)
            .field("map_id", &self.map_id)
            .field("zoom", &self.zoom)
            .field("center", &self.center)
            .field("map_type", &self.map_type)
            .field("layer_type", &self.layer_type)
            .field("heatmap_config", &self.heatmap_config)
            .field("template", &self.template.is_some())
            .finish()
    }
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: MapConfig = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        let config: MapConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.center[0].is_finite() {
            return Err(ConfigError::NonFiniteCoordinate { field: "center.lat" });
        }
        if !self.center[1].is_finite() {
            return Err(ConfigError::NonFiniteCoordinate { field: "center.lng" });
        }
        if !self.zoom.is_finite() || self.zoom < 0.0 {
            return Err(ConfigError::InvalidZoom(self.zoom.to_string()));
        }
        Ok(())
    }

    pub fn with_src(mut self, src: impl Into<String>) -> Self {
        self.src = Some(src.into());
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.libraries.push(library.into());
        self
    }

    pub fn with_map_id(mut self, map_id: impl Into<String>) -> Self {
        self.map_id = Some(map_id.into());
        self
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn with_center(mut self, lat: f64, lng: f64) -> Self {
        self.center = [lat, lng];
        self
    }

    pub fn with_map_type(mut self, map_type: impl Into<MapType>) -> Self {
        self.map_type = map_type.into();
        self
    }

    pub fn with_layer_type(mut self, layer_type: impl Into<LayerType>) -> Self {
        self.layer_type = layer_type.into();
        self
    }

    pub fn with_heatmap_config(mut self, config: Map<String, Value>) -> Self {
        self.heatmap_config = config;
        self
    }

    pub fn with_template<F>(mut self, template: F) -> Self
    where
        F: Fn(&MapItem) -> MarkerContent + Send + Sync + 'static,
    {
        self.template = Some(Arc::new(template));
        self
    }

    /// The loader slice of this configuration. The layer's own library comes
    /// first, followed by any configured extras not already listed.
    pub fn loader_config(&self) -> LoaderConfig {
        let mut libraries: Vec<String> = Vec::new();
        if let Some(library) = self.layer_type.library() {
            libraries.push(library.to_string());
        }
        for library in &self.libraries {
            if !libraries.contains(library) {
                libraries.push(library.clone());
            }
        }

        LoaderConfig {
            src: self
                .src
                .clone()
                .unwrap_or_else(|| DEFAULT_SCRIPT_SRC.to_string()),
            key: self.key.clone(),
            libraries,
        }
    }
}

/// What the resource loader needs to build the script URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    pub src: String,
    pub key: Option<String>,
    pub libraries: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            src: DEFAULT_SCRIPT_SRC.to_string(),
            key: None,
            libraries: Vec::new(),
        }
    }
}

impl LoaderConfig {
    pub fn script_url(&self) -> String {
        let mut url = self.src.clone();
        let mut separator = if url.contains('?') { '&' } else { '?' };

        if let Some(key) = &self.key {
            url.push(separator);
            url.push_str("key=");
            url.push_str(key);
            separator = '&';
        }

        if !self.libraries.is_empty() {
            url.push(separator);
            url.push_str("libraries=");
            url.push_str(&self.libraries.join(","));
        }

        url
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Libraries {
    List(Vec<String>),
    Joined(String),
}

fn libraries_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Libraries>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(Libraries::List(list)) => list,
        Some(Libraries::Joined(joined)) => joined
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect(),
    })
}

fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}
