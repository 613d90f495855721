use std::fmt;

use serde::{Deserialize, Serialize};

/// Base map imagery. Unknown names are passed to the engine untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MapType {
    #[default]
    Roadmap,
    Satellite,
    Hybrid,
    Terrain,
    Other(String),
}

impl MapType {
    pub fn as_str(&self) -> &str {
        match self {
            MapType::Roadmap => "ROADMAP",
            MapType::Satellite => "SATELLITE",
            MapType::Hybrid => "HYBRID",
            MapType::Terrain => "TERRAIN",
            MapType::Other(name) => name,
        }
    }
}

impl From<&str> for MapType {
    fn from(name: &str) -> Self {
        match name {
            "ROADMAP" => MapType::Roadmap,
            "SATELLITE" => MapType::Satellite,
            "HYBRID" => MapType::Hybrid,
            "TERRAIN" => MapType::Terrain,
            other => MapType::Other(other.to_string()),
        }
    }
}

impl From<String> for MapType {
    fn from(name: String) -> Self {
        MapType::from(name.as_str())
    }
}

impl From<MapType> for String {
    fn from(map_type: MapType) -> Self {
        map_type.as_str().to_string()
    }
}

impl fmt::Display for MapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects how collection items are projected onto the map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LayerType {
    #[default]
    Marker,
    Heatmap,
    /// No sync strategy exists for this layer; the collection is not projected.
    Other(String),
}

impl LayerType {
    pub fn as_str(&self) -> &str {
        match self {
            LayerType::Marker => "marker",
            LayerType::Heatmap => "heatmap",
            LayerType::Other(name) => name,
        }
    }

    /// Engine feature module the layer depends on.
    pub fn library(&self) -> Option<&'static str> {
        match self {
            LayerType::Marker => Some("marker"),
            LayerType::Heatmap => Some("visualization"),
            LayerType::Other(_) => None,
        }
    }
}

impl From<&str> for LayerType {
    fn from(name: &str) -> Self {
        match name {
            "marker" => LayerType::Marker,
            "heatmap" => LayerType::Heatmap,
            other => LayerType::Other(other.to_string()),
        }
    }
}

impl From<String> for LayerType {
    fn from(name: String) -> Self {
        LayerType::from(name.as_str())
    }
}

impl From<LayerType> for String {
    fn from(layer_type: LayerType) -> Self {
        layer_type.as_str().to_string()
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_type_names() {
        assert_eq!(MapType::from("SATELLITE"), MapType::Satellite);
        assert_eq!(MapType::from("TERRAIN").as_str(), "TERRAIN");
        assert_eq!(MapType::default(), MapType::Roadmap);
    }

    #[test]
    fn unknown_map_type_passes_through() {
        let map_type = MapType::from("satellite");
        assert_eq!(map_type, MapType::Other("satellite".into()));
        assert_eq!(map_type.as_str(), "satellite");
    }

    #[test]
    fn layer_libraries() {
        assert_eq!(LayerType::Marker.library(), Some("marker"));
        assert_eq!(LayerType::Heatmap.library(), Some("visualization"));
        assert_eq!(LayerType::from("polygons").library(), None);
    }

    #[test]
    fn serde_as_plain_strings() {
        let json = serde_json::to_string(&LayerType::Heatmap).unwrap();
        assert_eq!(json, "\"heatmap\"");
        let parsed: MapType = serde_json::from_str("\"HYBRID\"").unwrap();
        assert_eq!(parsed, MapType::Hybrid);
    }
}
