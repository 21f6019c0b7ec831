use std::collections::HashMap;

use anyhow::anyhow;
use geo::CoordsIter;

/// String attributes of a feature, keyed by property name.
pub type FeatureMap = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub geometry: geo::Geometry,
    // TODO support different value types besides String. Numbers and booleans from GeoJSON are
    // stringified on read.
    pub attributes: Option<FeatureMap>,
}

impl From<geo::Geometry> for Feature {
    fn from(value: geo::Geometry) -> Self {
        Self {
            geometry: value,
            attributes: None,
        }
    }
}

impl Feature {
    pub fn new(geometry: geo::Geometry, attributes: FeatureMap) -> Self {
        Self {
            geometry,
            attributes: Some(attributes),
        }
    }

    /// Look up an attribute. Absent attribute maps and absent keys are treated the same.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .as_ref()
            .and_then(|attributes| attributes.get(key))
            .map(String::as_str)
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attribute(key).is_some()
    }

    /// The point of a point feature, `None` for every other geometry type.
    pub fn point(&self) -> Option<geo::Point> {
        match self.geometry {
            geo::Geometry::Point(point) => Some(point),
            _ => None,
        }
    }
}

fn property_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(value) => Some(value.to_owned()),
        serde_json::Value::Number(value) => Some(value.to_string()),
        serde_json::Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

impl TryFrom<geojson::Feature> for Feature {
    type Error = anyhow::Error;

    fn try_from(feature: geojson::Feature) -> anyhow::Result<Self> {
        let geometry = feature
            .geometry
            .ok_or_else(|| anyhow!("Feature has no geometry"))?;
        let geometry: geo::Geometry = geo::Geometry::try_from(geometry.value)
            .map_err(|err| anyhow!("Unsupported geometry, {}", err))?;
        if geometry
            .coords_iter()
            .any(|coord| !coord.x.is_finite() || !coord.y.is_finite())
        {
            return Err(anyhow!("Geometry has non-finite coordinates"));
        }

        let attributes = feature.properties.map(|properties| {
            properties
                .iter()
                .filter_map(|(key, value)| {
                    property_to_string(value).map(|value| (key.to_owned(), value))
                })
                .collect::<FeatureMap>()
        });
        Ok(Self {
            geometry,
            attributes,
        })
    }
}

impl From<&Feature> for geojson::Feature {
    fn from(feature: &Feature) -> Self {
        let properties = feature.attributes.as_ref().map(|attributes| {
            attributes
                .iter()
                .map(|(key, value)| (key.to_owned(), serde_json::Value::from(value.as_str())))
                .collect::<geojson::JsonObject>()
        });
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(geojson::Value::from(
                &feature.geometry,
            ))),
            id: None,
            properties,
            foreign_members: None,
        }
    }
}
