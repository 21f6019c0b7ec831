use geo::HaversineDestination;
use serde::Deserialize;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::geofile::feature::{Feature, FeatureMap};

use super::store::FeatureStore;

/// Number of vertices used to approximate a buffer circle.
pub const BUFFER_STEPS: usize = 64;

/// Attribute carrying the radius on generated buffer polygons.
pub const RADIUS_KEY: &str = "radius_km";

/// Buffer distances offered by the radius checkboxes. Only one is active at a time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, AsRefStr, Display, EnumIter, Deserialize,
)]
pub enum BufferRadius {
    #[strum(serialize = "0.5km")]
    #[serde(rename = "0.5km")]
    HalfKm,
    #[strum(serialize = "1km")]
    #[serde(rename = "1km")]
    OneKm,
    #[strum(serialize = "2km")]
    #[serde(rename = "2km")]
    TwoKm,
}

impl BufferRadius {
    pub fn km(&self) -> f64 {
        match self {
            BufferRadius::HalfKm => 0.5,
            BufferRadius::OneKm => 1.0,
            BufferRadius::TwoKm => 2.0,
        }
    }
}

/// Approximate the circle of `radius_km` around `center` on the sphere.
///
/// Vertices are placed clockwise from north by haversine destination, the ring is closed.
pub fn circle_polygon(center: geo::Point, radius_km: f64) -> geo::Polygon {
    let radius_m = radius_km * 1000.0;
    let mut ring: Vec<geo::Coord> = (0..BUFFER_STEPS)
        .map(|step| {
            let bearing = step as f64 * 360.0 / BUFFER_STEPS as f64;
            center.haversine_destination(bearing, radius_m).into()
        })
        .collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    geo::Polygon::new(geo::LineString::new(ring), vec![])
}

/// One buffer polygon per recorded click point, so zero or one.
pub fn generate_buffers(store: &FeatureStore, radius_km: f64) -> Vec<Feature> {
    let buffers: Vec<Feature> = store
        .click_point()
        .and_then(Feature::point)
        .into_iter()
        .map(|center| {
            Feature::new(
                geo::Geometry::Polygon(circle_polygon(center, radius_km)),
                FeatureMap::from([(RADIUS_KEY.to_string(), radius_km.to_string())]),
            )
        })
        .collect();
    if buffers.is_empty() {
        log::debug!("No click point placed, no buffer generated");
    } else {
        log::info!("Generated {} buffer(s) of {} km", buffers.len(), radius_km);
    }
    buffers
}
