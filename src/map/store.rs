use anyhow::anyhow;

use crate::geofile::feature::{Feature, FeatureMap};

/// In-memory collection of the features on the map: the fetched dataset plus at most one
/// user-placed click point.
#[derive(Debug, Default)]
pub struct FeatureStore {
    features: Vec<Feature>,
    loaded: bool,
    click_point_idx: Option<usize>,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the store with the fetched dataset. Only the first load takes effect, the return
    /// value tells whether this one did.
    pub fn load(&mut self, features: Vec<Feature>) -> bool {
        if self.loaded {
            log::warn!(
                "Dataset already loaded, ignoring a second load of {} features",
                features.len()
            );
            return false;
        }
        log::info!("Loaded {} features", features.len());
        // A click point may already exist if the dataset arrived late, keep it last.
        let click_point = self.click_point_idx.map(|idx| self.features.remove(idx));
        self.features = features;
        if let Some(click_point) = click_point {
            self.click_point_idx = Some(self.features.len());
            self.features.push(click_point);
        }
        self.loaded = true;
        true
    }

    /// Append the click point unless one was already placed this session.
    pub fn add_click_point(&mut self, lon: f64, lat: f64) -> anyhow::Result<bool> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(anyhow!("Click point ({}, {}) is not finite", lon, lat));
        }
        if self.has_click_point() {
            log::debug!("Click point already placed, ignoring click at ({lon}, {lat})");
            return Ok(false);
        }
        self.click_point_idx = Some(self.features.len());
        self.features.push(Feature::new(
            geo::Geometry::Point(geo::Point::new(lon, lat)),
            FeatureMap::new(),
        ));
        Ok(true)
    }

    pub fn has_click_point(&self) -> bool {
        self.click_point_idx.is_some()
    }

    pub fn click_point(&self) -> Option<&Feature> {
        self.click_point_idx.and_then(|idx| self.features.get(idx))
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
