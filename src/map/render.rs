use serde_json::json;

use crate::geofile::feature::Feature;

use super::{
    display::{LayerKind, LayerSpec, MapDisplay},
    popup::Popup,
    predicate::Predicate,
    store::FeatureStore,
    style,
};

pub const RESTAURANTS_SOURCE: &str = "restaurants";
pub const RESTAURANTS_LAYER: &str = "restaurants-layer";
pub const BUFFER_SOURCE: &str = "buffer";
pub const BUFFER_LAYER: &str = "buffer-layer";
pub const CLICK_POINT_SOURCE: &str = "click-point";
pub const CLICK_POINT_LAYER: &str = "click-point-layer";

/// Pushes session state to a display.
///
/// Until the map has loaded every call is a no-op, the session replays its state through
/// `install` once it has.
#[derive(Debug, Default)]
pub struct RenderSync {
    loaded: bool,
}

impl RenderSync {
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn install(
        &mut self,
        display: &mut dyn MapDisplay,
        store: &FeatureStore,
        predicate: &Predicate,
        legend_visible: bool,
    ) -> anyhow::Result<()> {
        if self.loaded {
            log::warn!("Map layers already installed");
            return Ok(());
        }
        display.add_source(RESTAURANTS_SOURCE, store.features().to_vec())?;
        display.add_layer(LayerSpec {
            id: RESTAURANTS_LAYER.to_string(),
            source: RESTAURANTS_SOURCE.to_string(),
            kind: LayerKind::Circle,
            paint: json!({
                "circle-color": style::color_expression(),
                "circle-radius": style::CIRCLE_RADIUS,
            }),
        })?;
        self.loaded = true;
        self.apply_predicate(display, predicate)?;
        self.set_legend_visible(display, legend_visible)?;
        if let Some(click_point) = store.click_point() {
            self.show_click_point(display, click_point)?;
        }
        Ok(())
    }

    /// Remove everything `install` and later calls added.
    pub fn uninstall(&mut self, display: &mut dyn MapDisplay) -> anyhow::Result<()> {
        if !self.loaded {
            return Ok(());
        }
        self.hide_popup(display)?;
        self.clear_buffers(display)?;
        for (layer, source) in [
            (CLICK_POINT_LAYER, CLICK_POINT_SOURCE),
            (RESTAURANTS_LAYER, RESTAURANTS_SOURCE),
        ] {
            remove_layer_and_source(display, layer, source)?;
        }
        self.loaded = false;
        Ok(())
    }

    pub fn apply_predicate(
        &self,
        display: &mut dyn MapDisplay,
        predicate: &Predicate,
    ) -> anyhow::Result<()> {
        if !self.loaded {
            return Ok(());
        }
        log::debug!("Applying filter {}", predicate.to_expression());
        display.set_filter(RESTAURANTS_LAYER, Some(predicate))
    }

    pub fn sync_data(&self, display: &mut dyn MapDisplay, store: &FeatureStore) -> anyhow::Result<()> {
        if !self.loaded {
            return Ok(());
        }
        display.set_data(RESTAURANTS_SOURCE, store.features().to_vec())
    }

    pub fn show_click_point(
        &self,
        display: &mut dyn MapDisplay,
        click_point: &Feature,
    ) -> anyhow::Result<()> {
        if !self.loaded || display.has_source(CLICK_POINT_SOURCE) {
            return Ok(());
        }
        display.add_source(CLICK_POINT_SOURCE, vec![click_point.clone()])?;
        display.add_layer(LayerSpec {
            id: CLICK_POINT_LAYER.to_string(),
            source: CLICK_POINT_SOURCE.to_string(),
            kind: LayerKind::Circle,
            paint: json!({
                "circle-color": style::CLICK_POINT_COLOR,
                "circle-radius": style::CIRCLE_RADIUS,
            }),
        })
    }

    /// Replace whatever buffer layer is shown with one drawing `buffers`.
    pub fn show_buffers(
        &self,
        display: &mut dyn MapDisplay,
        buffers: Vec<Feature>,
    ) -> anyhow::Result<()> {
        if !self.loaded {
            return Ok(());
        }
        self.clear_buffers(display)?;
        display.add_source(BUFFER_SOURCE, buffers)?;
        display.add_layer(LayerSpec {
            id: BUFFER_LAYER.to_string(),
            source: BUFFER_SOURCE.to_string(),
            kind: LayerKind::Fill,
            paint: json!({
                "fill-color": style::BUFFER_COLOR,
                "fill-opacity": style::BUFFER_OPACITY,
            }),
        })
    }

    pub fn clear_buffers(&self, display: &mut dyn MapDisplay) -> anyhow::Result<()> {
        remove_layer_and_source(display, BUFFER_LAYER, BUFFER_SOURCE)
    }

    pub fn set_legend_visible(
        &self,
        display: &mut dyn MapDisplay,
        visible: bool,
    ) -> anyhow::Result<()> {
        if !self.loaded {
            return Ok(());
        }
        display.set_legend_visible(visible)
    }

    pub fn show_popup(&self, display: &mut dyn MapDisplay, popup: &Popup) -> anyhow::Result<()> {
        if !self.loaded {
            return Ok(());
        }
        display.show_popup(popup)
    }

    pub fn hide_popup(&self, display: &mut dyn MapDisplay) -> anyhow::Result<()> {
        if !self.loaded {
            return Ok(());
        }
        display.hide_popup()
    }
}

fn remove_layer_and_source(
    display: &mut dyn MapDisplay,
    layer: &str,
    source: &str,
) -> anyhow::Result<()> {
    if display.has_layer(layer) {
        display.remove_layer(layer)?;
    }
    if display.has_source(source) {
        display.remove_source(source)?;
    }
    Ok(())
}
