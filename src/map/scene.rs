use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context};
use rayon::prelude::*;

use crate::geofile::{feature::Feature, geojson::write_features_to_geojson};

use super::{
    display::{LayerSpec, MapDisplay},
    popup::Popup,
    predicate::Predicate,
};

#[derive(Debug)]
pub struct SceneLayer {
    pub spec: LayerSpec,
    pub filter: Option<Predicate>,
}

/// In-memory display keeping the sources and ordered layers the session has set up.
#[derive(Debug)]
pub struct SceneDisplay {
    sources: HashMap<String, Vec<Feature>>,
    layers: Vec<SceneLayer>,
    popup: Option<Popup>,
    legend_visible: bool,
}

impl Default for SceneDisplay {
    fn default() -> Self {
        Self {
            sources: HashMap::new(),
            layers: Vec::new(),
            popup: None,
            legend_visible: true,
        }
    }
}

impl SceneDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layers(&self) -> &[SceneLayer] {
        &self.layers
    }

    pub fn layer(&self, id: &str) -> Option<&SceneLayer> {
        self.layers.iter().find(|layer| layer.spec.id == id)
    }

    pub fn source(&self, id: &str) -> Option<&[Feature]> {
        self.sources.get(id).map(Vec::as_slice)
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn legend_visible(&self) -> bool {
        self.legend_visible
    }

    /// Features of the layer's source passing the layer filter, in source order.
    pub fn rendered_features(&self, layer_id: &str) -> anyhow::Result<Vec<&Feature>> {
        let layer = self
            .layer(layer_id)
            .ok_or_else(|| anyhow!("Layer {} does not exist", layer_id))?;
        let features = self
            .sources
            .get(&layer.spec.source)
            .ok_or_else(|| anyhow!("Source {} does not exist", layer.spec.source))?;
        Ok(match &layer.filter {
            Some(filter) => features
                .par_iter()
                .filter(|feature| filter.evaluate(feature))
                .collect(),
            None => features.iter().collect(),
        })
    }

    /// Write each layer's rendered features to `<layer id>.geojson` in `output_dir`.
    pub fn write_layers_to_dir(&self, output_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        fs::create_dir_all(output_dir)
            .with_context(|| format!("Creating output directory {:?}", output_dir))?;
        let mut filepaths = Vec::new();
        for layer in &self.layers {
            let features: Vec<Feature> = self
                .rendered_features(&layer.spec.id)?
                .into_iter()
                .cloned()
                .collect();
            let filepath = output_dir.join(format!("{}.geojson", layer.spec.id));
            write_features_to_geojson(&features, &filepath)?;
            filepaths.push(filepath);
        }
        Ok(filepaths)
    }

    fn layer_mut(&mut self, id: &str) -> anyhow::Result<&mut SceneLayer> {
        self.layers
            .iter_mut()
            .find(|layer| layer.spec.id == id)
            .ok_or_else(|| anyhow!("Layer {} does not exist", id))
    }
}

impl MapDisplay for SceneDisplay {
    fn add_source(&mut self, id: &str, features: Vec<Feature>) -> anyhow::Result<()> {
        if self.sources.contains_key(id) {
            return Err(anyhow!("Source {} already exists", id));
        }
        log::trace!("Adding source {} with {} features", id, features.len());
        self.sources.insert(id.to_string(), features);
        Ok(())
    }

    fn set_data(&mut self, id: &str, features: Vec<Feature>) -> anyhow::Result<()> {
        let source = self
            .sources
            .get_mut(id)
            .ok_or_else(|| anyhow!("Source {} does not exist", id))?;
        *source = features;
        Ok(())
    }

    fn add_layer(&mut self, layer: LayerSpec) -> anyhow::Result<()> {
        if self.has_layer(&layer.id) {
            return Err(anyhow!("Layer {} already exists", layer.id));
        }
        if !self.has_source(&layer.source) {
            return Err(anyhow!(
                "Layer {} refers to missing source {}",
                layer.id,
                layer.source
            ));
        }
        self.layers.push(SceneLayer {
            spec: layer,
            filter: None,
        });
        Ok(())
    }

    fn set_filter(&mut self, layer_id: &str, filter: Option<&Predicate>) -> anyhow::Result<()> {
        self.layer_mut(layer_id)?.filter = filter.cloned();
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> anyhow::Result<()> {
        let num_layers = self.layers.len();
        self.layers.retain(|layer| layer.spec.id != id);
        if self.layers.len() == num_layers {
            return Err(anyhow!("Layer {} does not exist", id));
        }
        Ok(())
    }

    fn remove_source(&mut self, id: &str) -> anyhow::Result<()> {
        if let Some(layer) = self.layers.iter().find(|layer| layer.spec.source == id) {
            return Err(anyhow!(
                "Source {} is still used by layer {}",
                id,
                layer.spec.id
            ));
        }
        self.sources
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| anyhow!("Source {} does not exist", id))
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layer(id).is_some()
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn show_popup(&mut self, popup: &Popup) -> anyhow::Result<()> {
        self.popup = Some(popup.clone());
        Ok(())
    }

    fn hide_popup(&mut self) -> anyhow::Result<()> {
        self.popup = None;
        Ok(())
    }

    fn set_legend_visible(&mut self, visible: bool) -> anyhow::Result<()> {
        self.legend_visible = visible;
        Ok(())
    }
}
