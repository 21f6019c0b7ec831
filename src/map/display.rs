use crate::geofile::feature::Feature;

use super::{popup::Popup, predicate::Predicate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Circle,
    Fill,
}

/// Description of a display layer drawing the features of one source.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    pub id: String,
    pub source: String,
    pub kind: LayerKind,
    /// Paint properties as Mapbox style JSON.
    pub paint: serde_json::Value,
}

/// Display-update primitives of the mapping SDK the session drives.
///
/// Ids follow SDK semantics: adding an id twice, or touching an id that does not exist, is an
/// error. A source can only be removed once no layer draws it.
pub trait MapDisplay {
    fn add_source(&mut self, id: &str, features: Vec<Feature>) -> anyhow::Result<()>;
    fn set_data(&mut self, id: &str, features: Vec<Feature>) -> anyhow::Result<()>;
    fn add_layer(&mut self, layer: LayerSpec) -> anyhow::Result<()>;
    /// Restrict a layer to features passing `filter`, `None` shows every feature.
    fn set_filter(&mut self, layer_id: &str, filter: Option<&Predicate>) -> anyhow::Result<()>;
    fn remove_layer(&mut self, id: &str) -> anyhow::Result<()>;
    fn remove_source(&mut self, id: &str) -> anyhow::Result<()>;
    fn has_layer(&self, id: &str) -> bool;
    fn has_source(&self, id: &str) -> bool;
    /// Open the popup, or move it if one is already open.
    fn show_popup(&mut self, popup: &Popup) -> anyhow::Result<()>;
    fn hide_popup(&mut self) -> anyhow::Result<()>;
    fn set_legend_visible(&mut self, visible: bool) -> anyhow::Result<()>;
}
