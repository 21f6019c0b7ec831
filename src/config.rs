use std::{fs::read_to_string, path::Path, path::PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

use crate::{
    dataset::download::DEFAULT_DATASET_URL,
    map::{
        buffer::BufferRadius,
        display::MapDisplay,
        events::{ControlId, ControlValue, Dispatcher, MapEvent},
        filter::DietMatch,
        render::RESTAURANTS_LAYER,
        session::MapSession,
    },
};

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub enum DatasetConfig {
    Url { url: String },
    Geofile { filepath: PathBuf },
}

impl Default for DatasetConfig {
    fn default() -> Self {
        DatasetConfig::Url {
            url: DEFAULT_DATASET_URL.to_string(),
        }
    }
}

/// A user interaction replayed against the session.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub enum ScriptedEvent {
    SelectDiet { value: String },
    SelectCuisine { value: String },
    Legend { visible: bool },
    Click { lon: f64, lat: f64 },
    Radius { radius: BufferRadius, checked: bool },
    /// Hover the restaurant at this index of the loaded dataset.
    Hover { feature_index: usize },
    Leave,
}

impl ScriptedEvent {
    /// Translate into the map event the SDK would emit, `None` when it would emit nothing.
    ///
    /// Hovering only reaches restaurants the map currently draws, a restaurant hidden by the
    /// filter (or the click point, which has no cuisine) cannot be hovered.
    pub fn to_map_event(&self, session: &MapSession) -> anyhow::Result<Option<MapEvent>> {
        let control = |control, value| MapEvent::ControlChange { control, value };
        Ok(Some(match self {
            ScriptedEvent::SelectDiet { value } => control(
                ControlId::DietSubmit,
                ControlValue::Selection(value.clone()),
            ),
            ScriptedEvent::SelectCuisine { value } => control(
                ControlId::CuisineSubmit,
                ControlValue::Selection(value.clone()),
            ),
            ScriptedEvent::Legend { visible } => {
                control(ControlId::Legend, ControlValue::Checked(*visible))
            }
            ScriptedEvent::Click { lon, lat } => MapEvent::Click {
                lon: *lon,
                lat: *lat,
            },
            ScriptedEvent::Radius { radius, checked } => {
                control(ControlId::Radius(*radius), ControlValue::Checked(*checked))
            }
            ScriptedEvent::Hover { feature_index } => {
                let store = session.store();
                let feature = store.features().get(*feature_index).ok_or_else(|| {
                    anyhow!(
                        "Cannot hover feature {}, only {} loaded",
                        feature_index,
                        store.len()
                    )
                })?;
                let coordinates = feature
                    .point()
                    .ok_or_else(|| anyhow!("Feature {} is not a point", feature_index))?;
                if !session.is_map_loaded() || !session.predicate().evaluate(feature) {
                    log::debug!("Feature {} is not drawn, nothing to hover", feature_index);
                    return Ok(None);
                }
                MapEvent::MouseEnter {
                    layer: RESTAURANTS_LAYER.to_string(),
                    coordinates,
                    properties: feature.attributes.clone().unwrap_or_default(),
                }
            }
            ScriptedEvent::Leave => MapEvent::MouseLeave {
                layer: RESTAURANTS_LAYER.to_string(),
            },
        }))
    }
}

/// Dispatch scripted events in order. An event that is rejected is logged and skipped, the
/// session carries on with the rest. Returns the number of skipped events.
pub fn replay_events(
    events: &[ScriptedEvent],
    dispatcher: &Dispatcher,
    session: &mut MapSession,
    display: &mut dyn MapDisplay,
) -> usize {
    let mut num_skipped = 0;
    for scripted_event in events {
        log::debug!("Dispatching {:?}", scripted_event);
        let result = scripted_event
            .to_map_event(session)
            .and_then(|event| match event {
                Some(event) => dispatcher.dispatch(session, display, &event),
                None => Ok(()),
            });
        if let Err(err) = result {
            log::warn!("Skipping event {:?}: {:#}", scripted_event, err);
            num_skipped += 1;
        }
    }
    num_skipped
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default)]
    pub dataset: DatasetConfig,
    pub data_dir: PathBuf,
    #[serde(default)]
    pub diet_match: DietMatch,
    #[serde(default)]
    pub events: Vec<ScriptedEvent>,
}

impl Config {
    pub fn load(filepath: &Path) -> anyhow::Result<Self> {
        if !filepath.exists() {
            return Err(anyhow!("Config file {:?} not found", filepath));
        }
        let config_contents = read_to_string(filepath)?;
        serde_yaml::from_str(&config_contents)
            .with_context(|| format!("Parsing config file {:?}", filepath))
    }
}
