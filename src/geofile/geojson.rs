use std::{fs, path::Path};

use anyhow::{anyhow, Context};
use indicatif::ProgressBar;
use rayon::prelude::*;

use super::feature::Feature;

/// Parse GeoJSON text into features.
///
/// A FeatureCollection yields its features in order, a single Feature or bare Geometry yields
/// one feature. Features whose geometry cannot be represented are skipped with a warning, no
/// other validation of the properties takes place.
pub fn parse_features(contents: &str) -> anyhow::Result<Vec<Feature>> {
    let geojson: geojson::GeoJson = contents.parse().context("Parsing GeoJSON")?;
    let geojson_features = match geojson {
        geojson::GeoJson::FeatureCollection(collection) => collection.features,
        geojson::GeoJson::Feature(feature) => vec![feature],
        geojson::GeoJson::Geometry(geometry) => vec![geojson::Feature::from(geometry)],
    };
    let num_features = geojson_features.len();
    let features: Vec<Feature> = geojson_features
        .into_par_iter()
        .filter_map(|feature| match Feature::try_from(feature) {
            Ok(feature) => Some(feature),
            Err(err) => {
                log::debug!("Skipping feature: {}", err);
                None
            }
        })
        .collect();
    if features.len() != num_features {
        log::warn!(
            "Out of {} features read, only {} had usable geometries.",
            num_features,
            features.len()
        )
    }
    Ok(features)
}

pub fn read_features_from_geojson(filepath: &Path) -> anyhow::Result<Vec<Feature>> {
    if !filepath.exists() {
        return Err(anyhow!("GeoJSON file {:?} not found", filepath));
    }
    let contents = fs::read_to_string(filepath)
        .with_context(|| format!("Reading GeoJSON file {:?}", filepath))?;
    parse_features(&contents)
}

pub fn write_features_to_geojson(features: &[Feature], output_filepath: &Path) -> anyhow::Result<()> {
    log::info!(
        "Writing {} features to {:?}",
        features.len(),
        output_filepath
    );
    let bar = ProgressBar::new(features.len() as u64);
    let feature_collection: geojson::FeatureCollection = features
        .iter()
        .map(|feature| {
            bar.inc(1);
            geojson::Feature::from(feature)
        })
        .collect();
    bar.finish_and_clear();
    let geojson_contents = geojson::GeoJson::from(feature_collection);
    fs::write(output_filepath, geojson_contents.to_string())
        .with_context(|| format!("Writing GeoJSON to {:?}", output_filepath))
}
