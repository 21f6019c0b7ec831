use anyhow::{anyhow, Context};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::geofile::{feature::Feature, geojson::read_features_from_geojson};

/// Restaurants of Toronto, the dataset the map was built around.
pub const DEFAULT_DATASET_URL: &str =
    "https://raw.githubusercontent.com/uoft-flyfreejay/ggr472-final-project/main/data/tor_restaurants.geojson";

/// Derive the local cache filename from the last path segment of the dataset URL.
pub fn get_filename_for_url(url: &str) -> anyhow::Result<String> {
    let without_query = url.split(['?', '#']).next().unwrap_or(url);
    let filename = without_query
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty() && !segment.contains(':'))
        .ok_or_else(|| anyhow!("Could not derive a filename from URL {}", url))?;
    if filename.ends_with(".geojson") || filename.ends_with(".json") {
        Ok(filename.to_string())
    } else {
        Ok(format!("{filename}.geojson"))
    }
}

pub fn download_dataset(url: &str) -> anyhow::Result<String> {
    let client = reqwest::blocking::Client::builder()
        .user_agent("restaurant-map")
        .build()?;
    let response = client.get(url).send()?.error_for_status()?;
    response.text().or(Err(anyhow!("No response text")))
}

pub fn sync_dataset_to_file(url: &str, output_dir: &Path) -> anyhow::Result<PathBuf> {
    let filename = get_filename_for_url(url)?;
    let output_filepath = output_dir.join(filename);
    if output_filepath.exists() {
        log::info!(
            "Local file exists for dataset: {:?}",
            output_filepath.canonicalize()
        );
        return Ok(output_filepath);
    }

    log::info!("Downloading dataset from {}", url);
    let dataset = download_dataset(url)?;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Creating data directory {:?}", output_dir))?;
    fs::write(&output_filepath, dataset).or(Err(anyhow!("Could not write dataset to file")))?;
    Ok(output_filepath)
}

/// Fetch the dataset once, going through the local cache in `data_dir`.
pub fn fetch_dataset(url: &str, data_dir: &Path) -> anyhow::Result<Vec<Feature>> {
    let filepath = sync_dataset_to_file(url, data_dir)?;
    read_features_from_geojson(&filepath)
}
