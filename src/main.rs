extern crate log;
use clap::Parser;
use restaurant_map::config::{replay_events, Config, DatasetConfig};
use restaurant_map::dataset::download::fetch_dataset;
use restaurant_map::geofile::geojson::read_features_from_geojson;
use restaurant_map::map::events::{Dispatcher, MapEvent};
use restaurant_map::map::scene::SceneDisplay;
use restaurant_map::map::session::MapSession;
use std::path::{Path, PathBuf};

/// Replay a restaurant map session headlessly and write what the map shows as GeoJSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the input config file.
    #[arg(short, long)]
    config_filepath: PathBuf,
}

/// Fetch the dataset and turn the outcome into the event the map reacts to. A failed fetch is not
/// fatal, the session carries on with an empty store.
fn load_dataset(dataset: &DatasetConfig, data_dir: &Path) -> MapEvent {
    let result = match dataset {
        DatasetConfig::Url { url } => fetch_dataset(url, data_dir),
        DatasetConfig::Geofile { filepath } => read_features_from_geojson(filepath),
    };
    match result {
        Ok(features) => MapEvent::DatasetLoaded(features),
        Err(err) => MapEvent::DatasetFailed(format!("{:#}", err)),
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = Args::try_parse()?;
    let config = Config::load(&args.config_filepath)?;

    let dispatcher = Dispatcher::standard();
    let mut session = MapSession::new(config.diet_match);
    let mut display = SceneDisplay::new();

    dispatcher.dispatch(&mut session, &mut display, &MapEvent::Load)?;
    let dataset_event = load_dataset(&config.dataset, &config.data_dir);
    dispatcher.dispatch(&mut session, &mut display, &dataset_event)?;

    log::info!("Replaying {} events", config.events.len());
    let num_skipped = replay_events(&config.events, &dispatcher, &mut session, &mut display);
    if num_skipped > 0 {
        log::warn!("Skipped {} of {} events", num_skipped, config.events.len());
    }

    log::info!("Final filter: {}", session.predicate().to_expression());
    log::info!(
        "Showing {} of {} features",
        session.visible_features(&display)?.len(),
        session.store().len()
    );
    if let Some(popup) = session.popup() {
        log::info!("Popup open: {}", popup.content.to_html());
    }
    for filepath in display.write_layers_to_dir(&config.data_dir)? {
        log::info!("Wrote {:?}", filepath);
    }
    Ok(())
}

fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    env_logger::init();
    if let Err(e) = try_main() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1)
    }
}
