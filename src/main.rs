mod data;
mod errors;
mod etl;
mod join;
mod resolve;

use std::env;
use std::fs::{create_dir_all, File};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use log::{error, info};
use serde::Deserialize;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use crate::data::osm::OsmId;
use crate::errors::Result;
use crate::etl::boundary_rings::BoundaryRingsEtl;
use crate::etl::Etl;
use crate::resolve::overpass::{ElementCache, OverpassClient, OverpassSource, DEFAULT_OVERPASS_URL};

const DEFAULT_CONFIG_PATH: &str = "config/boundaries.json";

#[derive(Deserialize, Debug)]
pub struct UserConfig {
    pub cache_dir: String,
    pub output_dir: String,
    pub relation_ids: Vec<OsmId>,
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Recompute rings even when an output file already exists.
    #[serde(default)]
    pub refresh_outputs: bool,
}

fn default_overpass_url() -> String {
    DEFAULT_OVERPASS_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    180
}

fn load_user_config(path: &str) -> Result<UserConfig> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}

fn create_output_dir(config: &UserConfig) -> Result<PathBuf> {
    let output_dir = PathBuf::from(&config.output_dir);
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}

fn setup_logging() {
    Builder::with_level("info")
        .with_target_writer("*", new_writer(io::stderr()))
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let user_config = load_user_config(&config_path)?;
    let output_dir = create_output_dir(&user_config)?;

    let client = OverpassClient::new(
        &user_config.overpass_url,
        Duration::from_secs(user_config.timeout_secs),
    )?;
    let mut source = OverpassSource::new(ElementCache::new(&user_config.cache_dir, client)?);

    let mut failed = 0;
    for &relation_id in tqdm::tqdm(user_config.relation_ids.iter()) {
        let mut etl = BoundaryRingsEtl::new(relation_id, &mut source);
        if user_config.refresh_outputs {
            etl.clean(&output_dir)?;
        }
        if let Err(err) = etl.process(&output_dir) {
            error!(relation_id = relation_id, err = err.to_string().as_str(); "Could not build boundary rings");
            failed += 1;
        }
    }

    info!(relations = user_config.relation_ids.len(), failed = failed; "Finished");
    if failed > 0 {
        return Err(format!("{} of {} relations failed", failed, user_config.relation_ids.len()).into());
    }
    Ok(())
}
