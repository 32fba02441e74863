use async_std::{fs, path::Path};
use bevy::prelude::{debug, info};

use crate::{conf, errors::ConfigLoadError, persisted};

/// Loads, parses and validates configuration. Defaults are used if the file
/// does not exist.
pub async fn load_conf(path: &Path) -> Result<conf::Configuration, ConfigLoadError> {
    match load_conf_text(path).await? {
        Some(text) => parse_conf(text.as_str()),
        None => Ok(conf::Configuration::default()),
    }
}

pub(crate) fn parse_conf(text: &str) -> Result<conf::Configuration, ConfigLoadError> {
    let persistent: persisted::Configuration = serde_yaml::from_str(text)?;
    let configuration = conf::Configuration::try_from(persistent)?;
    debug!("Loaded configuration: {:?}", configuration);
    Ok(configuration)
}

/// Loads configuration file to a string. Returns Ok(None) if the configuration
/// file does not exist.
async fn load_conf_text(path: &Path) -> Result<Option<String>, ConfigLoadError> {
    if path.is_file().await {
        info!("Loading configuration from {}", path.to_string_lossy());
        fs::read_to_string(path)
            .await
            .map(Some)
            .map_err(|source| ConfigLoadError::Io {
                path: path.to_string_lossy().into_owned(),
                source,
            })
    } else {
        info!(
            "Configuration does not exist or is not a file, using defaults: {}",
            path.to_string_lossy()
        );
        Ok(None)
    }
}
