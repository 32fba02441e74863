//! This crate implements functionality around runtime configuration:
//!
//! * Asynchronous loading of the configuration from a YAML file at
//!   application startup.
//!
//! * Parsing, validation and configuration provisioning.

mod conf;
mod errors;
mod io;
mod persisted;
mod plugin;

use async_std::path::PathBuf;
use bevy::{app::PluginGroupBuilder, prelude::PluginGroup};
pub use conf::*;
pub use errors::ConfigLoadError;
pub use io::load_conf;
use plugin::ConfPlugin;

/// Loads the configuration and inserts it as [`Configuration`] resource
/// once ready. Default configuration is used if loading fails.
#[derive(Default)]
pub struct ConfigPluginGroup {
    path: Option<PathBuf>,
}

impl ConfigPluginGroup {
    /// Loads configuration from the given file instead of the default
    /// location inside user's configuration directory.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl PluginGroup for ConfigPluginGroup {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>().add(ConfPlugin::new(self.path))
    }
}
