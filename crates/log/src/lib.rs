mod setup;

use std::path::PathBuf;

use bevy::{app::PluginGroupBuilder, prelude::PluginGroup};

use crate::setup::LogPlugin;

/// Logs to stdout and to a new timestamped file in a log directory.
pub struct LogPluginGroup {
    directory: PathBuf,
}

impl LogPluginGroup {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl Default for LogPluginGroup {
    fn default() -> Self {
        Self::new("logs")
    }
}

impl PluginGroup for LogPluginGroup {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>().add(LogPlugin::new(self.directory))
    }
}
