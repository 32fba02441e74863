use bevy::{app::PluginGroupBuilder, prelude::PluginGroup};
use schedule::GameSchedulesPlugin;

mod errors;
pub mod objects;
pub mod projection;
pub mod query;
pub mod schedule;

pub struct CorePluginGroup;

impl PluginGroup for CorePluginGroup {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>().add(GameSchedulesPlugin)
    }
}
