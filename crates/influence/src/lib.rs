//! Influence maps: a coarse grid over the world where every cell holds the
//! signed sum of influence of nearby units of two opposing teams.

mod map;
mod plugin;
mod unit;

use bevy::{app::PluginGroupBuilder, prelude::PluginGroup};
pub use map::InfluenceMap;
use plugin::InfluencePlugin;
pub use plugin::{InfluenceArea, InfluenceSet, RebuildInfluenceMapEvent};
pub use unit::{InfluenceUnit, Team, MAX_STRENGTH};

pub struct InfluencePluginGroup;

impl PluginGroup for InfluencePluginGroup {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>().add(InfluencePlugin)
    }
}
