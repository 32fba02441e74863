#![allow(rustdoc::private_intra_doc_links)]
//! This library implements shortest path search over a waypoint graph and a
//! Bevy plugin which resolves destination requests of agents and flocks to
//! routes and advances agents along them.

mod finder;
mod follower;
mod fplugin;
mod path;
mod pplugin;
mod search;

use bevy::{app::PluginGroupBuilder, prelude::PluginGroup};
pub use finder::{PathFinder, Plan};
pub use follower::{FollowOutcome, PathFollower};
pub use fplugin::create_finder;
use fplugin::FinderPlugin;
pub use path::Route;
use pplugin::PathingPlugin;
pub use pplugin::{
    DestinationReachedEvent, PathNotFoundEvent, PathingSet, SetDestinationEvent,
    SetFlockDestinationEvent,
};
pub use search::{find_path, PathError};

pub struct PathingPluginGroup;

impl PluginGroup for PathingPluginGroup {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>()
            .add(FinderPlugin)
            .add(PathingPlugin)
    }
}
