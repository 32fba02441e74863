use bevy::{math::Rect, prelude::*};
use pf_conf::Configuration;
use pf_core::schedule::PostMovement;

use crate::{map::InfluenceMap, unit::InfluenceUnit};

pub(crate) struct InfluencePlugin;

impl Plugin for InfluencePlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<RebuildInfluenceMapEvent>().add_systems(
            PostMovement,
            rebuild
                .in_set(InfluenceSet::Rebuild)
                .run_if(on_event::<RebuildInfluenceMapEvent>())
                .run_if(resource_exists::<InfluenceArea>())
                .run_if(resource_exists::<Configuration>()),
        );
    }
}

#[derive(Copy, Clone, Hash, Debug, PartialEq, Eq, SystemSet)]
pub enum InfluenceSet {
    Rebuild,
}

/// Send this event to rebuild the [`InfluenceMap`] resource from all
/// entities with an [`InfluenceUnit`]. Multiple events sent during a single
/// tick result in a single rebuild.
#[derive(Event, Default)]
pub struct RebuildInfluenceMapEvent;

/// Ground plane rectangle covered by the influence map. No map is built
/// unless this resource exists.
#[derive(Resource, Clone, Copy, Debug)]
pub struct InfluenceArea(Rect);

impl InfluenceArea {
    /// # Arguments
    ///
    /// * `min` - minimum X and Z world coordinates of the area.
    ///
    /// * `max` - maximum X and Z world coordinates of the area.
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self(Rect::from_corners(min, max))
    }

    pub fn rect(&self) -> Rect {
        self.0
    }
}

fn rebuild(
    mut commands: Commands,
    mut events: EventReader<RebuildInfluenceMapEvent>,
    conf: Res<Configuration>,
    area: Res<InfluenceArea>,
    units: Query<(&Transform, &InfluenceUnit)>,
) {
    events.clear();

    let map = InfluenceMap::build(
        area.rect(),
        conf.influence().columns(),
        conf.influence().rows(),
        units
            .iter()
            .map(|(transform, &unit)| (transform.translation, unit)),
    );
    debug!(
        "Influence map rebuilt from {} units: {:?}",
        units.iter().count(),
        map.control()
    );
    commands.insert_resource(map);
}
