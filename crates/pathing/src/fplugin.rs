use bevy::prelude::*;
use pf_conf::Configuration;
use pf_core::{query::HeightQuery, schedule::PreMovement};
use pf_graph::{DistanceMetric, WaypointGraph};

use crate::{finder::PathFinder, PathingSet};

/// This plugin keeps the [`PathFinder`] resource up to date with the
/// configuration.
pub(crate) struct FinderPlugin;

impl Plugin for FinderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            PreMovement,
            update_metric
                .in_set(PathingSet::UpdateFinder)
                .run_if(resource_exists::<PathFinder>())
                .run_if(resource_exists::<Configuration>()),
        );
    }
}

fn update_metric(conf: Res<Configuration>, mut finder: ResMut<PathFinder>) {
    let metric = conf.pathing().metric();
    if finder.metric() != metric {
        info!("Switching path finding metric to {:?}", metric);
        finder.set_metric(metric);
    }
}

/// Creates a new path finder. All graph nodes are placed on the ground
/// first.
pub fn create_finder<Q: HeightQuery>(
    mut graph: WaypointGraph,
    ground: &Q,
    metric: DistanceMetric,
) -> PathFinder {
    debug!("Placing {} waypoints on the ground", graph.len());
    graph.place_on_ground(ground);
    PathFinder::new(graph, metric)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use pf_core::{query::FlatGround, schedule::GameSchedulesPlugin};
    use pf_test_utils::line_graph;

    use super::*;
    use crate::PathingPluginGroup;

    #[test]
    fn test_create_finder() {
        let finder = create_finder(
            line_graph(3, 2.),
            &|x: f32, _z: f32| 0.5 * x,
            DistanceMetric::Euclidean,
        );
        let positions: Vec<Vec3> = finder
            .graph()
            .ids()
            .map(|id| finder.graph().position(id))
            .collect();
        assert_eq!(
            positions,
            vec![Vec3::ZERO, Vec3::new(2., 1., 0.), Vec3::new(4., 2., 0.)]
        );
    }

    #[test]
    fn test_update_metric() {
        let mut app = App::new();
        app.add_plugins((GameSchedulesPlugin, PathingPluginGroup))
            .insert_resource(create_finder(
                line_graph(3, 2.),
                &FlatGround::default(),
                DistanceMetric::Euclidean,
            ));
        app.update();
        assert_eq!(
            app.world.resource::<PathFinder>().metric(),
            DistanceMetric::Euclidean
        );

        app.insert_resource(Configuration::default());
        app.update();
        assert_eq!(
            app.world.resource::<PathFinder>().metric(),
            DistanceMetric::Manhattan
        );
    }
}
