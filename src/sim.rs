//! The simulated scenario: a flock crossing a waypoint grid dotted with
//! obstacles.

use ahash::AHashSet;
use bevy::{app::AppExit, prelude::*};
use pf_core::{
    log_full_error,
    objects::{FlockId, FlockMember},
    query::{FlatGround, GroundHeight},
    schedule::PostMovement,
};
use pf_graph::{DistanceMetric, WaypointGraph};
use pf_influence::{
    InfluenceArea, InfluenceMap, InfluenceSet, InfluenceUnit, RebuildInfluenceMapEvent, Team,
};
use pf_movement::{AgentBundle, Flocks, ObstacleCollider};
use pf_pathing::{
    create_finder, DestinationReachedEvent, PathNotFoundEvent, SetFlockDestinationEvent,
};

/// Distance between neighbouring waypoints in meters.
const SPACING: f32 = 8.;
/// Distance between neighbouring agents at the start.
const AGENT_SPACING: f32 = 2.;
const FLOCK: FlockId = FlockId::new(1);
/// Progress is logged every this many ticks.
const REPORT_INTERVAL: u32 = 60;

pub(crate) struct SimulationPlugin {
    scenario: Scenario,
}

impl SimulationPlugin {
    pub(crate) fn new(scenario: Scenario) -> Self {
        Self { scenario }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.scenario)
            .init_resource::<Progress>()
            .add_systems(Startup, setup)
            .add_systems(
                PostMovement,
                (
                    track.in_set(SimulationSet::Track),
                    report
                        .in_set(SimulationSet::Report)
                        .after(SimulationSet::Track)
                        .before(InfluenceSet::Rebuild),
                    log_influence.run_if(resource_exists_and_changed::<InfluenceMap>()),
                    finish.after(SimulationSet::Report),
                ),
            );
    }
}

#[derive(Copy, Clone, Hash, Debug, PartialEq, Eq, SystemSet)]
enum SimulationSet {
    Track,
    Report,
}

#[derive(Resource, Clone, Copy, Debug)]
pub(crate) struct Scenario {
    agents: u32,
    grid: u32,
    ticks: u32,
}

impl Scenario {
    /// # Arguments
    ///
    /// * `agents` - number of flock members.
    ///
    /// * `grid` - number of waypoints along each side of the grid.
    ///
    /// * `ticks` - the simulation stops after this many ticks.
    pub(crate) fn new(agents: u32, grid: u32, ticks: u32) -> Self {
        Self {
            agents,
            grid,
            ticks,
        }
    }

    /// Length of a grid side in meters.
    fn extent(&self) -> f32 {
        (self.grid.max(1) - 1) as f32 * SPACING
    }
}

#[derive(Resource, Default)]
struct Progress {
    tick: u32,
    arrived: AHashSet<Entity>,
}

fn setup(
    mut commands: Commands,
    scenario: Res<Scenario>,
    mut destinations: EventWriter<SetFlockDestinationEvent>,
) {
    let ground = FlatGround::default();
    let side = scenario.grid as usize;
    match WaypointGraph::grid(side, side, SPACING) {
        Ok(graph) => {
            commands.insert_resource(create_finder(graph, &ground, DistanceMetric::default()))
        }
        Err(err) => {
            log_full_error!(err);
            return;
        }
    }
    commands.insert_resource(GroundHeight::new(ground));

    let extent = scenario.extent();
    let margin = 0.5 * SPACING;
    commands.insert_resource(InfluenceArea::new(
        Vec2::splat(-margin),
        Vec2::splat(extent + margin),
    ));

    let columns = (scenario.agents as f32).sqrt().ceil() as u32;
    for i in 0..scenario.agents {
        let position = Vec3::new(
            (i % columns) as f32 * AGENT_SPACING,
            0.,
            (i / columns) as f32 * AGENT_SPACING,
        );
        commands.spawn((
            AgentBundle::new(position),
            FlockMember::new(FLOCK),
            InfluenceUnit::new(2, Team::Green),
        ));
    }

    // Red outposts in the middle of some grid cells.
    let mut outposts = 0;
    for row in 1..scenario.grid.saturating_sub(2) {
        for column in 1..scenario.grid.saturating_sub(2) {
            if (row + column) % 3 != 0 {
                continue;
            }
            let center = Vec3::new(column as f32 + 0.5, 0., row as f32 + 0.5) * SPACING;
            commands.spawn((
                Transform::from_translation(center),
                ObstacleCollider::ball(0.2 * SPACING),
                InfluenceUnit::new(3, Team::Red),
            ));
            outposts += 1;
        }
    }

    let destination = Vec3::new(extent, 0., extent);
    info!(
        "Spawned {} agents and {} outposts, sending {} to {:?}",
        scenario.agents, outposts, FLOCK, destination
    );
    destinations.send(SetFlockDestinationEvent::new(FLOCK, destination));
}

fn track(
    mut progress: ResMut<Progress>,
    mut reached: EventReader<DestinationReachedEvent>,
    mut not_found: EventReader<PathNotFoundEvent>,
) {
    progress.tick += 1;

    for event in reached.iter() {
        if progress.arrived.insert(event.entity()) {
            debug!("{:?} arrived at tick {}", event.entity(), progress.tick);
        }
    }
    for event in not_found.iter() {
        warn!("{:?} has no route: {}", event.entity(), event.error());
    }
}

fn report(
    progress: Res<Progress>,
    scenario: Res<Scenario>,
    flocks: Res<Flocks>,
    mut rebuild: EventWriter<RebuildInfluenceMapEvent>,
) {
    if progress.tick % REPORT_INTERVAL != 0 {
        return;
    }

    if let Some(flock) = flocks.get(FLOCK) {
        info!(
            "Tick {}: {} centroid {:?}, {}/{} agents arrived",
            progress.tick,
            FLOCK,
            flock.aggregates().centroid(),
            progress.arrived.len(),
            scenario.agents
        );
    }
    rebuild.send_default();
}

fn log_influence(map: Res<InfluenceMap>) {
    let control = map.control();
    info!(
        "Influence map: {} cells green, {} cells red",
        control[Team::Green],
        control[Team::Red]
    );
}

fn finish(progress: Res<Progress>, scenario: Res<Scenario>, mut exit: EventWriter<AppExit>) {
    let all_arrived = progress.arrived.len() >= scenario.agents as usize;
    if all_arrived || progress.tick >= scenario.ticks {
        info!(
            "Simulation finished after {} ticks, {}/{} agents arrived",
            progress.tick,
            progress.arrived.len(),
            scenario.agents
        );
        exit.send(AppExit);
    }
}
