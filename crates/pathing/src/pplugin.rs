use ahash::AHashMap;
use bevy::prelude::*;
use pf_conf::Configuration;
use pf_core::{
    objects::{FlockId, FlockMember},
    schedule::PreMovement,
};

use crate::{
    finder::PathFinder,
    follower::{FollowOutcome, PathFollower},
    search::PathError,
};

/// This plugin handles destination requests and advances agents along their
/// routes.
pub(crate) struct PathingPlugin;

impl Plugin for PathingPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<SetDestinationEvent>()
            .add_event::<SetFlockDestinationEvent>()
            .add_event::<PathNotFoundEvent>()
            .add_event::<DestinationReachedEvent>()
            .add_systems(
                PreMovement,
                (
                    update_requested_paths
                        .in_set(PathingSet::Requests)
                        .after(PathingSet::UpdateFinder),
                    update_requested_flock_paths
                        .in_set(PathingSet::Requests)
                        .after(update_requested_paths),
                )
                    .run_if(resource_exists::<PathFinder>()),
            )
            .add_systems(
                PreMovement,
                (
                    follow_paths
                        .in_set(PathingSet::Follow)
                        .after(PathingSet::Requests),
                    settle
                        .in_set(PathingSet::Settle)
                        .after(PathingSet::Follow),
                )
                    .run_if(resource_exists::<Configuration>()),
            );
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, SystemSet)]
pub enum PathingSet {
    /// Path finder is updated to the current configuration.
    UpdateFinder,
    /// Destination requests are processed, routes are searched.
    Requests,
    /// Agents advance along their routes.
    Follow,
    /// Agents at their final destination stop pathing.
    Settle,
}

/// Send this event to move an agent to a point. The agent's route is
/// searched immediately.
#[derive(Event)]
pub struct SetDestinationEvent {
    entity: Entity,
    point: Vec3,
}

impl SetDestinationEvent {
    /// # Arguments
    ///
    /// * `entity` - agent entity with a [`PathFollower`] component.
    ///
    /// * `point` - final destination. It does not need to lie on the
    ///   waypoint graph.
    pub fn new(entity: Entity, point: Vec3) -> Self {
        Self { entity, point }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn point(&self) -> Vec3 {
        self.point
    }
}

/// Send this event to move all members of a flock to a point.
///
/// Only a single route is searched per request: from the position of the
/// flock leader (the flock member with the lowest entity index). All members
/// follow the same route.
#[derive(Event)]
pub struct SetFlockDestinationEvent {
    flock: FlockId,
    point: Vec3,
}

impl SetFlockDestinationEvent {
    pub fn new(flock: FlockId, point: Vec3) -> Self {
        Self { flock, point }
    }

    pub fn flock(&self) -> FlockId {
        self.flock
    }

    pub fn point(&self) -> Vec3 {
        self.point
    }
}

/// This event is sent when a route requested for an agent could not be found.
/// The agent stops in such a case.
#[derive(Event)]
pub struct PathNotFoundEvent {
    entity: Entity,
    error: PathError,
}

impl PathNotFoundEvent {
    fn new(entity: Entity, error: PathError) -> Self {
        Self { entity, error }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn error(&self) -> &PathError {
        &self.error
    }
}

/// This event is sent when an agent reaches its final destination.
#[derive(Event)]
pub struct DestinationReachedEvent {
    entity: Entity,
    point: Vec3,
}

impl DestinationReachedEvent {
    fn new(entity: Entity, point: Vec3) -> Self {
        Self { entity, point }
    }

    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// The reached final destination.
    pub fn point(&self) -> Vec3 {
        self.point
    }
}

fn update_requested_paths(
    finder: Res<PathFinder>,
    mut events: EventReader<SetDestinationEvent>,
    mut not_found: EventWriter<PathNotFoundEvent>,
    mut agents: Query<(&Transform, &mut PathFollower)>,
) {
    for event in events.iter() {
        let Ok((transform, mut follower)) = agents.get_mut(event.entity()) else {
            warn!(
                "Ignoring destination request for a non-agent entity {:?}",
                event.entity()
            );
            continue;
        };

        match follower.set_destination(finder.as_ref(), transform.translation, event.point()) {
            Ok(outcome) => trace!(
                "Destination of {:?} set to {:?}: {:?}",
                event.entity(),
                event.point(),
                outcome
            ),
            Err(error) => {
                info!("Path of {:?} not found: {}", event.entity(), error);
                not_found.send(PathNotFoundEvent::new(event.entity(), error));
            }
        }
    }
}

fn update_requested_flock_paths(
    finder: Res<PathFinder>,
    mut events: EventReader<SetFlockDestinationEvent>,
    mut not_found: EventWriter<PathNotFoundEvent>,
    mut agents: Query<(Entity, &Transform, &FlockMember, &mut PathFollower)>,
) {
    let mut requests: AHashMap<FlockId, Vec3> = AHashMap::new();
    for event in events.iter() {
        // Latest request wins.
        requests.insert(event.flock(), event.point());
    }
    if requests.is_empty() {
        return;
    }

    let mut leaders: AHashMap<FlockId, (Entity, Vec3)> = AHashMap::new();
    for (entity, transform, member, _) in agents.iter() {
        if !requests.contains_key(&member.flock()) {
            continue;
        }

        leaders
            .entry(member.flock())
            .and_modify(|leader| {
                if entity.to_bits() < leader.0.to_bits() {
                    *leader = (entity, transform.translation);
                }
            })
            .or_insert((entity, transform.translation));
    }

    let mut plans = AHashMap::with_capacity(requests.len());
    for (flock, point) in requests {
        let Some(&(leader, position)) = leaders.get(&flock) else {
            info!("Ignoring destination request of empty {}", flock);
            continue;
        };

        debug!("Searching route of {} led by {:?}", flock, leader);
        plans.insert(flock, (finder.plan(position, point), point));
    }

    for (entity, _, member, mut follower) in agents.iter_mut() {
        let Some((plan, point)) = plans.get(&member.flock()) else {
            continue;
        };

        match follower.apply(plan.clone(), *point) {
            Ok(FollowOutcome::Ignored) => {
                trace!("Destination request of {:?} ignored", entity)
            }
            Ok(_) => (),
            Err(error) => {
                not_found.send(PathNotFoundEvent::new(entity, error));
            }
        }
    }
}

fn follow_paths(conf: Res<Configuration>, mut agents: Query<(&Transform, &mut PathFollower)>) {
    let arrival_radius = conf.pathing().arrival_radius();
    for (transform, mut follower) in agents.iter_mut() {
        if follower.route().is_none() {
            continue;
        }
        follower.tick(transform.translation, arrival_radius);
    }
}

fn settle(
    conf: Res<Configuration>,
    mut agents: Query<(Entity, &Transform, &mut PathFollower)>,
    mut reached: EventWriter<DestinationReachedEvent>,
) {
    let arrival_radius = conf.pathing().arrival_radius();
    for (entity, transform, mut follower) in agents.iter_mut() {
        if !follower.is_pathing() || follower.route().is_some() {
            continue;
        }

        if follower.settle(transform.translation, arrival_radius) {
            if let Some(point) = follower.final_destination() {
                debug!("{:?} reached its destination {:?}", entity, point);
                reached.send(DestinationReachedEvent::new(entity, point));
            }
        }
    }
}
