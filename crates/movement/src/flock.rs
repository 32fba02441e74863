//! Group-wide aggregates shared by all members of a flock.

use ahash::AHashMap;
use bevy::prelude::*;
use pf_conf::Configuration;
use pf_core::{
    objects::{FlockId, FlockMember},
    schedule::PreMovement,
};

use crate::kinematics::Kinematics;

pub(crate) struct FlockPlugin;

impl Plugin for FlockPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Flocks>().add_systems(
            PreMovement,
            update_flocks
                .in_set(FlockSet::Aggregate)
                .run_if(resource_exists::<Configuration>()),
        );
    }
}

#[derive(Copy, Clone, Hash, Debug, PartialEq, Eq, SystemSet)]
pub enum FlockSet {
    /// Flock aggregates are recomputed. This happens once per tick.
    Aggregate,
}

/// Centroid and heading of a flock.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlockAggregates {
    centroid: Vec3,
    average_direction: Vec3,
}

impl FlockAggregates {
    /// Computes aggregates of a flock. Returns None if there are no members.
    ///
    /// # Arguments
    ///
    /// * `members` - position and velocity of each flock member.
    ///
    /// * `max_speed` - the length of the resulting average direction.
    pub fn compute<I>(members: I, max_speed: f32) -> Option<Self>
    where
        I: IntoIterator<Item = (Vec3, Vec3)>,
    {
        let mut count = 0;
        let mut position_sum = Vec3::ZERO;
        let mut direction_sum = Vec3::ZERO;
        for (position, velocity) in members {
            count += 1;
            position_sum += position;
            direction_sum += velocity.normalize_or_zero();
        }

        if count == 0 {
            return None;
        }

        Some(Self {
            centroid: position_sum / count as f32,
            average_direction: direction_sum.normalize_or_zero() * max_speed,
        })
    }

    /// Mean position of all flock members.
    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Mean heading of flock members scaled to maximum speed. It is zero if
    /// no member is moving or if members cancel each other out.
    pub fn average_direction(&self) -> Vec3 {
        self.average_direction
    }
}

#[derive(Default)]
pub struct Flock {
    aggregates: FlockAggregates,
    positions: Vec<Vec3>,
}

impl Flock {
    /// Aggregates as of the last tick the flock had any members.
    pub fn aggregates(&self) -> &FlockAggregates {
        &self.aggregates
    }

    /// Positions of all current members.
    pub fn positions(&self) -> &[Vec3] {
        self.positions.as_slice()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// All flocks ever seen.
///
/// Entries are never removed: a flock which lost all its members stays in
/// the map with empty [`Flock::positions`] and its last aggregates, so
/// memory grows with the number of distinct [`FlockId`]s used during the
/// app lifetime.
#[derive(Resource, Default)]
pub struct Flocks(AHashMap<FlockId, Flock>);

impl Flocks {
    pub fn get(&self, id: FlockId) -> Option<&Flock> {
        self.0.get(&id)
    }

    /// Number of flocks ever seen, including those without any members.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Recomputes aggregates of all flocks. Aggregates of flocks without any
    /// members are kept intact.
    fn update<I>(&mut self, members: I, max_speed: f32)
    where
        I: IntoIterator<Item = (FlockId, Vec3, Vec3)>,
    {
        let mut grouped: AHashMap<FlockId, Vec<(Vec3, Vec3)>> = AHashMap::new();
        for (id, position, velocity) in members {
            grouped.entry(id).or_default().push((position, velocity));
        }

        for flock in self.0.values_mut() {
            flock.positions.clear();
        }

        for (id, members) in grouped {
            let flock = self.0.entry(id).or_default();
            if let Some(aggregates) = FlockAggregates::compute(members.iter().copied(), max_speed)
            {
                flock.aggregates = aggregates;
            }
            flock
                .positions
                .extend(members.iter().map(|&(position, _)| position));
        }
    }
}

fn update_flocks(
    conf: Res<Configuration>,
    mut flocks: ResMut<Flocks>,
    agents: Query<(&FlockMember, &Transform, &Kinematics)>,
) {
    flocks.update(
        agents.iter().map(|(member, transform, kinematics)| {
            (member.flock(), transform.translation, kinematics.velocity())
        }),
        conf.steering().max_speed(),
    );
}
