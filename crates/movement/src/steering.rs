//! Force based steering of agents.
//!
//! The combined steering force is a weighted sum of independent behaviors:
//! seek, separation, cohesion, alignment and obstacle avoidance. The sum is
//! clamped to the maximum force.

use std::f32::consts::FRAC_PI_4;

use bevy::prelude::*;
use pf_conf::{Configuration, SteeringConf, WeightsConf};
use pf_core::{
    objects::FlockMember,
    projection::ToAltitude,
    query::{NoObstacles, ObstacleProbe},
    schedule::Movement,
};
use pf_pathing::PathFollower;

use crate::{
    flock::Flocks,
    kinematics::{arrival_force, Kinematics, KinematicsSet},
    obstacles::StaticObstacles,
};

pub(crate) struct SteeringPlugin;

impl Plugin for SteeringPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Movement,
            steer
                .in_set(SteeringSet::Steer)
                .before(KinematicsSet::Kinematics)
                .run_if(resource_exists::<Configuration>()),
        );
    }
}

#[derive(Copy, Clone, Hash, Debug, PartialEq, Eq, SystemSet)]
pub enum SteeringSet {
    Steer,
}

/// Relative importance of individual steering behaviors. Weights are finite
/// and non-negative, a zero weight disables the behavior.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SteeringWeights {
    seek: f32,
    separation: f32,
    cohesion: f32,
    alignment: f32,
    avoidance: f32,
}

impl SteeringWeights {
    /// # Panics
    ///
    /// Panics if any of the weights is negative or not finite.
    pub fn new(seek: f32, separation: f32, cohesion: f32, alignment: f32, avoidance: f32) -> Self {
        for weight in [seek, separation, cohesion, alignment, avoidance] {
            assert!(
                weight.is_finite() && weight >= 0.,
                "Steering weight must be a finite non-negative number, got {weight}"
            );
        }
        Self {
            seek,
            separation,
            cohesion,
            alignment,
            avoidance,
        }
    }

    /// Weights of an agent which simply seeks its target.
    pub fn seek_only(seek: f32) -> Self {
        Self::new(seek, 0., 0., 0., 0.)
    }

    pub fn seek(&self) -> f32 {
        self.seek
    }

    pub fn separation(&self) -> f32 {
        self.separation
    }

    pub fn cohesion(&self) -> f32 {
        self.cohesion
    }

    pub fn alignment(&self) -> f32 {
        self.alignment
    }

    pub fn avoidance(&self) -> f32 {
        self.avoidance
    }
}

impl From<&WeightsConf> for SteeringWeights {
    fn from(conf: &WeightsConf) -> Self {
        Self::new(
            conf.seek(),
            conf.separation(),
            conf.cohesion(),
            conf.alignment(),
            conf.avoidance(),
        )
    }
}

/// Agent specific steering weights. Flock members without this component use
/// configured weights, other agents only seek their targets.
#[derive(Component, Clone, Copy, Debug)]
pub struct SteeringProfile(SteeringWeights);

impl SteeringProfile {
    pub fn new(weights: SteeringWeights) -> Self {
        Self(weights)
    }

    pub fn weights(&self) -> &SteeringWeights {
        &self.0
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SteeringParams {
    max_speed: f32,
    max_force: f32,
    separation_radius: f32,
    look_ahead: f32,
    ground_constrained: bool,
}

impl SteeringParams {
    pub fn new(
        max_speed: f32,
        max_force: f32,
        separation_radius: f32,
        look_ahead: f32,
        ground_constrained: bool,
    ) -> Self {
        Self {
            max_speed,
            max_force,
            separation_radius,
            look_ahead,
            ground_constrained,
        }
    }
}

impl From<&SteeringConf> for SteeringParams {
    fn from(conf: &SteeringConf) -> Self {
        Self::new(
            conf.max_speed(),
            conf.max_force(),
            conf.separation_radius(),
            conf.look_ahead(),
            conf.ground_constrained(),
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AgentState {
    position: Vec3,
    velocity: Vec3,
}

impl AgentState {
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self { position, velocity }
    }
}

/// State of the flock a steered agent is member of.
#[derive(Clone, Copy, Debug)]
pub struct GroupContext<'a> {
    centroid: Vec3,
    average_direction: Vec3,
    members: &'a [Vec3],
}

impl<'a> GroupContext<'a> {
    /// # Arguments
    ///
    /// * `centroid` - mean position of flock members.
    ///
    /// * `average_direction` - mean flock member heading scaled to maximum
    ///   speed.
    ///
    /// * `members` - positions of all flock members. The steered agent
    ///   itself may be included.
    pub fn new(centroid: Vec3, average_direction: Vec3, members: &'a [Vec3]) -> Self {
        Self {
            centroid,
            average_direction,
            members,
        }
    }
}

/// Computes combined steering force of an agent.
///
/// # Arguments
///
/// * `agent` - the steered agent.
///
/// * `target` - currently approached point. Seek contributes nothing when
///   this is None.
///
/// * `group` - flock of the agent. Separation, cohesion and alignment
///   contribute nothing when this is None.
///
/// * `obstacles` - obstacle query used for avoidance.
pub fn compute_force<P: ObstacleProbe + ?Sized>(
    agent: AgentState,
    target: Option<Vec3>,
    group: Option<&GroupContext>,
    obstacles: &P,
    weights: &SteeringWeights,
    params: &SteeringParams,
) -> Vec3 {
    let mut force = Vec3::ZERO;

    if weights.seek > 0. {
        if let Some(target) = target {
            force += weights.seek * seek(agent, target, params);
        }
    }

    if let Some(group) = group {
        if weights.separation > 0. {
            force += weights.separation * separation(agent, group.members, params);
        }
        if weights.cohesion > 0. {
            force += weights.cohesion * seek(agent, group.centroid, params);
        }
        if weights.alignment > 0. {
            force += weights.alignment * alignment(agent, group.average_direction);
        }
    }

    if weights.avoidance > 0. {
        force += weights.avoidance * avoid_obstacles(agent, obstacles, params);
    }

    if params.ground_constrained {
        force = force.to_msl();
    }
    force.clamp_length_max(params.max_force)
}

/// Returns a force steering the agent towards `target` at maximum speed.
pub fn seek(agent: AgentState, target: Vec3, params: &SteeringParams) -> Vec3 {
    let mut offset = target - agent.position;
    if params.ground_constrained {
        offset = offset.to_msl();
    }
    offset.normalize_or_zero() * params.max_speed - agent.velocity
}

/// Returns a force pushing the agent away from nearby flock members.
///
/// Zero is returned when no other member is closer than the separation
/// radius.
pub fn separation(agent: AgentState, members: &[Vec3], params: &SteeringParams) -> Vec3 {
    let radius_squared = params.separation_radius * params.separation_radius;
    let away: Vec3 = members
        .iter()
        .filter(|&&other| agent.position.distance_squared(other) < radius_squared)
        .map(|&other| agent.position - other)
        .sum();
    away.normalize_or_zero() * params.max_speed
}

/// Returns a force aligning agent's velocity with the flock heading.
pub fn alignment(agent: AgentState, average_direction: Vec3) -> Vec3 {
    average_direction - agent.velocity
}

/// Returns a force steering the agent away from obstacles ahead.
///
/// Three probes are cast from agent's position: one along its velocity and
/// two rotated by 45 degrees to each side around the vertical axis.
pub fn avoid_obstacles<P: ObstacleProbe + ?Sized>(
    agent: AgentState,
    obstacles: &P,
    params: &SteeringParams,
) -> Vec3 {
    if params.look_ahead <= 0. {
        return Vec3::ZERO;
    }

    let mut heading = agent.velocity;
    if params.ground_constrained {
        heading = heading.to_msl();
    }
    let heading = heading.normalize_or_zero();
    if heading == Vec3::ZERO {
        return Vec3::ZERO;
    }

    let away: Vec3 = [0., FRAC_PI_4, -FRAC_PI_4]
        .into_iter()
        .filter_map(|angle| {
            let direction = Quat::from_rotation_y(angle) * heading;
            obstacles.probe(agent.position, direction, params.look_ahead)
        })
        .filter(|hit| hit.is_obstacle())
        .map(|hit| agent.position - hit.point())
        .sum();
    away.normalize_or_zero() * params.max_speed
}

/// Resulting steering force of an agent.
#[derive(Component, Default, Clone, Copy, Debug)]
pub struct SteeringForce(Vec3);

impl SteeringForce {
    pub fn force(&self) -> Vec3 {
        self.0
    }

    pub(crate) fn update(&mut self, force: Vec3) {
        debug_assert!(force.is_finite());
        self.0 = force;
    }
}

type Steered<'w, 's> = Query<
    'w,
    's,
    (
        &'static Transform,
        &'static Kinematics,
        &'static PathFollower,
        Option<&'static FlockMember>,
        Option<&'static SteeringProfile>,
        &'static mut SteeringForce,
    ),
>;

fn steer(
    conf: Res<Configuration>,
    flocks: Option<Res<Flocks>>,
    obstacles: Option<Res<StaticObstacles>>,
    mut agents: Steered,
) {
    let params = SteeringParams::from(conf.steering());
    let flock_weights = SteeringWeights::from(conf.steering().weights());
    let arrival_drag = conf.kinematics().arrival_drag();
    let obstacles: &dyn ObstacleProbe = match obstacles.as_ref() {
        Some(obstacles) => &**obstacles,
        None => &NoObstacles,
    };

    for (transform, kinematics, follower, member, profile, mut force) in agents.iter_mut() {
        if !follower.is_pathing() {
            force.update(arrival_force(kinematics.velocity(), arrival_drag));
            continue;
        }

        let flock = member.and_then(|member| {
            flocks
                .as_ref()
                .and_then(|flocks| flocks.get(member.flock()))
        });
        let group = flock.map(|flock| {
            GroupContext::new(
                flock.aggregates().centroid(),
                flock.aggregates().average_direction(),
                flock.positions(),
            )
        });

        let weights = match (profile, member) {
            (Some(profile), _) => *profile.weights(),
            (None, Some(_)) => flock_weights,
            (None, None) => SteeringWeights::seek_only(flock_weights.seek()),
        };

        force.update(compute_force(
            AgentState::new(transform.translation, kinematics.velocity()),
            follower.target(),
            group.as_ref(),
            obstacles,
            &weights,
            &params,
        ));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pf_core::query::ProbeHit;

    use super::*;

    fn params() -> SteeringParams {
        SteeringParams::new(10., 20., 2., 5., false)
    }

    /// An infinite wall perpendicular to the X axis.
    struct Wall(f32);

    impl ObstacleProbe for Wall {
        fn probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<ProbeHit> {
            if direction.x <= 0. {
                return None;
            }
            let distance = (self.0 - origin.x) / direction.x;
            if distance < 0. || distance > max_distance {
                return None;
            }
            Some(ProbeHit::new(origin + distance * direction, true))
        }
    }

    fn assert_vec_eq(actual: Vec3, expected: Vec3) {
        assert_abs_diff_eq!(actual.x, expected.x, epsilon = 0.0001);
        assert_abs_diff_eq!(actual.y, expected.y, epsilon = 0.0001);
        assert_abs_diff_eq!(actual.z, expected.z, epsilon = 0.0001);
    }

    #[test]
    fn test_seek() {
        let agent = AgentState::new(Vec3::ZERO, Vec3::new(0., 0., 2.));
        assert_vec_eq(
            seek(agent, Vec3::new(3., 4., 0.), &params()),
            Vec3::new(6., 8., -2.),
        );

        let params = SteeringParams::new(10., 20., 2., 5., true);
        assert_vec_eq(
            seek(agent, Vec3::new(3., 4., 0.), &params),
            Vec3::new(10., 0., -2.),
        );

        // Already there.
        assert_eq!(seek(agent, Vec3::ZERO, &params), Vec3::new(0., 0., -2.));
    }

    #[test]
    fn test_separation() {
        let agent = AgentState::new(Vec3::ZERO, Vec3::ZERO);

        let force = separation(agent, &[], &params());
        assert_eq!(force, Vec3::ZERO);
        assert!(force.is_finite());

        // Self and far away members only.
        let force = separation(agent, &[Vec3::ZERO, Vec3::new(5., 0., 0.)], &params());
        assert_eq!(force, Vec3::ZERO);
        assert!(force.is_finite());

        let force = separation(
            agent,
            &[Vec3::ZERO, Vec3::new(1., 0., 0.), Vec3::new(0., 0., 1.5)],
            &params(),
        );
        assert_vec_eq(force, Vec3::new(-1., 0., -1.5).normalize() * 10.);
    }

    #[test]
    fn test_alignment() {
        let agent = AgentState::new(Vec3::ONE, Vec3::new(1., 0., 1.));
        assert_eq!(
            alignment(agent, Vec3::new(10., 0., 0.)),
            Vec3::new(9., 0., -1.)
        );
    }

    #[test]
    fn test_avoid_obstacles() {
        let agent = AgentState::new(Vec3::ZERO, Vec3::new(2., 0., 0.));
        let force = avoid_obstacles(agent, &Wall(3.), &params());
        // All three probes hit the wall, sideways components cancel out.
        assert_vec_eq(force, Vec3::new(-10., 0., 0.));

        // Beyond look ahead distance.
        let force = avoid_obstacles(agent, &Wall(6.), &params());
        assert_eq!(force, Vec3::ZERO);

        let stationary = AgentState::new(Vec3::ZERO, Vec3::ZERO);
        assert_eq!(avoid_obstacles(stationary, &Wall(1.), &params()), Vec3::ZERO);
        assert_eq!(avoid_obstacles(agent, &NoObstacles, &params()), Vec3::ZERO);
    }

    #[test]
    fn test_avoid_triggers() {
        struct Trigger;

        impl ObstacleProbe for Trigger {
            fn probe(&self, origin: Vec3, direction: Vec3, _: f32) -> Option<ProbeHit> {
                Some(ProbeHit::new(origin + direction, false))
            }
        }

        let agent = AgentState::new(Vec3::ZERO, Vec3::new(2., 0., 0.));
        assert_eq!(avoid_obstacles(agent, &Trigger, &params()), Vec3::ZERO);
    }

    #[test]
    fn test_compute_force_clamped() {
        let agent = AgentState::new(Vec3::ZERO, Vec3::new(-3., 1., 2.));
        let members = [Vec3::new(0.5, 0., 0.), Vec3::new(-4., 0., 9.)];
        let group = GroupContext::new(Vec3::new(-2., 0., 5.), Vec3::new(0., 0., 10.), &members);

        for weights in [
            SteeringWeights::new(1., 10., 1.8, 1.8, 3.),
            SteeringWeights::new(100., 100., 100., 100., 100.),
            SteeringWeights::new(0.3, 0., 0., 0.1, 0.),
            SteeringWeights::new(1e6, 0., 0., 0., 1e6),
        ] {
            let force = compute_force(
                agent,
                Some(Vec3::new(20., 0., -7.)),
                Some(&group),
                &Wall(1.),
                &weights,
                &params(),
            );
            assert!(force.is_finite());
            assert!(force.length() <= 20. + 0.001);
        }
    }

    #[test]
    fn test_compute_force_zero_weights() {
        let agent = AgentState::new(Vec3::ZERO, Vec3::ZERO);
        let force = compute_force(
            agent,
            Some(Vec3::new(1., 0., 0.)),
            None,
            &NoObstacles,
            &SteeringWeights::new(0., 0., 0., 0., 0.),
            &params(),
        );
        assert_eq!(force, Vec3::ZERO);

        let force = compute_force(
            agent,
            None,
            None,
            &NoObstacles,
            &SteeringWeights::seek_only(1.),
            &params(),
        );
        assert_eq!(force, Vec3::ZERO);
    }

    #[test]
    #[should_panic(expected = "finite non-negative")]
    fn test_negative_weight() {
        SteeringWeights::new(1., -0.5, 1., 1., 1.);
    }

    #[test]
    #[should_panic(expected = "finite non-negative")]
    fn test_infinite_weight() {
        SteeringWeights::seek_only(f32::INFINITY);
    }

    #[test]
    fn test_compute_force_ground_constrained() {
        let agent = AgentState::new(Vec3::ZERO, Vec3::new(0., 3., 0.));
        let params = SteeringParams::new(10., 20., 2., 5., true);
        let force = compute_force(
            agent,
            Some(Vec3::new(0., 10., 1.)),
            None,
            &NoObstacles,
            &SteeringWeights::seek_only(1.),
            &params,
        );
        assert_eq!(force, Vec3::new(0., 0., 10.));
    }
}
