use bevy::prelude::*;
use pf_conf::Configuration;
use pf_core::{
    projection::ToAltitude,
    query::{GroundHeight, HeightQuery},
    schedule::Movement,
};

use crate::steering::SteeringForce;

/// Speed (in meters per second) below which arrival drag is no longer
/// applied.
const ARRIVAL_MIN_SPEED: f32 = 1.;

pub(crate) struct KinematicsPlugin;

impl Plugin for KinematicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Movement,
            (
                kinematics.in_set(KinematicsSet::Kinematics),
                update_transform
                    .in_set(KinematicsSet::UpdateTransform)
                    .after(KinematicsSet::Kinematics),
            )
                .run_if(resource_exists::<Configuration>()),
        );
    }
}

#[derive(Copy, Clone, Hash, Debug, PartialEq, Eq, SystemSet)]
pub enum KinematicsSet {
    Kinematics,
    UpdateTransform,
}

/// Velocity of an agent.
#[derive(Component, Default, Clone, Copy, Debug)]
pub struct Kinematics {
    velocity: Vec3,
}

impl Kinematics {
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Integrates a force into velocity. Mass of all agents is 1.
    ///
    /// # Arguments
    ///
    /// * `force` - applied force.
    ///
    /// * `time_delta` - tick duration in seconds.
    ///
    /// * `max_speed` - resulting speed is clamped to this value (before
    ///   drag).
    ///
    /// * `drag` - fraction of velocity lost during the tick.
    pub fn apply(&mut self, force: Vec3, time_delta: f32, max_speed: f32, drag: f32) {
        debug_assert!(force.is_finite());
        debug_assert!((0. ..1.).contains(&drag));
        let velocity = (self.velocity + force * time_delta).clamp_length_max(max_speed);
        self.velocity = velocity - velocity * drag;
    }
}

/// Returns force slowing down an agent which is not pathing.
pub fn arrival_force(velocity: Vec3, arrival_drag: f32) -> Vec3 {
    if velocity.length_squared() > ARRIVAL_MIN_SPEED * ARRIVAL_MIN_SPEED {
        velocity * -arrival_drag
    } else {
        Vec3::ZERO
    }
}

fn kinematics(
    time: Res<Time>,
    conf: Res<Configuration>,
    mut agents: Query<(&SteeringForce, &mut Kinematics)>,
) {
    let time_delta = time.delta_seconds();
    let max_speed = conf.steering().max_speed();
    let drag = conf.kinematics().drag();

    for (force, mut kinematics) in agents.iter_mut() {
        let force = force.force();
        // Do not trigger Bevy's change detection when not necessary.
        if force == Vec3::ZERO && kinematics.velocity() == Vec3::ZERO {
            continue;
        }
        kinematics.apply(force, time_delta, max_speed, drag);
    }
}

fn update_transform(
    time: Res<Time>,
    conf: Res<Configuration>,
    ground: Option<Res<GroundHeight>>,
    mut agents: Query<(&Kinematics, &mut Transform)>,
) {
    let time_delta = time.delta_seconds();
    let ground_constrained = conf.steering().ground_constrained();

    for (kinematics, mut transform) in agents.iter_mut() {
        let velocity = kinematics.velocity();
        if velocity == Vec3::ZERO {
            continue;
        }

        let mut translation = transform.translation + time_delta * velocity;
        if ground_constrained {
            if let Some(ground) = ground.as_ref() {
                let height = ground.sample_ground_height(translation.x, translation.z);
                translation = translation.to_altitude(height);
            }
        }
        transform.translation = translation;

        let heading = velocity.to_msl();
        if heading.length_squared() > f32::EPSILON {
            transform.rotation = Quat::from_rotation_arc(Vec3::NEG_Z, heading.normalize());
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_apply() {
        let mut kinematics = Kinematics::default();
        kinematics.apply(Vec3::new(10., 0., 0.), 0.5, 20., 0.1);
        assert_abs_diff_eq!(kinematics.velocity().x, 4.5, epsilon = 0.0001);

        // Clamped to max speed.
        kinematics.apply(Vec3::new(0., 0., 1000.), 1., 5., 0.);
        assert_abs_diff_eq!(kinematics.velocity().length(), 5., epsilon = 0.0001);

        // Drag only.
        let before = kinematics.velocity();
        kinematics.apply(Vec3::ZERO, 1., 5., 0.5);
        assert_abs_diff_eq!(kinematics.velocity().z, 0.5 * before.z, epsilon = 0.0001);
    }

    #[test]
    fn test_arrival_force() {
        assert_eq!(
            arrival_force(Vec3::new(0., 0., 4.), 2.),
            Vec3::new(0., 0., -8.)
        );
        assert_eq!(arrival_force(Vec3::new(0.5, 0., 0.5), 2.), Vec3::ZERO);
        assert_eq!(arrival_force(Vec3::ZERO, 2.), Vec3::ZERO);
    }
}
