//! Narrow interfaces of services provided by the surrounding world: terrain
//! height sampling and obstacle probing.

use bevy::prelude::Resource;
use glam::Vec3;

/// Terrain height query.
pub trait HeightQuery {
    /// Returns altitude of the ground at the given ground plane position.
    fn sample_ground_height(&self, x: f32, z: f32) -> f32;
}

impl<F> HeightQuery for F
where
    F: Fn(f32, f32) -> f32,
{
    fn sample_ground_height(&self, x: f32, z: f32) -> f32 {
        self(x, z)
    }
}

/// Perfectly flat terrain.
#[derive(Clone, Copy, Debug, Default)]
pub struct FlatGround {
    altitude: f32,
}

impl FlatGround {
    pub fn new(altitude: f32) -> Self {
        Self { altitude }
    }
}

impl HeightQuery for FlatGround {
    fn sample_ground_height(&self, _x: f32, _z: f32) -> f32 {
        self.altitude
    }
}

/// Terrain height query of the simulated world. Agents constrained to ground
/// movement are snapped to the sampled height when this resource exists.
#[derive(Resource)]
pub struct GroundHeight(Box<dyn HeightQuery + Send + Sync>);

impl GroundHeight {
    pub fn new<Q>(query: Q) -> Self
    where
        Q: HeightQuery + Send + Sync + 'static,
    {
        Self(Box::new(query))
    }
}

impl HeightQuery for GroundHeight {
    fn sample_ground_height(&self, x: f32, z: f32) -> f32 {
        self.0.sample_ground_height(x, z)
    }
}

/// A ray cast based obstacle query.
pub trait ObstacleProbe {
    /// Casts a probe and returns the closest hit, if any.
    ///
    /// # Arguments
    ///
    /// * `origin` - starting point of the probe.
    ///
    /// * `direction` - normalized direction of the probe.
    ///
    /// * `max_distance` - the probe is not cast further than this distance
    ///   from `origin`.
    fn probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<ProbeHit>;
}

/// A world without any obstacles.
pub struct NoObstacles;

impl ObstacleProbe for NoObstacles {
    fn probe(&self, _origin: Vec3, _direction: Vec3, _max_distance: f32) -> Option<ProbeHit> {
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeHit {
    point: Vec3,
    is_obstacle: bool,
}

impl ProbeHit {
    /// # Arguments
    ///
    /// * `point` - world space point where the probe hit a collider.
    ///
    /// * `is_obstacle` - whether the hit collider is an obstacle which should
    ///   be avoided (as opposed to, for example, a trigger volume).
    pub fn new(point: Vec3, is_obstacle: bool) -> Self {
        Self { point, is_obstacle }
    }

    pub fn point(&self) -> Vec3 {
        self.point
    }

    pub fn is_obstacle(&self) -> bool {
        self.is_obstacle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ground_height() {
        let ground = GroundHeight::new(FlatGround::new(2.5));
        assert_eq!(ground.sample_ground_height(10., -3.), 2.5);
        assert_eq!(FlatGround::default().sample_ground_height(1., 1.), 0.);

        let slope = GroundHeight::new(|x: f32, z: f32| 0.5 * x - z);
        assert_eq!(slope.sample_ground_height(4., 1.), 1.);
    }
}
