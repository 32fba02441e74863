//! This module implements projections of 3D world positions to the ground
//! plane and back.
//!
//! The ground plane is spanned by world X and Z axes, 2D coordinates are
//! `(x, z)`.

use glam::{Vec2, Vec3};

/// Trait for conversion of various geometrical objects to their 3D equivalents
/// placed to an altitude.
pub trait ToAltitude<T> {
    fn to_altitude(self, altitude: f32) -> T;

    /// Converts / moves the object to zero altitude.
    fn to_msl(self) -> T
    where
        Self: Sized,
    {
        self.to_altitude(0.)
    }
}

impl ToAltitude<Vec3> for Vec2 {
    fn to_altitude(self, altitude: f32) -> Vec3 {
        Vec3::new(self.x, altitude, self.y)
    }
}

impl ToAltitude<Vec3> for Vec3 {
    fn to_altitude(self, altitude: f32) -> Vec3 {
        Vec3::new(self.x, altitude, self.z)
    }
}

/// Transformation between 3D world coordinates and 2D ground plane
/// coordinates.
pub trait ToFlat<Flat> {
    fn to_flat(self) -> Flat;
}

impl ToFlat<Vec2> for Vec3 {
    fn to_flat(self) -> Vec2 {
        Vec2::new(self.x, self.z)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_to_msl() {
        let vec = Vec2::new(10.5, 15.5);
        let vec3 = vec.to_msl();
        assert_eq!(vec3.x, 10.5);
        assert_eq!(vec3.y, 0.);
        assert_eq!(vec3.z, 15.5);

        assert_eq!(Vec3::new(1., 2., 3.).to_msl(), Vec3::new(1., 0., 3.));
        assert_eq!(
            Vec3::new(1., 2., 3.).to_altitude(-4.),
            Vec3::new(1., -4., 3.)
        );
    }

    #[test]
    fn test_to_flat() {
        let vec = Vec3::new(1., 2., 3.);
        assert_eq!(vec.to_flat(), Vec2::new(1., 3.));
    }
}
