use bevy::prelude::*;
use parry3d::{
    math::{Isometry, Vector},
    query::{Ray, RayCast},
    shape::{Ball, Cuboid},
};
use pf_core::{
    query::{ObstacleProbe, ProbeHit},
    schedule::PreMovement,
};

pub(crate) struct ObstaclesPlugin;

impl Plugin for ObstaclesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<StaticObstacles>().add_systems(
            PreMovement,
            (
                check_removed.in_set(ObstaclesSet::CheckRemoved),
                check_updated.in_set(ObstaclesSet::CheckUpdated),
                update
                    .in_set(ObstaclesSet::Update)
                    .after(ObstaclesSet::CheckRemoved)
                    .after(ObstaclesSet::CheckUpdated),
            ),
        );
    }
}

#[derive(Copy, Clone, Hash, Debug, PartialEq, Eq, SystemSet)]
pub enum ObstaclesSet {
    CheckRemoved,
    CheckUpdated,
    Update,
}

/// Collider of a static obstacle. The obstacle is positioned by its
/// [`Transform`].
#[derive(Component, Clone)]
pub struct ObstacleCollider {
    shape: ObstacleShape,
    solid: bool,
}

impl ObstacleCollider {
    pub fn ball(radius: f32) -> Self {
        Self {
            shape: ObstacleShape::Ball(Ball::new(radius)),
            solid: true,
        }
    }

    /// # Arguments
    ///
    /// * `half_extents` - half of the box size along each local axis.
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self {
            shape: ObstacleShape::Cuboid(Cuboid::new(half_extents.into())),
            solid: true,
        }
    }

    /// Makes the collider a trigger volume: probes hit it but agents do not
    /// avoid it.
    pub fn trigger(mut self) -> Self {
        self.solid = false;
        self
    }

    fn cast_ray(&self, position: &Isometry<f32>, ray: &Ray, max_toi: f32) -> Option<f32> {
        match &self.shape {
            ObstacleShape::Ball(ball) => ball.cast_ray(position, ray, max_toi, true),
            ObstacleShape::Cuboid(cuboid) => cuboid.cast_ray(position, ray, max_toi, true),
        }
    }
}

#[derive(Clone)]
enum ObstacleShape {
    Ball(Ball),
    Cuboid(Cuboid),
}

/// All static obstacles of the world. Ray probes are answered by brute force
/// over all obstacles.
#[derive(Resource, Default)]
pub struct StaticObstacles {
    obstacles: Vec<(Isometry<f32>, ObstacleCollider)>,
    invalid: bool,
}

impl StaticObstacles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, transform: &Transform, collider: ObstacleCollider) {
        let position = Isometry::new(
            transform.translation.into(),
            transform.rotation.to_scaled_axis().into(),
        );
        self.obstacles.push((position, collider));
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    fn invalidate(&mut self) {
        self.invalid = true;
    }

    fn clear(&mut self) {
        self.obstacles.clear();
        self.invalid = false;
    }
}

impl ObstacleProbe for StaticObstacles {
    fn probe(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<ProbeHit> {
        let ray = Ray::new(origin.into(), Vector::from(direction));
        self.obstacles
            .iter()
            .filter_map(|(position, collider)| {
                collider
                    .cast_ray(position, &ray, max_distance)
                    .map(|toi| (toi, collider.solid))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(toi, solid)| ProbeHit::new(ray.point_at(toi).into(), solid))
    }
}

type ChangedQuery<'world, 'state> =
    Query<'world, 'state, Entity, Or<(Changed<Transform>, Changed<ObstacleCollider>)>>;

fn check_removed(
    mut obstacles: ResMut<StaticObstacles>,
    mut removed: RemovedComponents<ObstacleCollider>,
) {
    if removed.iter().next().is_some() {
        obstacles.invalidate();
    }
}

fn check_updated(
    mut obstacles: ResMut<StaticObstacles>,
    changed: ChangedQuery,
    colliders: Query<(), With<ObstacleCollider>>,
) {
    if changed.iter().any(|entity| colliders.contains(entity)) {
        obstacles.invalidate();
    }
}

fn update(
    mut obstacles: ResMut<StaticObstacles>,
    colliders: Query<(&Transform, &ObstacleCollider)>,
) {
    if !obstacles.invalid {
        return;
    }

    obstacles.clear();
    for (transform, collider) in colliders.iter() {
        obstacles.insert(transform, collider.clone());
    }
    info!("Static obstacles updated: {} obstacles", obstacles.len());
}
