//! This crate implements movement of agents: flock aggregation, force based
//! steering with static obstacle avoidance and kinematics.

mod flock;
mod kinematics;
mod obstacles;
mod steering;

use bevy::{app::PluginGroupBuilder, prelude::*};
pub use flock::{Flock, FlockAggregates, FlockSet, Flocks};
use flock::FlockPlugin;
pub use kinematics::{arrival_force, Kinematics, KinematicsSet};
use kinematics::KinematicsPlugin;
pub use obstacles::{ObstacleCollider, ObstaclesSet, StaticObstacles};
use obstacles::ObstaclesPlugin;
use pf_core::objects::Agent;
use pf_pathing::PathFollower;
pub use steering::{
    alignment, avoid_obstacles, compute_force, seek, separation, AgentState, GroupContext,
    SteeringForce, SteeringParams, SteeringProfile, SteeringSet, SteeringWeights,
};
use steering::SteeringPlugin;

pub struct MovementPluginGroup;

impl PluginGroup for MovementPluginGroup {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>()
            .add(FlockPlugin)
            .add(ObstaclesPlugin)
            .add(SteeringPlugin)
            .add(KinematicsPlugin)
    }
}

/// All components needed by a steered agent. Insert
/// [`pf_core::objects::FlockMember`] to make the agent a flock member and
/// [`SteeringProfile`] to override its steering weights.
#[derive(Bundle)]
pub struct AgentBundle {
    agent: Agent,
    follower: PathFollower,
    kinematics: Kinematics,
    force: SteeringForce,
    transform: Transform,
}

impl AgentBundle {
    pub fn new(position: Vec3) -> Self {
        Self {
            agent: Agent,
            follower: PathFollower::default(),
            kinematics: Kinematics::default(),
            force: SteeringForce::default(),
            transform: Transform::from_translation(position),
        }
    }
}
