use std::fmt;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// An autonomously navigating object.
#[derive(Component)]
pub struct Agent;

/// Identifier of a group of agents moving together.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FlockId(u32);

impl FlockId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for FlockId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Flock {}", self.0)
    }
}

/// Membership of an agent in a flock.
#[derive(Component, Copy, Clone, Debug, PartialEq, Eq)]
pub struct FlockMember(FlockId);

impl FlockMember {
    pub fn new(flock: FlockId) -> Self {
        Self(flock)
    }

    pub fn flock(&self) -> FlockId {
        self.0
    }
}
