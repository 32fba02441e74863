#![allow(clippy::modulo_one)] // Caused by derive(Enum) on a two variant enum.

use bevy::prelude::*;
use enum_map::Enum;

/// Maximum strength of a unit. It is also the maximum influence a single
/// unit exerts on a single cell.
pub const MAX_STRENGTH: u8 = 4;

#[derive(Enum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Team {
    /// Green team exerts positive influence.
    Green,
    /// Red team exerts negative influence.
    Red,
}

impl Team {
    /// Returns the team owning the side of a dividing plane (for example a
    /// river) the position lies on. None is returned for positions exactly
    /// on the plane.
    ///
    /// # Arguments
    ///
    /// * `position` - position of the classified unit.
    ///
    /// * `divide` - a point on the dividing plane.
    ///
    /// * `red_side` - normal of the dividing plane pointing towards the red
    ///   side.
    pub fn by_side(position: Vec3, divide: Vec3, red_side: Vec3) -> Option<Self> {
        let dot = (position - divide).dot(red_side);
        if dot > 0. {
            Some(Self::Red)
        } else if dot < 0. {
            Some(Self::Green)
        } else {
            None
        }
    }

    /// Sign of the influence exerted by units of the team.
    pub fn sign(self) -> i32 {
        match self {
            Self::Green => 1,
            Self::Red => -1,
        }
    }
}

#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfluenceUnit {
    strength: u8,
    team: Team,
}

impl InfluenceUnit {
    /// Creates a new unit. Strength outside of `1..=MAX_STRENGTH` is replaced
    /// by 1.
    pub fn new(strength: u8, team: Team) -> Self {
        let strength = if (1..=MAX_STRENGTH).contains(&strength) {
            strength
        } else {
            warn!("Influence unit strength {strength} is out of bounds, setting to 1");
            1
        };
        Self { strength, team }
    }

    pub fn strength(&self) -> u8 {
        self.strength
    }

    pub fn team(&self) -> Team {
        self.team
    }
}
