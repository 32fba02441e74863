//! This module extends default Bevy schedules.
//!
//! A simulation tick consists of the following schedules executed in this
//! order right after [`bevy::app::First`]: [`PreMovement`], [`Movement`]
//! and [`PostMovement`].

use bevy::{app::MainScheduleOrder, ecs::schedule::ScheduleLabel, prelude::*};

pub struct GameSchedulesPlugin;

impl Plugin for GameSchedulesPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup);
    }
}

fn setup(mut main: ResMut<MainScheduleOrder>) {
    main.insert_after(First, PreMovement);
    main.insert_after(PreMovement, Movement);
    main.insert_after(Movement, PostMovement);
}

/// The simulation state is prepared for movement during this schedule: flock
/// aggregates are recomputed, destination requests are resolved to routes
/// and path followers advance their targets.
///
/// Flock aggregates are computed exactly once per tick, before any steering
/// force is computed.
#[derive(ScheduleLabel, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PreMovement;

/// Steering forces are computed and integrated during this schedule. All
/// changes to agents' [`bevy::prelude::Transform`] happen here (and in no
/// other schedule).
#[derive(ScheduleLabel, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Movement;

/// This schedule includes auxiliary updates depending on final agent
/// positions, for example influence map rebuilds.
#[derive(ScheduleLabel, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PostMovement;
