//! This module contains configuration object which can be (de)serialized from
//! a configuration file. It does not contain final configuration object which
//! must be build and validated from the objects here.
//!
//! All fields are optional, defaults are used for missing values.

use pf_graph::DistanceMetric;
use serde::Deserialize;

#[derive(Deserialize, Default)]
pub(super) struct Configuration {
    pub(super) pathing: Option<Pathing>,
    pub(super) steering: Option<Steering>,
    pub(super) kinematics: Option<Kinematics>,
    pub(super) influence: Option<Influence>,
}

#[derive(Deserialize, Default)]
pub(super) struct Pathing {
    pub(super) arrival_radius: Option<f32>,
    pub(super) metric: Option<DistanceMetric>,
}

#[derive(Deserialize, Default)]
pub(super) struct Steering {
    pub(super) max_speed: Option<f32>,
    pub(super) max_force: Option<f32>,
    pub(super) separation_radius: Option<f32>,
    pub(super) look_ahead: Option<f32>,
    pub(super) ground_constrained: Option<bool>,
    pub(super) weights: Option<Weights>,
}

#[derive(Deserialize, Default)]
pub(super) struct Weights {
    pub(super) seek: Option<f32>,
    pub(super) separation: Option<f32>,
    pub(super) cohesion: Option<f32>,
    pub(super) alignment: Option<f32>,
    pub(super) avoidance: Option<f32>,
}

#[derive(Deserialize, Default)]
pub(super) struct Kinematics {
    pub(super) drag: Option<f32>,
    pub(super) arrival_drag: Option<f32>,
}

#[derive(Deserialize, Default)]
pub(super) struct Influence {
    pub(super) columns: Option<u16>,
    pub(super) rows: Option<u16>,
}
