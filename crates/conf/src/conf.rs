//! This module implements final (i.e. parsed and validated) configuration
//! objects and their building from persistent configuration.

use bevy::prelude::Resource;
use pf_graph::DistanceMetric;

use crate::{errors::ConfigLoadError, persisted};

#[derive(Resource, Debug, Clone, Default)]
pub struct Configuration {
    pathing: PathingConf,
    steering: SteeringConf,
    kinematics: KinematicsConf,
    influence: InfluenceConf,
}

impl Configuration {
    pub fn pathing(&self) -> &PathingConf {
        &self.pathing
    }

    pub fn steering(&self) -> &SteeringConf {
        &self.steering
    }

    pub fn kinematics(&self) -> &KinematicsConf {
        &self.kinematics
    }

    pub fn influence(&self) -> &InfluenceConf {
        &self.influence
    }
}

impl TryFrom<persisted::Configuration> for Configuration {
    type Error = ConfigLoadError;

    fn try_from(conf: persisted::Configuration) -> Result<Self, Self::Error> {
        let mut checks = Checks::default();
        let configuration = Self {
            pathing: PathingConf::build(conf.pathing.unwrap_or_default(), &mut checks),
            steering: SteeringConf::build(conf.steering.unwrap_or_default(), &mut checks),
            kinematics: KinematicsConf::build(conf.kinematics.unwrap_or_default(), &mut checks),
            influence: InfluenceConf::build(conf.influence.unwrap_or_default(), &mut checks),
        };
        checks.finish()?;
        Ok(configuration)
    }
}

/// Collects failed validations of individual configuration values.
#[derive(Default)]
struct Checks {
    errors: Vec<(String, String)>,
}

impl Checks {
    fn ensure(&mut self, field: &str, condition: bool, message: &str) {
        if !condition {
            self.errors.push((field.to_owned(), message.to_owned()));
        }
    }

    fn finite(&mut self, field: &str, value: f32) {
        self.ensure(
            field,
            value.is_finite(),
            &format!("`{field}` must be a finite number."),
        );
    }

    fn finish(self) -> Result<(), ConfigLoadError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigLoadError::CheckErrors(self.errors))
        }
    }
}

#[derive(Debug, Clone)]
pub struct PathingConf {
    arrival_radius: f32,
    metric: DistanceMetric,
}

impl PathingConf {
    fn build(persisted: persisted::Pathing, checks: &mut Checks) -> Self {
        let default = Self::default();
        let conf = Self {
            arrival_radius: persisted.arrival_radius.unwrap_or(default.arrival_radius),
            metric: persisted.metric.unwrap_or(default.metric),
        };

        checks.finite("pathing.arrival_radius", conf.arrival_radius);
        checks.ensure(
            "pathing.arrival_radius",
            conf.arrival_radius > 0.,
            "`pathing.arrival_radius` must be positive.",
        );
        conf
    }

    /// An agent is considered to reach a waypoint (or its final destination)
    /// once it gets closer than this distance.
    pub fn arrival_radius(&self) -> f32 {
        self.arrival_radius
    }

    /// Metric used for edge costs, search heuristic and for snapping of
    /// positions to graph nodes.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }
}

impl Default for PathingConf {
    fn default() -> Self {
        Self {
            arrival_radius: 1.5,
            metric: DistanceMetric::Manhattan,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SteeringConf {
    max_speed: f32,
    max_force: f32,
    separation_radius: f32,
    look_ahead: f32,
    ground_constrained: bool,
    weights: WeightsConf,
}

impl SteeringConf {
    fn build(persisted: persisted::Steering, checks: &mut Checks) -> Self {
        let default = Self::default();
        let conf = Self {
            max_speed: persisted.max_speed.unwrap_or(default.max_speed),
            max_force: persisted.max_force.unwrap_or(default.max_force),
            separation_radius: persisted
                .separation_radius
                .unwrap_or(default.separation_radius),
            look_ahead: persisted.look_ahead.unwrap_or(default.look_ahead),
            ground_constrained: persisted
                .ground_constrained
                .unwrap_or(default.ground_constrained),
            weights: WeightsConf::build(persisted.weights.unwrap_or_default(), checks),
        };

        checks.finite("steering.max_speed", conf.max_speed);
        checks.ensure(
            "steering.max_speed",
            conf.max_speed > 0.,
            "`steering.max_speed` must be positive.",
        );
        checks.finite("steering.max_force", conf.max_force);
        checks.ensure(
            "steering.max_force",
            conf.max_force > 0.,
            "`steering.max_force` must be positive.",
        );
        checks.finite("steering.separation_radius", conf.separation_radius);
        checks.ensure(
            "steering.separation_radius",
            conf.separation_radius >= 0.,
            "`steering.separation_radius` must be greater than or equal to 0.0.",
        );
        checks.finite("steering.look_ahead", conf.look_ahead);
        checks.ensure(
            "steering.look_ahead",
            conf.look_ahead >= 0.,
            "`steering.look_ahead` must be greater than or equal to 0.0.",
        );
        conf
    }

    /// Maximum speed of agents. All seeking behaviors target this speed.
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Maximum magnitude of the combined steering force applied per tick.
    pub fn max_force(&self) -> f32 {
        self.max_force
    }

    /// Agents of the same flock closer than this distance push each other
    /// away.
    pub fn separation_radius(&self) -> f32 {
        self.separation_radius
    }

    /// Maximum distance of obstacle probes.
    pub fn look_ahead(&self) -> f32 {
        self.look_ahead
    }

    /// Whether agents move on the ground only, i.e. whether vertical
    /// component of steering is ignored and agents are kept at ground
    /// height.
    pub fn ground_constrained(&self) -> bool {
        self.ground_constrained
    }

    /// Behavior weights of flock members without an explicit steering
    /// profile.
    pub fn weights(&self) -> &WeightsConf {
        &self.weights
    }
}

impl Default for SteeringConf {
    fn default() -> Self {
        Self {
            max_speed: 10.,
            max_force: 20.,
            separation_radius: 2.,
            look_ahead: 6.,
            ground_constrained: true,
            weights: WeightsConf::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeightsConf {
    seek: f32,
    separation: f32,
    cohesion: f32,
    alignment: f32,
    avoidance: f32,
}

impl WeightsConf {
    fn build(persisted: persisted::Weights, checks: &mut Checks) -> Self {
        let default = Self::default();
        let conf = Self {
            seek: persisted.seek.unwrap_or(default.seek),
            separation: persisted.separation.unwrap_or(default.separation),
            cohesion: persisted.cohesion.unwrap_or(default.cohesion),
            alignment: persisted.alignment.unwrap_or(default.alignment),
            avoidance: persisted.avoidance.unwrap_or(default.avoidance),
        };

        for (field, value) in [
            ("steering.weights.seek", conf.seek),
            ("steering.weights.separation", conf.separation),
            ("steering.weights.cohesion", conf.cohesion),
            ("steering.weights.alignment", conf.alignment),
            ("steering.weights.avoidance", conf.avoidance),
        ] {
            checks.finite(field, value);
            checks.ensure(
                field,
                value >= 0.,
                &format!("`{field}` must be greater than or equal to 0.0."),
            );
        }
        conf
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

impl Default for WeightsConf {
    fn default() -> Self {
        Self {
            seek: 1.,
            separation: 10.,
            cohesion: 1.8,
            alignment: 1.8,
            avoidance: 3.,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KinematicsConf {
    drag: f32,
    arrival_drag: f32,
}

impl KinematicsConf {
    fn build(persisted: persisted::Kinematics, checks: &mut Checks) -> Self {
        let default = Self::default();
        let conf = Self {
            drag: persisted.drag.unwrap_or(default.drag),
            arrival_drag: persisted.arrival_drag.unwrap_or(default.arrival_drag),
        };

        checks.finite("kinematics.drag", conf.drag);
        checks.ensure(
            "kinematics.drag",
            conf.drag >= 0.,
            "`kinematics.drag` must be greater than or equal to 0.0.",
        );
        checks.ensure(
            "kinematics.drag",
            conf.drag < 1.,
            "`kinematics.drag` must be smaller than 1.0.",
        );
        checks.finite("kinematics.arrival_drag", conf.arrival_drag);
        checks.ensure(
            "kinematics.arrival_drag",
            conf.arrival_drag >= 0.,
            "`kinematics.arrival_drag` must be greater than or equal to 0.0.",
        );
        conf
    }

    /// Fraction of velocity lost every tick.
    pub fn drag(&self) -> f32 {
        self.drag
    }

    /// Agents which are not pathing are slowed by a force equal to `velocity
    /// * -arrival_drag`.
    pub fn arrival_drag(&self) -> f32 {
        self.arrival_drag
    }
}

impl Default for KinematicsConf {
    fn default() -> Self {
        Self {
            drag: 0.1,
            arrival_drag: 2.,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InfluenceConf {
    columns: u16,
    rows: u16,
}

impl InfluenceConf {
    fn build(persisted: persisted::Influence, checks: &mut Checks) -> Self {
        let default = Self::default();
        let conf = Self {
            columns: persisted.columns.unwrap_or(default.columns),
            rows: persisted.rows.unwrap_or(default.rows),
        };

        checks.ensure(
            "influence.columns",
            conf.columns >= 1,
            "`influence.columns` must be at least 1.",
        );
        checks.ensure(
            "influence.rows",
            conf.rows >= 1,
            "`influence.rows` must be at least 1.",
        );
        conf
    }

    /// Number of influence map cells along the X axis.
    pub fn columns(&self) -> u16 {
        self.columns
    }

    /// Number of influence map cells along the Z axis.
    pub fn rows(&self) -> u16 {
        self.rows
    }
}

impl Default for InfluenceConf {
    fn default() -> Self {
        Self {
            columns: 16,
            rows: 16,
        }
    }
}
