//! Per-agent route following.

use std::sync::Arc;

use bevy::prelude::Component;
use glam::Vec3;

use crate::{
    finder::{PathFinder, Plan},
    path::Route,
    search::PathError,
};

/// State of an agent travelling along a route towards its final destination.
///
/// The route itself is never modified by the follower, multiple followers
/// (for example all members of a flock) can share a single route, each
/// progressing along it on its own.
#[derive(Component, Clone, Debug, Default)]
pub struct PathFollower {
    route: Option<Arc<Route>>,
    /// Index of the route waypoint following the current target.
    next: usize,
    target: Option<Vec3>,
    final_destination: Option<Vec3>,
}

impl PathFollower {
    /// Currently approached point: either a waypoint of the route or the
    /// final destination. None if the agent is not going anywhere.
    pub fn target(&self) -> Option<Vec3> {
        self.target
    }

    /// The originally requested destination. Note that this point does not
    /// necessarily lie on any graph node.
    pub fn final_destination(&self) -> Option<Vec3> {
        self.final_destination
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_deref()
    }

    /// Returns number of route waypoints not yet targeted.
    pub fn remaining(&self) -> usize {
        self.route
            .as_ref()
            .map_or(0, |route| route.len().saturating_sub(self.next))
    }

    /// Returns true if the agent is still approaching a route waypoint or
    /// its final destination.
    pub fn is_pathing(&self) -> bool {
        self.target.is_some()
    }

    /// Finds a route from `position` to `destination` and starts following
    /// it.
    ///
    /// The follower is not modified when the graph is empty. It is stopped
    /// when no route exists, the error is returned in such a case.
    pub fn set_destination(
        &mut self,
        finder: &PathFinder,
        position: Vec3,
        destination: Vec3,
    ) -> Result<FollowOutcome, PathError> {
        let plan = finder.plan(position, destination);
        self.apply(plan, destination)
    }

    /// Updates the follower according to an (already computed) movement
    /// plan.
    pub fn apply(
        &mut self,
        plan: Result<Plan, PathError>,
        destination: Vec3,
    ) -> Result<FollowOutcome, PathError> {
        match plan {
            Ok(Plan::Follow(route)) => {
                self.follow(route, destination);
                Ok(FollowOutcome::Following)
            }
            Ok(Plan::Direct) => {
                self.approach(destination);
                Ok(FollowOutcome::Direct)
            }
            Ok(Plan::Unchanged) => Ok(FollowOutcome::Ignored),
            Err(err) => {
                self.stop();
                Err(err)
            }
        }
    }

    /// Starts following a route. The first route waypoint becomes the
    /// current target.
    pub fn follow(&mut self, route: Arc<Route>, destination: Vec3) {
        self.target = route.waypoint(0);
        self.next = 1;
        self.route = Some(route);
        self.final_destination = Some(destination);
    }

    /// Approaches the destination directly, without any route.
    pub fn approach(&mut self, destination: Vec3) {
        self.route = None;
        self.next = 0;
        self.target = Some(destination);
        self.final_destination = Some(destination);
    }

    /// Stops any movement.
    pub fn stop(&mut self) {
        self.route = None;
        self.next = 0;
        self.target = None;
        self.final_destination = None;
    }

    /// Advances the target once the current one is reached. Does nothing
    /// when there is no route.
    ///
    /// The next route waypoint becomes the target once the agent is within
    /// `arrival_radius` of the current target. When the last route waypoint
    /// is reached, the route is dropped and the final destination becomes
    /// the target.
    ///
    /// Returns true if the target changed.
    pub fn tick(&mut self, position: Vec3, arrival_radius: f32) -> bool {
        let Some(route) = self.route.as_ref() else {
            return false;
        };
        let Some(target) = self.target else {
            return false;
        };

        if position.distance_squared(target) >= arrival_radius * arrival_radius {
            return false;
        }

        match route.waypoint(self.next) {
            Some(waypoint) => {
                self.target = Some(waypoint);
                self.next += 1;
            }
            None => {
                self.route = None;
                self.next = 0;
                self.target = self.final_destination;
            }
        }
        true
    }

    /// Finishes movement once the agent is within `arrival_radius` of its
    /// final destination and the whole route has been consumed.
    ///
    /// Returns true if the agent has just arrived.
    pub fn settle(&mut self, position: Vec3, arrival_radius: f32) -> bool {
        if self.route.is_some() {
            return false;
        }
        let Some(target) = self.target else {
            return false;
        };

        if position.distance_squared(target) < arrival_radius * arrival_radius {
            self.target = None;
            true
        } else {
            false
        }
    }
}

/// Result of a successful destination update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowOutcome {
    /// A route was found and is being followed.
    Following,
    /// The destination is approached directly.
    Direct,
    /// The request was ignored because there is no waypoint graph.
    Ignored,
}
