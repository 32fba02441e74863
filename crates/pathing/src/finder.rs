//! This module contains global shortest path finder over the waypoint graph.

use std::sync::Arc;

use bevy::prelude::{debug, info, Resource};
use glam::Vec3;
use pf_graph::{DistanceMetric, NodeId, WaypointGraph};

use crate::{
    path::Route,
    search::{find_path, PathError},
};

/// A struct used for path finding. The underlying graph is shared, thus
/// cloning the finder is cheap.
#[derive(Resource, Clone)]
pub struct PathFinder {
    graph: Arc<WaypointGraph>,
    metric: DistanceMetric,
}

impl PathFinder {
    /// Creates a new path finder.
    ///
    /// # Arguments
    ///
    /// * `graph` - an undirected waypoint graph, see
    ///   [`pf_graph::WaypointGraph::build`].
    ///
    /// * `metric` - distance metric used for edge costs, the search heuristic
    ///   and for snapping of positions to the nearest nodes.
    pub fn new(graph: WaypointGraph, metric: DistanceMetric) -> Self {
        debug_assert!(graph.is_symmetric());
        info!(
            "Creating path finder over a graph of {} nodes with {:?} metric",
            graph.len(),
            metric
        );
        Self {
            graph: Arc::new(graph),
            metric,
        }
    }

    pub fn graph(&self) -> &WaypointGraph {
        self.graph.as_ref()
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn set_metric(&mut self, metric: DistanceMetric) {
        self.metric = metric;
    }

    /// Returns the graph node closest to `point`.
    pub fn nearest(&self, point: Vec3) -> Option<NodeId> {
        self.graph.nearest(point, self.metric)
    }

    /// Returns the cheapest route between two graph nodes.
    pub fn find_path(&self, start: NodeId, goal: NodeId) -> Result<Route, PathError> {
        find_path(self.graph.as_ref(), start, goal, self.metric)
    }

    /// Returns the cheapest route between the nodes nearest to `from` and
    /// `to` respectively.
    pub fn find_path_between(&self, from: Vec3, to: Vec3) -> Result<Route, PathError> {
        let start = self.nearest(from).ok_or(PathError::EmptyGraph)?;
        let goal = self.nearest(to).ok_or(PathError::EmptyGraph)?;
        self.find_path(start, goal)
    }

    /// Plans movement of an agent from `from` to the (off-graph) destination
    /// `to`.
    ///
    /// Nothing is planned on an empty graph. When both points snap to the
    /// same node (the graph is too coarse), there is no route to follow and
    /// the destination is to be approached directly.
    pub fn plan(&self, from: Vec3, to: Vec3) -> Result<Plan, PathError> {
        let Some(start) = self.nearest(from) else {
            debug!("Ignoring path request to {:?}: empty waypoint graph", to);
            return Ok(Plan::Unchanged);
        };
        let Some(goal) = self.nearest(to) else {
            return Ok(Plan::Unchanged);
        };

        if start == goal {
            debug!("Approaching {:?} directly from node {}", to, start);
            return Ok(Plan::Direct);
        }

        match self.find_path(start, goal) {
            Ok(route) => Ok(Plan::Follow(Arc::new(route))),
            Err(err) => {
                debug!("No route from {:?} to {:?}: {}", from, to, err);
                Err(err)
            }
        }
    }
}

/// Outcome of movement planning.
#[derive(Clone, Debug, PartialEq)]
pub enum Plan {
    /// The route is to be followed and the destination approached afterwards.
    Follow(Arc<Route>),
    /// The destination is to be approached directly, without a route.
    Direct,
    /// Nothing could be planned, current movement is to be kept.
    Unchanged,
}
