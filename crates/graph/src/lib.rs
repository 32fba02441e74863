//! This library implements an undirected graph of waypoints placed in the
//! 3D world. The graph is the topology over which path search runs.

mod graph;
mod metric;

pub use graph::{GraphError, NodeId, WaypointGraph};
pub use metric::DistanceMetric;
