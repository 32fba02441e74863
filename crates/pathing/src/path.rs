//! Routes through the waypoint graph.

use glam::Vec3;
use pf_graph::NodeId;

/// A route through the waypoint graph defined by a sequence of nodes. Start
/// and goal nodes are included, start being the first.
///
/// Routes are immutable, consumers keep track of their progress along the
/// route on their own. This makes it possible to share a single route among
/// multiple agents.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    cost: f32,
    nodes: Vec<NodeId>,
    waypoints: Vec<Vec3>,
}

impl Route {
    /// Creates a route consisting of a single node.
    pub fn single(node: NodeId, position: Vec3) -> Self {
        Self::new(0., vec![node], vec![position])
    }

    /// Creates a new route.
    ///
    /// # Arguments
    ///
    /// * `cost` - total edge traversal cost of the route.
    ///
    /// * `nodes` - IDs of visited nodes ordered from start to goal.
    ///
    /// * `waypoints` - positions of the nodes in `nodes`.
    ///
    /// # Panics
    ///
    /// May panic if `nodes` is empty or if `nodes` and `waypoints` differ in
    /// length.
    pub fn new(cost: f32, nodes: Vec<NodeId>, waypoints: Vec<Vec3>) -> Self {
        debug_assert!(!nodes.is_empty());
        debug_assert_eq!(nodes.len(), waypoints.len());
        debug_assert!(cost >= 0.);
        Self {
            cost,
            nodes,
            waypoints,
        }
    }

    /// Returns total cost of all edges of the route.
    pub fn cost(&self) -> f32 {
        self.cost
    }

    /// Returns number of waypoints of the route.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false, routes have at least one waypoint.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns IDs of nodes of the route ordered from start to goal.
    pub fn nodes(&self) -> &[NodeId] {
        self.nodes.as_slice()
    }

    /// Returns complete sequence of the route way points ordered from start
    /// to goal.
    pub fn waypoints(&self) -> &[Vec3] {
        self.waypoints.as_slice()
    }

    /// Returns N-th waypoint or None if the route is shorter.
    pub fn waypoint(&self, index: usize) -> Option<Vec3> {
        self.waypoints.get(index).copied()
    }

    pub fn start(&self) -> NodeId {
        self.nodes[0]
    }

    pub fn goal(&self) -> NodeId {
        self.nodes[self.nodes.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route() {
        let route = Route::new(
            8.,
            vec![NodeId::new(3), NodeId::new(1), NodeId::new(2)],
            vec![
                Vec3::new(1., 0., 2.),
                Vec3::new(3., 0., 2.),
                Vec3::new(3., 0., 8.),
            ],
        );
        assert_eq!(route.cost(), 8.);
        assert_eq!(route.len(), 3);
        assert!(!route.is_empty());
        assert_eq!(route.start(), NodeId::new(3));
        assert_eq!(route.goal(), NodeId::new(2));
        assert_eq!(route.waypoint(1), Some(Vec3::new(3., 0., 2.)));
        assert_eq!(route.waypoint(3), None);

        let route = Route::single(NodeId::new(7), Vec3::ONE);
        assert_eq!(route.cost(), 0.);
        assert_eq!(route.start(), route.goal());
        assert_eq!(route.waypoints(), &[Vec3::ONE]);
    }
}
