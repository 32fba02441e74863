//! This module contains the waypoint graph used in shortest path search.

use std::fmt;

use glam::Vec3;
use pf_core::query::HeightQuery;
use thiserror::Error;
use tinyvec::TinyVec;
use tracing::{debug, trace};

use crate::metric::DistanceMetric;

/// Undirected graph of waypoints.
///
/// Edges may be authored in one direction only (see
/// [`Self::add_neighbour`]), the graph is made undirected by
/// [`Self::repair`]. Graphs returned by [`Self::build`] are always
/// undirected: node A is a neighbour of node B if and only if B is a
/// neighbour of A.
///
/// Nodes without any neighbours are allowed, they are simply unreachable.
#[derive(Clone, Default)]
pub struct WaypointGraph {
    nodes: Vec<GraphNode>,
}

impl WaypointGraph {
    /// Returns a new empty waypoint graph.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Creates a new undirected graph.
    ///
    /// # Arguments
    ///
    /// * `nodes` - positions of the graph nodes. N-th position corresponds to
    ///   node with ID N.
    ///
    /// * `adjacency` - N-th item lists authored neighbours of N-th node. The
    ///   authoring may be asymmetric, missing reverse edges are added.
    pub fn build(nodes: Vec<Vec3>, adjacency: Vec<Vec<NodeId>>) -> Result<Self, GraphError> {
        if nodes.len() != adjacency.len() {
            return Err(GraphError::AdjacencyLength {
                nodes: nodes.len(),
                adjacency: adjacency.len(),
            });
        }

        let mut graph = Self::new();
        for position in nodes {
            graph.new_node(position);
        }
        for (index, neighbours) in adjacency.into_iter().enumerate() {
            let id = NodeId::from_index(index);
            for neighbour in neighbours {
                graph.add_neighbour(id, neighbour)?;
            }
        }

        let added = graph.repair();
        debug!(
            "Waypoint graph with {} nodes built, {} reverse edges added",
            graph.len(),
            added
        );
        Ok(graph)
    }

    /// Creates a rectangular grid graph in the XZ plane. Each node is
    /// connected to its 4-neighbourhood. Node at column `c` and row `r` has
    /// ID `r * columns + c` and is placed at `(c * spacing, 0, r * spacing)`.
    pub fn grid(columns: usize, rows: usize, spacing: f32) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for row in 0..rows {
            for column in 0..columns {
                graph.new_node(Vec3::new(
                    column as f32 * spacing,
                    0.,
                    row as f32 * spacing,
                ));
            }
        }

        let id = |column: usize, row: usize| NodeId::from_index(row * columns + column);
        for row in 0..rows {
            for column in 0..columns {
                if column + 1 < columns {
                    graph.connect(id(column, row), id(column + 1, row))?;
                }
                if row + 1 < rows {
                    graph.connect(id(column, row), id(column, row + 1))?;
                }
            }
        }
        Ok(graph)
    }

    /// Returns number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if a node with the ID exists in the graph.
    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// Iterates over IDs of all nodes in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId::from_index)
    }

    /// Pushes a new node without any neighbours to the graph and returns its
    /// ID.
    ///
    /// # Panics
    ///
    /// Panics if the graph already holds `u32::MAX` nodes.
    pub fn new_node(&mut self, position: Vec3) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(GraphNode::new(position));
        id
    }

    /// Authors a one-way edge `from` -> `to`. Already existing edges and self
    /// loops are ignored.
    ///
    /// Note that the graph is not guaranteed to be undirected until
    /// [`Self::repair`] is called.
    pub fn add_neighbour(&mut self, from: NodeId, to: NodeId) -> Result<(), GraphError> {
        self.check(from)?;
        self.check(to)?;

        if from == to {
            trace!("Ignoring self loop of {}", from);
            return Ok(());
        }

        self.nodes[from.index()].add_neighbour(to);
        Ok(())
    }

    /// Authors an edge in both directions.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> Result<(), GraphError> {
        self.add_neighbour(a, b)?;
        self.add_neighbour(b, a)
    }

    /// Makes the graph undirected: for each node A listing node B as its
    /// neighbour, A is added to neighbours of B if not already present.
    ///
    /// The operation is idempotent and never duplicates neighbours. Returns
    /// number of added edges.
    pub fn repair(&mut self) -> usize {
        let mut missing = Vec::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let id = NodeId::from_index(index);
            for &neighbour in node.neighbours() {
                if !self.nodes[neighbour.index()].has_neighbour(id) {
                    missing.push((neighbour, id));
                }
            }
        }

        for &(node, neighbour) in missing.iter() {
            self.nodes[node.index()].add_neighbour(neighbour);
        }
        missing.len()
    }

    /// Returns true if every edge of the graph is present in both
    /// directions.
    pub fn is_symmetric(&self) -> bool {
        self.nodes.iter().enumerate().all(|(index, node)| {
            let id = NodeId::from_index(index);
            node.neighbours()
                .iter()
                .all(|neighbour| self.nodes[neighbour.index()].has_neighbour(id))
        })
    }

    /// Returns world position of a node.
    ///
    /// # Panics
    ///
    /// Panics if the node does not exist.
    pub fn position(&self, id: NodeId) -> Vec3 {
        self.nodes[id.index()].position()
    }

    /// Returns all neighbours of a node.
    ///
    /// # Panics
    ///
    /// Panics if the node does not exist.
    pub fn neighbours(&self, id: NodeId) -> &[NodeId] {
        self.nodes[id.index()].neighbours()
    }

    /// Returns the node closest to `point` or None if the graph is empty.
    /// Ties are resolved in favour of the node with smaller ID.
    pub fn nearest(&self, point: Vec3, metric: DistanceMetric) -> Option<NodeId> {
        let mut best: Option<(NodeId, f32)> = None;
        for (index, node) in self.nodes.iter().enumerate() {
            let distance = metric.distance(node.position(), point);
            if best.map_or(true, |(_, best_distance)| distance < best_distance) {
                best = Some((NodeId::from_index(index), distance));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Moves all nodes vertically to the ground level. Horizontal position
    /// of the nodes is not changed.
    pub fn place_on_ground<Q: HeightQuery>(&mut self, ground: &Q) {
        for node in self.nodes.iter_mut() {
            let position = node.position();
            node.set_position(Vec3::new(
                position.x,
                ground.sample_ground_height(position.x, position.z),
                position.z,
            ));
        }
    }

    fn check(&self, id: NodeId) -> Result<(), GraphError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(GraphError::UnknownNode(id))
        }
    }
}

/// A node in the waypoint graph.
#[derive(Clone)]
struct GraphNode {
    position: Vec3,
    /// Directly reachable nodes in order of authoring.
    neighbours: TinyVec<[NodeId; 4]>,
}

impl GraphNode {
    fn new(position: Vec3) -> Self {
        Self {
            position,
            neighbours: TinyVec::new(),
        }
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn neighbours(&self) -> &[NodeId] {
        self.neighbours.as_slice()
    }

    fn has_neighbour(&self, id: NodeId) -> bool {
        self.neighbours.contains(&id)
    }

    /// Adds a neighbor to the node unless it is already present.
    fn add_neighbour(&mut self, id: NodeId) {
        if !self.has_neighbour(id) {
            self.neighbours.push(id);
        }
    }
}

/// Identity of a node in [`WaypointGraph`].
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// # Panics
    ///
    /// Panics if `index` does not fit to `u32`.
    fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).expect("Waypoint graph node count overflow"))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GraphError {
    #[error("node {0} does not exist in the waypoint graph")]
    UnknownNode(NodeId),
    #[error("{adjacency} adjacency lists given for {nodes} nodes")]
    AdjacencyLength { nodes: usize, adjacency: usize },
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn ids(ids: &[u32]) -> Vec<NodeId> {
        ids.iter().map(|&id| NodeId::new(id)).collect()
    }

    #[test]
    fn test_build_repairs_one_way_edges() {
        let graph = WaypointGraph::build(
            vec![
                Vec3::new(0., 0., 0.),
                Vec3::new(1., 0., 0.),
                Vec3::new(2., 0., 0.),
                Vec3::new(2., 0., 1.),
            ],
            vec![ids(&[1, 2]), ids(&[]), ids(&[1]), ids(&[])],
        )
        .unwrap();

        assert!(graph.is_symmetric());
        assert_eq!(graph.neighbours(NodeId::new(0)), ids(&[1, 2]).as_slice());
        assert_eq!(graph.neighbours(NodeId::new(1)), ids(&[0, 2]).as_slice());
        assert_eq!(graph.neighbours(NodeId::new(2)), ids(&[1, 0]).as_slice());
        assert_eq!(graph.neighbours(NodeId::new(3)), &[] as &[NodeId]);

        for a in graph.ids() {
            for b in graph.ids() {
                assert_eq!(
                    graph.neighbours(a).contains(&b),
                    graph.neighbours(b).contains(&a)
                );
            }
        }
    }

    #[test]
    fn test_build_random_one_way() {
        for seed in 0..16 {
            let rng = fastrand::Rng::with_seed(seed);
            let count = rng.usize(1..40);
            let nodes: Vec<Vec3> = (0..count)
                .map(|i| Vec3::new(i as f32, 0., rng.f32()))
                .collect();
            // One-way edges only, duplicates and self loops included.
            let adjacency: Vec<Vec<NodeId>> = (0..count)
                .map(|_| {
                    (0..rng.usize(0..6))
                        .map(|_| NodeId::new(rng.u32(0..count as u32)))
                        .collect()
                })
                .collect();

            let mut graph = WaypointGraph::build(nodes, adjacency.clone()).unwrap();
            assert_eq!(graph.len(), count);

            for a in graph.ids() {
                let neighbours = graph.neighbours(a);
                assert!(!neighbours.contains(&a), "seed {seed}: self loop at {a}");
                for (i, b) in neighbours.iter().enumerate() {
                    assert!(!neighbours[i + 1..].contains(b), "seed {seed}: duplicate");
                }
                for b in graph.ids() {
                    assert_eq!(
                        graph.neighbours(a).contains(&b),
                        graph.neighbours(b).contains(&a),
                        "seed {seed}: {a} - {b}"
                    );
                }
                for &b in adjacency[a.index()].iter().filter(|&&b| b != a) {
                    assert!(graph.neighbours(a).contains(&b));
                }
            }
            assert_eq!(graph.repair(), 0);
        }
    }

    #[test]
    fn test_grid() {
        let graph = WaypointGraph::grid(3, 2, 5.).unwrap();
        assert_eq!(graph.len(), 6);
        assert_eq!(graph.position(NodeId::new(4)), Vec3::new(5., 0., 5.));
        assert_eq!(graph.neighbours(NodeId::new(0)), ids(&[1, 3]).as_slice());
        assert_eq!(graph.neighbours(NodeId::new(4)), ids(&[1, 3, 5]).as_slice());
        assert!(graph.is_symmetric());

        assert!(WaypointGraph::grid(0, 4, 1.).unwrap().is_empty());
        assert_eq!(WaypointGraph::grid(1, 1, 1.).unwrap().len(), 1);
    }

    #[test]
    fn test_repair_idempotent() {
        let mut graph = WaypointGraph::new();
        let a = graph.new_node(Vec3::ZERO);
        let b = graph.new_node(Vec3::X);
        let c = graph.new_node(Vec3::Z);
        graph.add_neighbour(a, b).unwrap();
        graph.add_neighbour(a, b).unwrap();
        graph.add_neighbour(c, a).unwrap();
        graph.add_neighbour(a, a).unwrap();
        assert!(!graph.is_symmetric());

        assert_eq!(graph.repair(), 2);
        assert_eq!(graph.repair(), 0);
        assert!(graph.is_symmetric());
        assert_eq!(graph.neighbours(a), &[b, c]);
        assert_eq!(graph.neighbours(b), &[a]);
        assert_eq!(graph.neighbours(c), &[a]);
    }

    #[test]
    fn test_many_neighbours() {
        let mut graph = WaypointGraph::new();
        let hub = graph.new_node(Vec3::ZERO);
        let spokes: Vec<NodeId> = (0..10)
            .map(|i| graph.new_node(Vec3::new(i as f32, 0., 1.)))
            .collect();
        for &spoke in spokes.iter() {
            graph.add_neighbour(spoke, hub).unwrap();
        }
        graph.repair();
        assert_eq!(graph.neighbours(hub), spokes.as_slice());
    }

    #[test]
    fn test_build_errors() {
        assert_eq!(
            WaypointGraph::build(vec![Vec3::ZERO], vec![ids(&[3])]).err(),
            Some(GraphError::UnknownNode(NodeId::new(3)))
        );
        assert_eq!(
            WaypointGraph::build(vec![Vec3::ZERO, Vec3::X], vec![ids(&[1])]).err(),
            Some(GraphError::AdjacencyLength {
                nodes: 2,
                adjacency: 1
            })
        );
    }

    #[test]
    fn test_isolated_node() {
        let graph = WaypointGraph::build(vec![Vec3::ZERO], vec![ids(&[])]).unwrap();
        assert_eq!(graph.len(), 1);
        assert!(graph.is_symmetric());
        assert!(graph.neighbours(NodeId::new(0)).is_empty());
    }

    #[test]
    fn test_nearest() {
        let graph = WaypointGraph::build(
            vec![
                Vec3::new(0., 0., 0.),
                Vec3::new(10., 0., 0.),
                Vec3::new(10., 0., 10.),
            ],
            vec![ids(&[1]), ids(&[2]), ids(&[])],
        )
        .unwrap();

        assert_eq!(
            graph.nearest(Vec3::new(8., 0., 1.), DistanceMetric::Manhattan),
            Some(NodeId::new(1))
        );
        assert_eq!(
            graph.nearest(Vec3::new(9., 0., 9.), DistanceMetric::Euclidean),
            Some(NodeId::new(2))
        );
        // Equally distant from nodes 0 and 1.
        assert_eq!(
            graph.nearest(Vec3::new(5., 0., 0.), DistanceMetric::Manhattan),
            Some(NodeId::new(0))
        );
        assert_eq!(
            WaypointGraph::new().nearest(Vec3::ZERO, DistanceMetric::Manhattan),
            None
        );
    }

    #[test]
    fn test_place_on_ground() {
        let mut graph = WaypointGraph::new();
        let a = graph.new_node(Vec3::new(2., 100., 4.));
        let b = graph.new_node(Vec3::new(-1., -3., 0.5));
        graph.place_on_ground(&|x: f32, z: f32| x + 2. * z);

        assert_abs_diff_eq!(graph.position(a).y, 10.);
        assert_eq!(graph.position(a).x, 2.);
        assert_eq!(graph.position(a).z, 4.);
        assert_abs_diff_eq!(graph.position(b).y, 0.);
    }
}
