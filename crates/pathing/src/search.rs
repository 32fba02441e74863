//! This module contains waypoint graph based path finding algorithm.

use std::cmp::Reverse;

use ahash::AHashSet;
use bevy::utils::FloatOrd;
use pf_graph::{DistanceMetric, NodeId, WaypointGraph};
use priority_queue::PriorityQueue;
use thiserror::Error;
use tracing::{debug, error};

use crate::path::Route;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("no route exists between the nodes")]
    NotFound,
    #[error("path search exceeded iteration ceiling of {ceiling} iterations, the graph is likely malformed")]
    SearchCeilingExceeded { ceiling: usize },
    #[error("the waypoint graph has no nodes")]
    EmptyGraph,
    #[error("node {0} does not exist in the waypoint graph")]
    UnknownNode(NodeId),
}

/// Finds and returns the cheapest route between two nodes with A* algorithm.
///
/// `metric` is used as both the heuristic and the edge traversal cost.
///
/// The search keeps all its state locally, thus any number of searches might
/// run concurrently over a single graph.
pub fn find_path(
    graph: &WaypointGraph,
    start: NodeId,
    goal: NodeId,
    metric: DistanceMetric,
) -> Result<Route, PathError> {
    search(graph, start, goal, metric, graph.len())
}

/// See [`find_path`].
///
/// # Arguments
///
/// * `ceiling` - maximum number of expanded nodes. Each node is expanded at
///   most once, therefore node count of the graph is never exceeded on a
///   correctly maintained graph.
fn search(
    graph: &WaypointGraph,
    start: NodeId,
    goal: NodeId,
    metric: DistanceMetric,
    ceiling: usize,
) -> Result<Route, PathError> {
    for id in [start, goal] {
        if !graph.contains(id) {
            return Err(PathError::UnknownNode(id));
        }
    }

    let goal_position = graph.position(goal);
    let mut costs = CostTable::new(graph.len());
    let mut open_set = OpenSet::new();
    let mut closed = AHashSet::new();

    costs.update(
        start,
        NodeCost::new(
            0.,
            metric.distance(graph.position(start), goal_position),
            None,
        ),
    );
    open_set.push(start, costs.get(start).total());

    let mut iterations = 0;
    while let Some(current) = open_set.pop() {
        iterations += 1;
        if iterations > ceiling {
            return Err(ceiling_exceeded(ceiling));
        }

        if current == goal {
            return reconstruct(graph, &costs, start, goal, ceiling);
        }

        closed.insert(current);
        let position = graph.position(current);
        let cost_so_far = costs.get(current).from_start();

        for &neighbour in graph.neighbours(current) {
            if closed.contains(&neighbour) {
                continue;
            }

            let neighbour_position = graph.position(neighbour);
            let from_start = cost_so_far + metric.distance(position, neighbour_position);
            let to_goal = metric.distance(neighbour_position, goal_position);
            let candidate = NodeCost::new(from_start, to_goal, Some(current));

            if !open_set.contains(neighbour) || candidate.total() < costs.get(neighbour).total() {
                costs.update(neighbour, candidate);
                open_set.push(neighbour, candidate.total());
            }
        }
    }

    Err(PathError::NotFound)
}

/// Walks predecessor links from goal back to start.
fn reconstruct(
    graph: &WaypointGraph,
    costs: &CostTable,
    start: NodeId,
    goal: NodeId,
    ceiling: usize,
) -> Result<Route, PathError> {
    let mut nodes = vec![goal];
    let mut current = goal;
    while current != start {
        current = match costs.get(current).previous() {
            Some(previous) => previous,
            None => return Err(PathError::NotFound),
        };
        nodes.push(current);

        if nodes.len() > ceiling {
            return Err(ceiling_exceeded(ceiling));
        }
    }
    nodes.reverse();

    let waypoints = nodes.iter().map(|&id| graph.position(id)).collect();
    let route = Route::new(costs.get(goal).from_start(), nodes, waypoints);
    debug!(
        "Route of cost {} with {} waypoints from {} to {} found",
        route.cost(),
        route.len(),
        start,
        goal
    );
    Ok(route)
}

fn ceiling_exceeded(ceiling: usize) -> PathError {
    let err = PathError::SearchCeilingExceeded { ceiling };
    error!("{}", err);
    err
}

/// Per-search cost bookkeeping of all graph nodes.
struct CostTable {
    costs: Vec<NodeCost>,
}

impl CostTable {
    /// Creates a new table with all nodes unvisited.
    fn new(len: usize) -> Self {
        Self {
            costs: vec![NodeCost::UNVISITED; len],
        }
    }

    fn get(&self, id: NodeId) -> NodeCost {
        self.costs[id.index()]
    }

    fn update(&mut self, id: NodeId, cost: NodeCost) {
        self.costs[id.index()] = cost;
    }
}

#[derive(Clone, Copy)]
struct NodeCost {
    /// Cost of the cheapest known route from the start to the node.
    from_start: f32,
    /// Heuristic cost from the node to the goal.
    to_goal: f32,
    previous: Option<NodeId>,
}

impl NodeCost {
    const UNVISITED: Self = Self {
        from_start: f32::INFINITY,
        to_goal: f32::INFINITY,
        previous: None,
    };

    fn new(from_start: f32, to_goal: f32, previous: Option<NodeId>) -> Self {
        Self {
            from_start,
            to_goal,
            previous,
        }
    }

    fn from_start(&self) -> f32 {
        self.from_start
    }

    fn previous(&self) -> Option<NodeId> {
        self.previous
    }

    /// Returns estimated total cost of a route through the node. Nodes with
    /// any unset cost component have infinite total cost.
    fn total(&self) -> f32 {
        if self.from_start.is_infinite() || self.to_goal.is_infinite() {
            f32::INFINITY
        } else {
            self.from_start + self.to_goal
        }
    }
}

/// A priority queue of nodes to be expanded. Each node is present at most
/// once, nodes with equal cost are popped in the order of their IDs.
struct OpenSet {
    queue: PriorityQueue<NodeId, Reverse<(FloatOrd, NodeId)>>,
}

impl OpenSet {
    fn new() -> Self {
        Self {
            queue: PriorityQueue::new(),
        }
    }

    fn contains(&self, id: NodeId) -> bool {
        self.queue.get_priority(&id).is_some()
    }

    fn pop(&mut self) -> Option<NodeId> {
        self.queue.pop().map(|(id, _)| id)
    }

    /// Inserts the node or updates its cost if it is already present.
    fn push(&mut self, id: NodeId, total: f32) {
        self.queue.push(id, Reverse((FloatOrd(total), id)));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use glam::Vec3;
    use ntest::timeout;
    use pf_test_utils::{line_graph, random_graph};

    use super::*;

    fn id(id: u32) -> NodeId {
        NodeId::new(id)
    }

    fn ids(ids: &[u32]) -> Vec<NodeId> {
        ids.iter().map(|&i| id(i)).collect()
    }

    #[test]
    fn test_open_set() {
        let mut set = OpenSet::new();
        set.push(id(1), 2.);
        set.push(id(2), 1.1);
        set.push(id(3), 4.);
        set.push(id(4), 2.);
        set.push(id(3), 0.5);
        assert!(set.contains(id(3)));
        assert!(!set.contains(id(5)));
        assert_eq!(set.pop(), Some(id(3)));
        assert_eq!(set.pop(), Some(id(2)));
        assert_eq!(set.pop(), Some(id(1)));
        assert_eq!(set.pop(), Some(id(4)));
        assert_eq!(set.pop(), None);
    }

    #[test]
    fn test_node_cost() {
        assert_eq!(NodeCost::UNVISITED.total(), f32::INFINITY);
        assert_eq!(NodeCost::new(0., f32::INFINITY, None).total(), f32::INFINITY);
        assert_eq!(NodeCost::new(1.5, 2., Some(id(1))).total(), 3.5);
    }

    #[test]
    #[timeout(1000)]
    fn test_line() {
        let graph = line_graph(4, 1.);
        let route = find_path(&graph, id(0), id(3), DistanceMetric::Manhattan).unwrap();
        assert_eq!(route.nodes(), ids(&[0, 1, 2, 3]).as_slice());
        assert_eq!(route.cost(), 3.);
        assert_eq!(route.waypoints()[0], graph.position(id(0)));
        assert_eq!(route.waypoints()[3], graph.position(id(3)));

        let route = find_path(&graph, id(0), id(0), DistanceMetric::Manhattan).unwrap();
        assert_eq!(route.nodes(), &[id(0)]);
        assert_eq!(route.cost(), 0.);
    }

    #[test]
    #[timeout(1000)]
    fn test_disconnected() {
        let graph = WaypointGraph::build(
            vec![
                Vec3::new(0., 0., 0.),
                Vec3::new(1., 0., 0.),
                Vec3::new(2., 0., 0.),
                Vec3::new(3., 0., 0.),
            ],
            vec![ids(&[1]), ids(&[2]), ids(&[]), ids(&[])],
        )
        .unwrap();

        assert_eq!(
            find_path(&graph, id(0), id(3), DistanceMetric::Manhattan),
            Err(PathError::NotFound)
        );
        assert_eq!(
            find_path(&graph, id(3), id(0), DistanceMetric::Manhattan),
            Err(PathError::NotFound)
        );
        assert!(find_path(&graph, id(0), id(2), DistanceMetric::Manhattan).is_ok());
    }

    #[test]
    fn test_unknown_node() {
        let graph = line_graph(2, 1.);
        assert_eq!(
            find_path(&graph, id(0), id(2), DistanceMetric::Manhattan),
            Err(PathError::UnknownNode(id(2)))
        );
    }

    #[test]
    fn test_ceiling() {
        let graph = line_graph(4, 1.);
        assert_eq!(
            search(&graph, id(0), id(3), DistanceMetric::Manhattan, 2),
            Err(PathError::SearchCeilingExceeded { ceiling: 2 })
        );
        assert!(search(&graph, id(0), id(3), DistanceMetric::Manhattan, 4).is_ok());
    }

    #[test]
    fn test_prefers_cheaper_detour() {
        // Both 0 -- 3 -- 1 and 0 -- 2 -- 1 have two edges, the former
        // climbs over node 3 placed high above the others.
        let graph = WaypointGraph::build(
            vec![
                Vec3::new(0., 0., 0.),
                Vec3::new(4., 0., 0.),
                Vec3::new(2., 0., 0.),
                Vec3::new(2., 10., 0.),
            ],
            vec![ids(&[3, 2]), ids(&[3]), ids(&[1]), ids(&[])],
        )
        .unwrap();
        let route = find_path(&graph, id(0), id(1), DistanceMetric::Manhattan).unwrap();
        assert_eq!(route.nodes(), ids(&[0, 2, 1]).as_slice());
        assert_eq!(route.cost(), 4.);
    }

    #[test]
    fn test_tie_break() {
        let graph = WaypointGraph::build(
            vec![
                Vec3::new(0., 0., 0.),
                Vec3::new(1., 0., 0.),
                Vec3::new(0., 0., 1.),
                Vec3::new(1., 0., 1.),
            ],
            vec![ids(&[2, 1]), ids(&[3]), ids(&[3]), ids(&[])],
        )
        .unwrap();
        let route = find_path(&graph, id(0), id(3), DistanceMetric::Manhattan).unwrap();
        assert_eq!(route.nodes(), ids(&[0, 1, 3]).as_slice());
    }

    #[test]
    #[timeout(5000)]
    fn test_repeated_search() {
        let graph = random_graph(7, 40, 0.15, 50.);
        for (start, goal) in [(0, 39), (5, 17), (22, 3)] {
            let first = find_path(&graph, id(start), id(goal), DistanceMetric::Manhattan);
            let second = find_path(&graph, id(start), id(goal), DistanceMetric::Manhattan);
            assert_eq!(first, second);
        }
    }

    #[test]
    #[timeout(10000)]
    fn test_optimality() {
        for seed in 0..40 {
            let graph = random_graph(seed, 8, 0.35, 20.);
            for metric in [DistanceMetric::Manhattan, DistanceMetric::Euclidean] {
                for start in graph.ids() {
                    for goal in graph.ids() {
                        let expected = cheapest(&graph, start, goal, metric);
                        match find_path(&graph, start, goal, metric) {
                            Ok(route) => {
                                assert_valid(&graph, &route, start, goal, metric);
                                assert_abs_diff_eq!(
                                    route.cost(),
                                    expected.unwrap(),
                                    epsilon = 0.001
                                );
                            }
                            Err(err) => {
                                assert_eq!(err, PathError::NotFound);
                                assert!(expected.is_none());
                            }
                        }
                    }
                }
            }
        }
    }

    fn assert_valid(
        graph: &WaypointGraph,
        route: &Route,
        start: NodeId,
        goal: NodeId,
        metric: DistanceMetric,
    ) {
        assert_eq!(route.start(), start);
        assert_eq!(route.goal(), goal);
        assert_eq!(route.waypoints()[0], graph.position(start));
        assert_eq!(route.waypoints()[route.len() - 1], graph.position(goal));

        let mut cost = 0.;
        for pair in route.nodes().windows(2) {
            assert!(graph.neighbours(pair[0]).contains(&pair[1]));
            cost += metric.distance(graph.position(pair[0]), graph.position(pair[1]));
        }
        assert_abs_diff_eq!(cost, route.cost(), epsilon = 0.001);
    }

    /// Returns the cost of the cheapest route by exhaustive enumeration of
    /// all simple routes.
    fn cheapest(
        graph: &WaypointGraph,
        start: NodeId,
        goal: NodeId,
        metric: DistanceMetric,
    ) -> Option<f32> {
        fn explore(
            graph: &WaypointGraph,
            current: NodeId,
            goal: NodeId,
            metric: DistanceMetric,
            visited: &mut Vec<NodeId>,
            cost: f32,
            best: &mut Option<f32>,
        ) {
            if current == goal {
                if best.map_or(true, |best| cost < best) {
                    *best = Some(cost);
                }
                return;
            }

            for &next in graph.neighbours(current) {
                if visited.contains(&next) {
                    continue;
                }
                visited.push(next);
                let step = metric.distance(graph.position(current), graph.position(next));
                explore(graph, next, goal, metric, visited, cost + step, best);
                visited.pop();
            }
        }

        let mut best = None;
        explore(graph, start, goal, metric, &mut vec![start], 0., &mut best);
        best
    }
}
