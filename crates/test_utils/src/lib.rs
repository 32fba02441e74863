//! Deterministic waypoint graph fixtures for tests and benchmarks.

use glam::Vec3;
use pf_graph::{NodeId, WaypointGraph};

/// Creates a graph of `count` nodes placed along the X axis `spacing` apart,
/// each node connected to its predecessor and successor.
pub fn line_graph(count: usize, spacing: f32) -> WaypointGraph {
    let mut graph = WaypointGraph::new();
    let mut previous: Option<NodeId> = None;
    for i in 0..count {
        let id = graph.new_node(Vec3::new(i as f32 * spacing, 0., 0.));
        if let Some(previous) = previous {
            graph.connect(previous, id).unwrap();
        }
        previous = Some(id);
    }
    graph
}

/// Creates a rectangular grid graph in the XZ plane, see
/// [`WaypointGraph::grid`].
pub fn grid_graph(columns: usize, rows: usize, spacing: f32) -> WaypointGraph {
    WaypointGraph::grid(columns, rows, spacing).unwrap()
}

/// Creates a random graph. The result is guaranteed to be the same across
/// calls with the same arguments.
///
/// # Arguments
///
/// * `seed` - random generator seed.
///
/// * `nodes` - number of nodes in the graph.
///
/// * `edge_probability` - probability of each (unordered) pair of nodes being
///   connected. The graph is not guaranteed to be connected.
///
/// * `extent` - node coordinates lie between `-extent` and `+extent`.
pub fn random_graph(seed: u64, nodes: usize, edge_probability: f32, extent: f32) -> WaypointGraph {
    let rng = fastrand::Rng::with_seed(seed);

    let mut graph = WaypointGraph::new();
    let ids: Vec<NodeId> = random_points(&rng, nodes, extent)
        .into_iter()
        .map(|point| graph.new_node(point))
        .collect();

    for (i, &a) in ids.iter().enumerate() {
        for &b in &ids[i + 1..] {
            if rng.f32() < edge_probability {
                graph.connect(a, b).unwrap();
            }
        }
    }
    graph
}

/// Returns `count` points with all coordinates between `-extent` and
/// `+extent`.
pub fn random_points(rng: &fastrand::Rng, count: usize, extent: f32) -> Vec<Vec3> {
    (0..count)
        .map(|_| {
            extent * 2. * (Vec3::new(rng.f32(), rng.f32(), rng.f32()) - 0.5)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_graph() {
        let graph = grid_graph(3, 2, 5.);
        assert_eq!(graph.len(), 6);
        assert_eq!(graph.position(NodeId::new(4)), Vec3::new(5., 0., 5.));
        assert_eq!(graph.neighbours(NodeId::new(0)).len(), 2);
        assert_eq!(graph.neighbours(NodeId::new(1)).len(), 3);
        assert!(graph.is_symmetric());
    }

    #[test]
    fn test_random_graph() {
        let a = random_graph(3, 20, 0.2, 10.);
        let b = random_graph(3, 20, 0.2, 10.);
        assert_eq!(a.len(), 20);
        for id in a.ids() {
            assert_eq!(a.position(id), b.position(id));
            assert_eq!(a.neighbours(id), b.neighbours(id));
            assert!(a.position(id).abs().max_element() <= 10.);
        }
    }
}
