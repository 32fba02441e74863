use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Distance metric used both as path search heuristic and as edge traversal
/// cost.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Sum of absolute per-axis differences.
    #[default]
    Manhattan,
    /// Straight line distance.
    Euclidean,
}

impl DistanceMetric {
    pub fn distance(self, a: Vec3, b: Vec3) -> f32 {
        match self {
            Self::Manhattan => {
                let diff = (a - b).abs();
                diff.x + diff.y + diff.z
            }
            Self::Euclidean => a.distance(b),
        }
    }
}
