//! Size-bounded partition by proximity.
//!
//! Splits a point set into groups of at most `max_size`, each made of points
//! near one another. Used to break up clusters that are too large and too far
//! to drive in one shift, instead of discarding them.
//!
//! # Algorithm
//!
//! Greedy outside-in sweep:
//!
//! 1. Take the remaining point farthest from the set's centroid.
//! 2. Group it with its nearest remaining points, up to `max_size`.
//! 3. Remove the group and repeat until nothing is left.
//!
//! Starting from the periphery keeps outlying points from being left over as
//! stragglers once the dense middle has been consumed. Cost is
//! O(n² log n / max_size), fine for the route-sized sets it sees.

use super::traits::Clustering;
use crate::error::Result;
use crate::geo::GeoPoint;
use std::cmp::Ordering;

/// Greedy proximity partition into groups of at most `max_size` points.
#[derive(Debug, Clone)]
pub struct ProximityPartition {
    max_size: usize,
}

fn by_distance_then_index(a: &(f64, usize), b: &(f64, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

impl ProximityPartition {
    /// Create a partitioner producing groups of at most `max_size`.
    ///
    /// A `max_size` of zero is raised to one.
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
        }
    }

    /// Largest group size produced.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Split `points` into groups of at most [`max_size`](Self::max_size).
    ///
    /// Every valid point lands in exactly one group; invalid points are left
    /// out. Never fails.
    pub fn partition(&self, points: &[GeoPoint]) -> Vec<Vec<usize>> {
        let mut remaining: Vec<usize> = (0..points.len())
            .filter(|&i| points[i].is_valid())
            .collect();
        let Some(centroid) = GeoPoint::centroid(remaining.iter().map(|&i| &points[i])) else {
            return Vec::new();
        };

        let mut groups = Vec::with_capacity(remaining.len().div_ceil(self.max_size));
        while !remaining.is_empty() {
            // Farthest from the centroid; lowest index on ties.
            let Some(anchor) = remaining
                .iter()
                .map(|&i| (centroid.distance_km(&points[i]), i))
                .max_by(|a, b| a.0.total_cmp(&b.0).then(b.1.cmp(&a.1)))
                .map(|(_, i)| i)
            else {
                break;
            };

            let mut by_dist: Vec<(f64, usize)> = remaining
                .iter()
                .map(|&i| (points[anchor].distance_km(&points[i]), i))
                .collect();
            by_dist.sort_by(by_distance_then_index);

            let mut group: Vec<usize> = by_dist
                .iter()
                .take(self.max_size)
                .map(|&(_, i)| i)
                .collect();
            group.sort_unstable();

            remaining.retain(|i| group.binary_search(i).is_err());
            groups.push(group);
        }

        groups
    }
}

impl Clustering for ProximityPartition {
    fn cluster(&self, points: &[GeoPoint]) -> Result<Vec<Vec<usize>>> {
        Ok(self.partition(points))
    }
}
