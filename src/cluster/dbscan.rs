//! DBSCAN over geographic points.
//!
//! # The Algorithm (Ester et al., 1996)
//!
//! DBSCAN groups points by neighbourhood density. Unlike k-means, it:
//!
//! - Discovers clusters of arbitrary shape
//! - Determines the number of clusters itself
//! - Leaves sparse points out as noise
//!
//! ## Core Concepts
//!
//! - **Epsilon (ε)**: Neighbourhood radius, here in kilometres of great-circle
//!   distance.
//! - **MinPts**: Minimum neighbourhood size (the point itself included) for a
//!   point to be "core".
//! - **Core point**: Has at least MinPts points within ε.
//! - **Border point**: Within ε of a core point but not core itself.
//! - **Noise point**: Neither core nor border.
//!
//! ## Algorithm Steps
//!
//! 1. For each unvisited point P:
//!    - Find neighbours within ε
//!    - If |neighbours| < MinPts, mark as noise (may become border later)
//!    - Else P is core: start a new cluster and expand breadth-first
//!
//! 2. Expansion: pop a point from the queue and assign it to the cluster. If it
//!    is itself core, enqueue its neighbours that no cluster has claimed yet.
//!
//! ## Complexity
//!
//! Neighbourhood queries go through a [`GridIndex`] with ε-sized cells, so
//! expected time is O(n·k) for local density k. When ε approaches the extent of
//! the data every cell holds everything and it degrades to O(n²); the
//! region-query cap exists for that case.
//!
//! ## Partition guarantee
//!
//! A point is claimed by the first cluster that reaches it and never handed
//! to another. A core seed whose neighbourhood was mostly claimed as border by
//! earlier clusters can end up smaller than MinPts; such clusters are released
//! back to noise, so every returned cluster has at least MinPts members.
//!
//! ## References
//!
//! Ester et al. (1996). "A Density-Based Algorithm for Discovering Clusters
//! in Large Spatial Databases with Noise." KDD-96.

use super::spatial_index::GridIndex;
use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::geo::GeoPoint;
use log::{debug, trace};
use std::collections::{HashSet, VecDeque};

/// Label for points that belong to no cluster.
pub const NOISE: usize = usize::MAX;

/// DBSCAN clustering over latitude/longitude points.
#[derive(Debug, Clone)]
pub struct Dbscan {
    /// Neighbourhood radius in kilometres.
    epsilon_km: f64,
    /// Minimum neighbourhood size for core classification.
    min_points: usize,
    /// Abort after this many neighbourhood queries.
    max_region_queries: Option<usize>,
}

impl Dbscan {
    /// Create a new DBSCAN clusterer.
    ///
    /// # Arguments
    ///
    /// * `epsilon_km` - Maximum great-circle distance between neighbours.
    /// * `min_points` - Minimum neighbourhood size, the point itself included.
    pub fn new(epsilon_km: f64, min_points: usize) -> Self {
        Self {
            epsilon_km,
            min_points,
            max_region_queries: None,
        }
    }

    /// Set epsilon (neighbourhood radius in km).
    pub fn with_epsilon_km(mut self, epsilon_km: f64) -> Self {
        self.epsilon_km = epsilon_km;
        self
    }

    /// Set minimum points for core classification.
    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    /// Cap the number of neighbourhood queries.
    ///
    /// Each point is queried at most once, so any cap at or above the input
    /// size never triggers.
    pub fn with_max_region_queries(mut self, limit: usize) -> Self {
        self.max_region_queries = Some(limit);
        self
    }

    /// Neighbourhood radius in kilometres.
    pub fn epsilon_km(&self) -> f64 {
        self.epsilon_km
    }

    /// Minimum neighbourhood size.
    pub fn min_points(&self) -> usize {
        self.min_points
    }

    fn validate(&self) -> Result<()> {
        if !self.epsilon_km.is_finite() || self.epsilon_km <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "epsilon_km",
                message: "must be positive and finite",
            });
        }
        if self.min_points == 0 {
            return Err(Error::InvalidParameter {
                name: "min_points",
                message: "must be at least 1",
            });
        }
        if self.max_region_queries == Some(0) {
            return Err(Error::InvalidParameter {
                name: "max_region_queries",
                message: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Label every point with a cluster id, or [`NOISE`].
    ///
    /// Cluster ids are dense (`0..k`) and ordered by discovery.
    pub fn labels(&self, points: &[GeoPoint]) -> Result<Vec<usize>> {
        self.validate()?;

        let n = points.len();
        let mut labels = vec![NOISE; n];
        if n == 0 {
            return Ok(labels);
        }

        let index = GridIndex::build(points, self.epsilon_km);
        let mut queries = 0usize;
        let mut region_query = |idx: usize| -> Result<Vec<usize>> {
            queries += 1;
            if let Some(limit) = self.max_region_queries {
                if queries > limit {
                    return Err(Error::IterationLimit { limit });
                }
            }
            Ok(index.within(idx, self.epsilon_km))
        };

        let mut visited = vec![false; n];
        let mut sizes: Vec<usize> = Vec::new();

        for seed in 0..n {
            if visited[seed] {
                continue;
            }
            visited[seed] = true;

            let neighbors = region_query(seed)?;
            if neighbors.len() < self.min_points {
                continue;
            }

            let cluster_id = sizes.len();
            let mut size = 0usize;

            let mut queue: VecDeque<usize> = VecDeque::with_capacity(neighbors.len());
            let mut queued: HashSet<usize> = HashSet::with_capacity(neighbors.len());
            queue.push_back(seed);
            let _ = queued.insert(seed);
            for nb in neighbors {
                if labels[nb] == NOISE && queued.insert(nb) {
                    queue.push_back(nb);
                }
            }

            while let Some(idx) = queue.pop_front() {
                // Border of an earlier cluster: leave it there.
                if labels[idx] != NOISE {
                    continue;
                }
                labels[idx] = cluster_id;
                size += 1;

                if visited[idx] {
                    // Seed, or a point already known not to be core.
                    continue;
                }
                visited[idx] = true;

                let nbs = region_query(idx)?;
                if nbs.len() >= self.min_points {
                    for nb in nbs {
                        if labels[nb] == NOISE && queued.insert(nb) {
                            queue.push_back(nb);
                        }
                    }
                }
            }

            trace!("dbscan: cluster {cluster_id} seeded at {seed} with {size} members");
            sizes.push(size);
        }

        let kept = release_undersized(&mut labels, &sizes, self.min_points);
        debug!(
            "dbscan: n={n} eps={}km min_points={} clusters={kept} region_queries={queries}",
            self.epsilon_km, self.min_points
        );
        Ok(labels)
    }

    /// Labels with noise as `None`.
    pub fn labels_with_noise(&self, points: &[GeoPoint]) -> Result<Vec<Option<usize>>> {
        Ok(self
            .labels(points)?
            .into_iter()
            .map(|l| if l == NOISE { None } else { Some(l) })
            .collect())
    }
}

/// Reset clusters below `min_points` to noise and renumber the rest densely.
fn release_undersized(labels: &mut [usize], sizes: &[usize], min_points: usize) -> usize {
    let mut remap = vec![NOISE; sizes.len()];
    let mut next = 0usize;
    for (old, &size) in sizes.iter().enumerate() {
        if size >= min_points {
            remap[old] = next;
            next += 1;
        }
    }
    if next < sizes.len() {
        debug!(
            "dbscan: released {} undersized clusters to noise",
            sizes.len() - next
        );
    }
    for label in labels.iter_mut() {
        if *label != NOISE {
            *label = remap[*label];
        }
    }
    next
}

impl Default for Dbscan {
    fn default() -> Self {
        Self::new(5.0, 3)
    }
}

impl Clustering for Dbscan {
    fn cluster(&self, points: &[GeoPoint]) -> Result<Vec<Vec<usize>>> {
        let labels = self.labels(points)?;
        Ok(group_labels(&labels))
    }
}

/// Turn a label vector into member lists, one per cluster id, skipping noise.
pub(crate) fn group_labels(labels: &[usize]) -> Vec<Vec<usize>> {
    let k = labels
        .iter()
        .filter(|&&l| l != NOISE)
        .map(|&l| l + 1)
        .max()
        .unwrap_or(0);
    let mut groups = vec![Vec::new(); k];
    for (idx, &label) in labels.iter().enumerate() {
        if label != NOISE {
            groups[label].push(idx);
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Points on a small ring of `radius_km` around a centre.
    fn ring(center: GeoPoint, radius_km: f64, n: usize) -> Vec<GeoPoint> {
        let cos_lat = center.lat.to_radians().cos();
        (0..n)
            .map(|i| {
                let theta = i as f64 / n as f64 * std::f64::consts::TAU;
                GeoPoint::new(
                    center.lat + radius_km * theta.sin() / 111.2,
                    center.lng + radius_km * theta.cos() / (111.2 * cos_lat),
                )
            })
            .collect()
    }

    #[test]
    fn two_towns() {
        let mut data = ring(GeoPoint::new(59.91, 10.75), 0.5, 5);
        data.extend(ring(GeoPoint::new(60.39, 5.32), 0.5, 5));

        let clusters = Dbscan::new(2.0, 3).cluster(&data).unwrap();
        assert_eq!(clusters, vec![vec![0, 1, 2, 3, 4], vec![5, 6, 7, 8, 9]]);
    }

    #[test]
    fn outlier_is_noise() {
        let mut data = ring(GeoPoint::new(59.91, 10.75), 0.5, 4);
        data.push(GeoPoint::new(61.0, 11.0));

        let labels = Dbscan::new(2.0, 3).labels_with_noise(&data).unwrap();
        assert!(labels[4].is_none());
        assert!(labels[..4].iter().all(|l| *l == Some(0)));
    }

    #[test]
    fn all_noise_when_sparse() {
        let data = vec![
            GeoPoint::new(59.0, 10.0),
            GeoPoint::new(59.5, 10.0),
            GeoPoint::new(60.0, 10.0),
        ];
        let clusters = Dbscan::new(1.0, 2).cluster(&data).unwrap();
        assert!(clusters.is_empty());
    }

    #[test]
    fn all_within_epsilon_is_one_cluster() {
        let data = ring(GeoPoint::new(51.5, -0.12), 0.3, 8);
        let clusters = Dbscan::new(1.0, 3).cluster(&data).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 8);
    }

    #[test]
    fn empty_input_is_empty_result() {
        let clusters = Dbscan::new(1.0, 3).cluster(&[]).unwrap();
        assert!(clusters.is_empty());
    }

    #[test]
    fn invalid_params() {
        let data = [GeoPoint::new(0.0, 0.0)];
        assert!(Dbscan::new(0.0, 3).cluster(&data).is_err());
        assert!(Dbscan::new(-1.0, 3).cluster(&data).is_err());
        assert!(Dbscan::new(f64::NAN, 3).cluster(&data).is_err());
        assert!(Dbscan::new(1.0, 0).cluster(&data).is_err());
        assert!(Dbscan::new(1.0, 1)
            .with_max_region_queries(0)
            .cluster(&data)
            .is_err());
    }

    #[test]
    fn min_points_one_makes_singletons() {
        let data = [GeoPoint::new(0.0, 0.0), GeoPoint::new(10.0, 10.0)];
        let clusters = Dbscan::new(1.0, 1).cluster(&data).unwrap();
        assert_eq!(clusters, vec![vec![0], vec![1]]);
    }

    #[test]
    fn chain_connects() {
        // ~0.33 km steps along a parallel; each link is within epsilon.
        let data: Vec<GeoPoint> = (0..10)
            .map(|i| GeoPoint::new(0.0, i as f64 * 0.003))
            .collect();
        let clusters = Dbscan::new(0.5, 2).cluster(&data).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 10);
    }

    #[test]
    fn coincident_points_are_kept() {
        let p = GeoPoint::new(45.0, 7.0);
        let clusters = Dbscan::new(0.1, 3).cluster(&[p, p, p]).unwrap();
        assert_eq!(clusters, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn invalid_points_fall_out_as_noise() {
        let mut data = ring(GeoPoint::new(59.91, 10.75), 0.2, 4);
        data.push(GeoPoint::new(f64::NAN, 10.75));
        let labels = Dbscan::new(1.0, 3).labels(&data).unwrap();
        assert_eq!(labels[4], NOISE);
    }

    #[test]
    fn border_point_is_claimed_once() {
        // Along the equator, in km: A = {-1.3, -1.2, -1.1, -0.95}, bridge at 0,
        // B mirrors A. With eps = 1 and min_points = 4 the bridge sees only
        // -0.95 and 0.95, so it is border to both clusters and core to neither.
        let km = |x: f64| GeoPoint::new(0.0, x / 111.194_926_6);
        let data = vec![
            km(-1.3),
            km(-1.2),
            km(-1.1),
            km(-0.95),
            km(0.95),
            km(1.1),
            km(1.2),
            km(1.3),
            km(0.0),
        ];

        let labels = Dbscan::new(1.0, 4).labels(&data).unwrap();
        assert!(labels[..4].iter().all(|&l| l == 0));
        assert!(labels[4..8].iter().all(|&l| l == 1));
        // First cluster to reach it keeps it.
        assert_eq!(labels[8], 0);
    }

    #[test]
    fn region_query_cap_aborts() {
        let data = ring(GeoPoint::new(0.0, 0.0), 0.2, 20);
        let err = Dbscan::new(1.0, 3)
            .with_max_region_queries(5)
            .cluster(&data)
            .unwrap_err();
        assert_eq!(err, Error::IterationLimit { limit: 5 });

        // One query per point at most.
        assert!(Dbscan::new(1.0, 3)
            .with_max_region_queries(20)
            .cluster(&data)
            .is_ok());
    }

    proptest! {
        #[test]
        fn clusters_are_large_enough_and_disjoint(
            raw in proptest::collection::vec((-0.05f64..0.05, -0.05f64..0.05), 0..120),
            eps in 0.2f64..3.0,
            min_points in 1usize..6,
        ) {
            let data: Vec<GeoPoint> = raw
                .iter()
                .map(|&(lat, lng)| GeoPoint::new(60.0 + lat, 10.0 + lng))
                .collect();
            let clusters = Dbscan::new(eps, min_points).cluster(&data).unwrap();

            let mut seen = HashSet::new();
            for c in &clusters {
                prop_assert!(c.len() >= min_points);
                for &idx in c {
                    prop_assert!(seen.insert(idx), "point {} in two clusters", idx);
                }
            }
        }
    }
}
