//! Clustering of geotagged points.
//!
//! ## Algorithms
//!
//! ### DBSCAN
//!
//! Density-based: a cluster is a maximal set of points reachable through
//! chains of "core" points, each with at least `min_points` neighbours within
//! `epsilon_km`. The number of clusters falls out of the data and sparse points
//! are left as noise, which is what route planning wants: a lone customer
//! 40 km out should not drag a route's centroid.
//!
//! Neighbourhoods come from a [`GridIndex`], a hash grid with cells at least
//! epsilon wide, so each query scans a 3x3 block of cells instead of the
//! whole input.
//!
//! ### Proximity partition
//!
//! Not a discovery algorithm: it splits an existing cluster into groups of
//! bounded size by proximity. The recommendation pipeline uses it for
//! clusters that are too big to serve in one shift.
//!
//! ## Usage
//!
//! ```rust
//! use loci::cluster::{Clustering, Dbscan};
//! use loci::geo::GeoPoint;
//!
//! let points = vec![
//!     GeoPoint::new(59.910, 10.750),
//!     GeoPoint::new(59.911, 10.751),
//!     GeoPoint::new(59.912, 10.749),
//!     GeoPoint::new(60.391, 5.322), // Bergen, far away
//! ];
//!
//! let clusters = Dbscan::new(1.0, 3).cluster(&points).unwrap();
//! assert_eq!(clusters, vec![vec![0, 1, 2]]);
//! ```

mod dbscan;
mod partition;
pub mod spatial_index;
mod traits;

pub use dbscan::{Dbscan, NOISE};
pub use partition::ProximityPartition;
pub use spatial_index::GridIndex;
pub use traits::Clustering;
