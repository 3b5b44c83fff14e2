//! Clustering traits.

use crate::error::Result;
use crate::geo::GeoPoint;

/// Trait for hard clustering of geographic points.
pub trait Clustering {
    /// Group points into clusters.
    ///
    /// Each inner vector lists indices into `points`, ascending. No index
    /// appears in two clusters; indices left out of every cluster are noise.
    fn cluster(&self, points: &[GeoPoint]) -> Result<Vec<Vec<usize>>>;
}
