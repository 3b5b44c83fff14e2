//! Grid-bucketed point index for epsilon-neighbourhood queries.
//!
//! Points are hashed into square-ish cells at least `cell_km` wide in both
//! directions. A neighbourhood query scans only the 3x3 block of cells around
//! the query point, so its cost tracks local density instead of total set
//! size. Callers still filter the returned candidates by exact distance.
//!
//! # Cell sizing
//!
//! ```text
//! Δlat = cell_km / 111
//! Δlng = cell_km / (111 · cos(lat_ref))
//! ```
//!
//! `lat_ref` is the largest absolute latitude among the indexed points.
//! Longitude degrees only shrink towards the poles, so sizing for the
//! worst-case latitude keeps every cell at least `cell_km` wide across the
//! whole set. The flat 111 km/degree figure is slightly below the true
//! ~111.19 km and errs on the side of larger cells.
//!
//! The grid does not wrap at the antimeridian; points either side of ±180°
//! never share a neighbourhood.

use crate::geo::{GeoPoint, KM_PER_DEGREE};
use std::collections::HashMap;

/// Smallest `cos(lat)` used for longitude cell sizing (about 89.4°).
const MIN_COS_LAT: f64 = 0.01;

/// Grid cell coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct CellCoord {
    x: i64,
    y: i64,
}

impl CellCoord {
    /// The 3x3 block centred on this cell.
    #[inline]
    fn block(self) -> impl Iterator<Item = CellCoord> {
        (-1..=1).flat_map(move |dx| {
            (-1..=1).map(move |dy| CellCoord {
                x: self.x.saturating_add(dx),
                y: self.y.saturating_add(dy),
            })
        })
    }
}

/// Grid index over a borrowed point slice.
///
/// Indices returned by queries refer to positions in that slice. Points that
/// fail [`GeoPoint::is_valid`] are not indexed and never appear in results.
#[derive(Debug, Clone)]
pub struct GridIndex<'a> {
    points: &'a [GeoPoint],
    cells: HashMap<CellCoord, Vec<usize>>,
    lat_step: f64,
    lng_step: f64,
}

impl<'a> GridIndex<'a> {
    /// Bucket `points` into cells at least `cell_km` wide.
    ///
    /// `cell_km` must be positive and finite; the caller validates it.
    pub fn build(points: &'a [GeoPoint], cell_km: f64) -> Self {
        let lat_ref = points
            .iter()
            .filter(|p| p.is_valid())
            .map(|p| p.lat.abs().min(90.0))
            .fold(0.0_f64, f64::max);
        let cos_ref = lat_ref.to_radians().cos().max(MIN_COS_LAT);

        let lat_step = cell_km / KM_PER_DEGREE;
        let lng_step = cell_km / (KM_PER_DEGREE * cos_ref);

        let mut index = Self {
            points,
            cells: HashMap::new(),
            lat_step,
            lng_step,
        };
        for (i, p) in points.iter().enumerate() {
            if let Some(cell) = index.cell_of(p) {
                index.cells.entry(cell).or_default().push(i);
            }
        }
        index
    }

    #[inline]
    fn cell_of(&self, p: &GeoPoint) -> Option<CellCoord> {
        if !p.is_valid() {
            return None;
        }
        Some(CellCoord {
            x: (p.lng / self.lng_step).floor() as i64,
            y: (p.lat / self.lat_step).floor() as i64,
        })
    }

    /// Candidate indices in the 3x3 block around point `idx`, itself included.
    ///
    /// Results are in ascending index order.
    pub fn neighbors_of(&self, idx: usize) -> Vec<usize> {
        match self.points.get(idx) {
            Some(p) => self.candidates_near(p),
            None => Vec::new(),
        }
    }

    /// Candidate indices in the 3x3 block around an arbitrary point.
    pub fn candidates_near(&self, p: &GeoPoint) -> Vec<usize> {
        let Some(cell) = self.cell_of(p) else {
            return Vec::new();
        };
        let mut out: Vec<usize> = cell
            .block()
            .filter_map(|c| self.cells.get(&c))
            .flatten()
            .copied()
            .collect();
        out.sort_unstable();
        out
    }

    /// Indices within `radius_km` of point `idx` (itself included), by exact
    /// haversine distance.
    ///
    /// Complete only while `radius_km` does not exceed the build `cell_km`.
    pub fn within(&self, idx: usize, radius_km: f64) -> Vec<usize> {
        let Some(p) = self.points.get(idx) else {
            return Vec::new();
        };
        self.candidates_near(p)
            .into_iter()
            .filter(|&j| p.distance_km(&self.points[j]) <= radius_km)
            .collect()
    }

    /// Number of non-empty cells.
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// Number of indexed (valid) points.
    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    /// True if no point was indexed.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
