//! Geographic primitives: coordinates, great-circle distance, convex hulls.
//!
//! Coordinates are WGS84 degrees. Nothing here projects onto a plane except
//! where noted: [`hull`] treats `(lng, lat)` as planar `(x, y)`, which is fine
//! for the city-scale extents the hull is drawn at.

pub mod distance;
pub mod hull;

use serde::{Deserialize, Serialize};

pub use distance::{distance_km, haversine_km, EARTH_RADIUS_KM, KM_PER_DEGREE};
pub use hull::convex_hull;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Create a point. No validation; see [`GeoPoint::is_valid`].
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite and inside `[-90, 90]` x `[-180, 180]`.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0
    }

    /// Great-circle distance to `other` in kilometres.
    #[inline]
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(self, other)
    }

    /// Arithmetic mean of `points`, or `None` when empty.
    pub fn centroid<'a, I>(points: I) -> Option<GeoPoint>
    where
        I: IntoIterator<Item = &'a GeoPoint>,
    {
        let (mut lat, mut lng, mut n) = (0.0, 0.0, 0usize);
        for p in points {
            lat += p.lat;
            lng += p.lng;
            n += 1;
        }
        if n == 0 {
            return None;
        }
        Some(GeoPoint::new(lat / n as f64, lng / n as f64))
    }
}

/// An ordered loop of vertices.
///
/// Produced by [`convex_hull`]; the closing edge from the last vertex back to
/// the first is implicit. Used for display only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<GeoPoint>,
}

impl Polygon {
    /// Wrap an ordered vertex loop.
    pub fn new(vertices: Vec<GeoPoint>) -> Self {
        Self { vertices }
    }

    /// Vertices in loop order.
    pub fn vertices(&self) -> &[GeoPoint] {
        &self.vertices
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True if there are no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Consume into the vertex list.
    pub fn into_vertices(self) -> Vec<GeoPoint> {
        self.vertices
    }

    /// On-or-inside test for a convex loop (either winding).
    ///
    /// Degenerate loops (fewer than three vertices, or zero area) contain only
    /// points lying on their segments. Points whose turn off an edge has a
    /// sine of at most `1e-9` count as on that edge.
    pub fn contains(&self, point: &GeoPoint) -> bool {
        const EPS: f64 = 1e-9;
        match self.vertices.len() {
            0 => false,
            1 => self.vertices[0] == *point,
            _ => {
                let n = self.vertices.len();
                let mut sign = 0.0_f64;
                for i in 0..n {
                    let a = &self.vertices[i];
                    let b = &self.vertices[(i + 1) % n];
                    let c = hull::turn_sin(a, b, point);
                    if c.abs() <= EPS {
                        if !within_extent(a, b, point) && n == 2 {
                            return false;
                        }
                        continue;
                    }
                    if sign == 0.0 {
                        sign = c.signum();
                    } else if c.signum() != sign {
                        return false;
                    }
                }
                // Zero-area loop: only points on a segment qualify.
                sign != 0.0 || self.on_boundary(point, EPS)
            }
        }
    }

    fn on_boundary(&self, point: &GeoPoint, eps: f64) -> bool {
        let n = self.vertices.len();
        (0..n).any(|i| {
            let a = &self.vertices[i];
            let b = &self.vertices[(i + 1) % n];
            hull::turn_sin(a, b, point).abs() <= eps && within_extent(a, b, point)
        })
    }
}

fn within_extent(a: &GeoPoint, b: &GeoPoint, p: &GeoPoint) -> bool {
    p.lng >= a.lng.min(b.lng)
        && p.lng <= a.lng.max(b.lng)
        && p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
}
