//! Convex hull by gift wrapping (Jarvis march).
//!
//! # Algorithm
//!
//! 1. Start at the extreme point: lowest latitude, ties broken by lowest
//!    longitude. It is always on the hull.
//! 2. From the current vertex, pick the candidate such that every other point
//!    lies to the left of (or on) the edge `current -> candidate`, using the
//!    sign of the 2D cross product. Among collinear candidates the farthest
//!    wins, so intermediate collinear points never become vertices.
//!    Collinearity is judged on the sine of the turn angle, so the decision is
//!    the same for a city block and a single building.
//! 3. Stop when the walk returns to the start, or after `n` steps.
//!
//! The result winds counter-clockwise in `(lng, lat)` space.
//!
//! ## Complexity
//!
//! O(n·h) for `h` hull vertices. Boundary drawing hands in a few dozen points
//! per cluster, where this beats sorting-based scans on constant factors.
//!
//! ## Degenerate input
//!
//! Collinear sets produce a two-vertex loop, coincident sets a single vertex.
//! Neither is an error; the rendering side draws what it gets.

use super::{GeoPoint, Polygon};
use std::cmp::Ordering;

/// Turns with `|sin| <= COLLINEAR_SIN` count as straight.
const COLLINEAR_SIN: f64 = 1e-12;

/// 2D cross product of `a -> b` and `a -> p` in `(lng, lat)` space.
///
/// Positive when `p` is left of the directed edge (counter-clockwise turn).
#[inline]
fn cross(a: &GeoPoint, b: &GeoPoint, p: &GeoPoint) -> f64 {
    (b.lng - a.lng) * (p.lat - a.lat) - (b.lat - a.lat) * (p.lng - a.lng)
}

#[inline]
fn planar_dist_sq(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let dx = b.lng - a.lng;
    let dy = b.lat - a.lat;
    dx * dx + dy * dy
}

/// Sine of the angle from `a -> b` to `a -> p`, signed like [`cross`].
///
/// Independent of the scale of the input. Zero when `p` or `b` coincides
/// with `a`.
#[inline]
pub(crate) fn turn_sin(a: &GeoPoint, b: &GeoPoint, p: &GeoPoint) -> f64 {
    let scale = planar_dist_sq(a, b).sqrt() * planar_dist_sq(a, p).sqrt();
    if scale == 0.0 {
        return 0.0;
    }
    cross(a, b, p) / scale
}

/// Convex hull of `points`.
///
/// Fewer than three points are returned unchanged. Points with non-finite
/// coordinates are ignored.
///
/// ```rust
/// use loci::geo::{convex_hull, GeoPoint};
///
/// let pts = [
///     GeoPoint::new(0.0, 0.0),
///     GeoPoint::new(0.0, 2.0),
///     GeoPoint::new(2.0, 2.0),
///     GeoPoint::new(2.0, 0.0),
///     GeoPoint::new(1.0, 1.0), // interior
/// ];
/// let hull = convex_hull(&pts);
/// assert_eq!(hull.len(), 4);
/// assert!(hull.contains(&GeoPoint::new(1.0, 1.0)));
/// ```
pub fn convex_hull(points: &[GeoPoint]) -> Polygon {
    if points.len() < 3 {
        return Polygon::new(points.to_vec());
    }

    let pts: Vec<GeoPoint> = points.iter().copied().filter(GeoPoint::is_valid).collect();
    if pts.len() < 3 {
        return Polygon::new(pts);
    }

    let Some(start) = pts
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| match a.lat.total_cmp(&b.lat) {
            Ordering::Equal => a.lng.total_cmp(&b.lng),
            ord => ord,
        })
        .map(|(i, _)| i)
    else {
        return Polygon::default();
    };

    let n = pts.len();
    let mut hull = Vec::new();
    let mut current = start;

    for _ in 0..n {
        hull.push(pts[current]);
        let here = pts[current];

        let mut candidate: Option<usize> = None;
        for (i, p) in pts.iter().enumerate() {
            if *p == here {
                continue;
            }
            let Some(c) = candidate else {
                candidate = Some(i);
                continue;
            };
            let turn = turn_sin(&here, &pts[c], p);
            let farther = planar_dist_sq(&here, p) > planar_dist_sq(&here, &pts[c]);
            if turn < -COLLINEAR_SIN || (turn.abs() <= COLLINEAR_SIN && farther) {
                candidate = Some(i);
            }
        }

        // Every remaining point coincides with `here`.
        let Some(next) = candidate else {
            break;
        };
        if pts[next] == pts[start] {
            break;
        }
        current = next;
    }

    Polygon::new(hull)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square_with_interior() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(1.0, 1.0),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 2.0),
            GeoPoint::new(0.5, 1.5),
            GeoPoint::new(2.0, 2.0),
            GeoPoint::new(2.0, 0.0),
        ]
    }

    fn is_convex(hull: &Polygon) -> bool {
        let v = hull.vertices();
        let n = v.len();
        if n < 3 {
            return true;
        }
        (0..n).all(|i| turn_sin(&v[i], &v[(i + 1) % n], &v[(i + 2) % n]) >= -1e-9)
    }

    fn check_hull(pts: &[GeoPoint]) -> Result<(), TestCaseError> {
        let hull = convex_hull(pts);
        prop_assert!(!hull.is_empty());
        prop_assert!(hull.len() <= pts.len());
        prop_assert!(is_convex(&hull));
        for p in pts {
            prop_assert!(hull.contains(p), "{:?} outside {:?}", p, hull);
        }
        Ok(())
    }

    #[test]
    fn small_inputs_pass_through() {
        let two = [GeoPoint::new(1.0, 1.0), GeoPoint::new(2.0, 2.0)];
        assert_eq!(convex_hull(&two).vertices(), &two);
        assert!(convex_hull(&[]).is_empty());
    }

    #[test]
    fn square_drops_interior_points() {
        let hull = convex_hull(&square_with_interior());
        assert_eq!(hull.len(), 4);
        assert_eq!(hull.vertices()[0], GeoPoint::new(0.0, 0.0));
        assert!(!hull.vertices().contains(&GeoPoint::new(1.0, 1.0)));
        assert!(is_convex(&hull));
    }

    #[test]
    fn starts_at_lowest_latitude_then_lowest_longitude() {
        let pts = [
            GeoPoint::new(0.0, 3.0),
            GeoPoint::new(0.0, 1.0),
            GeoPoint::new(2.0, 2.0),
        ];
        let hull = convex_hull(&pts);
        assert_eq!(hull.vertices()[0], GeoPoint::new(0.0, 1.0));
    }

    #[test]
    fn winds_counter_clockwise() {
        let hull = convex_hull(&square_with_interior());
        let v = hull.vertices();
        assert!(cross(&v[0], &v[1], &v[2]) > 0.0);
    }

    #[test]
    fn collinear_points_form_segment() {
        let pts: Vec<GeoPoint> = (0..6)
            .map(|i| GeoPoint::new(f64::from(i), f64::from(i)))
            .collect();
        let hull = convex_hull(&pts);
        assert_eq!(
            hull.vertices(),
            &[GeoPoint::new(0.0, 0.0), GeoPoint::new(5.0, 5.0)]
        );
        for p in &pts {
            assert!(hull.contains(p));
        }
    }

    #[test]
    fn keeps_shallow_vertices_of_a_tiny_cluster() {
        // A 1 m square with a fifth point 1 mm below its southern edge.
        let pts = [
            GeoPoint::new(59.9, 10.7),
            GeoPoint::new(59.9, 10.700_01),
            GeoPoint::new(59.900_01, 10.700_01),
            GeoPoint::new(59.900_01, 10.7),
            GeoPoint::new(59.9 - 1e-8, 10.700_005),
            GeoPoint::new(59.900_005, 10.700_005),
        ];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 5);
        assert_eq!(hull.vertices()[0], pts[4]);
        assert!(is_convex(&hull));
        for p in &pts {
            assert!(hull.contains(p), "{p:?} outside {hull:?}");
        }
    }

    #[test]
    fn duplicate_points_collapse() {
        let p = GeoPoint::new(59.9, 10.7);
        let hull = convex_hull(&[p, p, p, p]);
        assert_eq!(hull.vertices(), &[p]);
    }

    #[test]
    fn duplicated_hull_vertices_appear_once() {
        let mut pts = square_with_interior();
        pts.extend(square_with_interior());
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
    }

    #[test]
    fn invalid_points_are_ignored() {
        let mut pts = square_with_interior();
        pts.push(GeoPoint::new(f64::NAN, 5.0));
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!(hull.vertices().iter().all(GeoPoint::is_valid));
    }

    proptest! {
        // Integer coordinates keep cross products exact, and the small range
        // produces plenty of duplicate and collinear configurations.
        #[test]
        fn hull_encloses_every_point_and_is_convex(
            raw in proptest::collection::vec((-20i32..20, -20i32..20), 3..60),
        ) {
            let pts: Vec<GeoPoint> = raw
                .iter()
                .map(|&(lat, lng)| GeoPoint::new(f64::from(lat), f64::from(lng)))
                .collect();
            check_hull(&pts)?;
        }

        // Geocodes within one building, about a metre apart.
        #[test]
        fn hull_encloses_every_point_at_building_scale(
            raw in proptest::collection::vec((-1e-5f64..1e-5, -1e-5f64..1e-5), 3..30),
        ) {
            let pts: Vec<GeoPoint> = raw
                .iter()
                .map(|&(lat, lng)| GeoPoint::new(59.9 + lat, 10.7 + lng))
                .collect();
            check_hull(&pts)?;
        }

        #[test]
        fn hull_encloses_every_point_at_city_scale(
            raw in proptest::collection::vec((-0.05f64..0.05, -0.05f64..0.05), 3..60),
        ) {
            let pts: Vec<GeoPoint> = raw
                .iter()
                .map(|&(lat, lng)| GeoPoint::new(59.9 + lat, 10.7 + lng))
                .collect();
            check_hull(&pts)?;
        }
    }
}
