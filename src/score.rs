//! Dispatch-efficiency scoring for candidate routes.
//!
//! Turns a group of service candidates into cheap cost estimates (minutes,
//! kilometres) and a single 0–100 score used for ranking.
//!
//! # Heuristic
//!
//! With `n` members, `d` the distance from the dispatch origin to the
//! centroid and `r` the mean member distance from the centroid:
//!
//! ```text
//! minutes = 2d / v_transit · 60  +  r · n · k / v_local · 60  +  n · service
//! km      = 2d + r · n · k
//! score   = clamp(round(ρ · n · s / (1 + d · w_d + r · w_r) · s_out), 0, 100)
//! ```
//!
//! `k` is a routing-inefficiency multiplier over the star-shaped `r · n`
//! estimate and `ρ` is members per km² of bounding box. None of this is a
//! tour: it only has to order candidate routes sensibly. The weights are
//! empirical and live in [`ScoreWeights`] so they can be tuned against real
//! dispatch outcomes.

use crate::candidate::ServiceCandidate;
use crate::geo::{GeoPoint, KM_PER_DEGREE};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Weights and speeds for the efficiency heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoreWeights {
    /// Multiplier on `density × members` (default: 10).
    pub density_scale: f64,
    /// Penalty per km from the dispatch origin to the centroid (default: 0.05).
    pub start_distance_weight: f64,
    /// Penalty per km of mean spread around the centroid (default: 0.3).
    pub spread_weight: f64,
    /// Final multiplier before clamping (default: 10).
    pub output_scale: f64,
    /// Inflation of intra-cluster travel over the star estimate (default: 1.5).
    pub routing_inefficiency: f64,
    /// Speed to and from the cluster in km/h (default: 50).
    pub transit_speed_kmh: f64,
    /// Speed between stops in km/h (default: 30).
    pub local_speed_kmh: f64,
    /// Floor on bounding-box area in km², for collinear or coincident
    /// members (default: 0.01).
    pub min_area_km2: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            density_scale: 10.0,
            start_distance_weight: 0.05,
            spread_weight: 0.3,
            output_scale: 10.0,
            routing_inefficiency: 1.5,
            transit_speed_kmh: 50.0,
            local_speed_kmh: 30.0,
            min_area_km2: 0.01,
        }
    }
}

/// Cost and value metrics for one group of candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterScore {
    /// Mean member coordinate.
    pub centroid: GeoPoint,
    /// Most frequent area label among members.
    pub primary_area: String,
    /// Union of member category tags, sorted.
    pub categories: Vec<String>,
    /// Members due strictly before the current date.
    pub overdue_count: usize,
    /// Members due on or after the current date.
    pub upcoming_count: usize,
    /// Ranking score in `[0, 100]`.
    pub efficiency_score: u8,
    /// Estimated shift length in minutes.
    pub estimated_minutes: f64,
    /// Estimated driving distance in km.
    pub estimated_km: f64,
    /// Members per km² of bounding box.
    pub density: f64,
    /// Mean member distance to the centroid in km.
    pub avg_distance_from_centroid: f64,
    /// Distance from the dispatch origin to the centroid in km.
    pub distance_to_start: f64,
}

/// Scores candidate groups relative to a dispatch origin.
#[derive(Debug, Clone)]
pub struct EfficiencyScorer {
    origin: GeoPoint,
    service_minutes_per_stop: f64,
    weights: ScoreWeights,
}

impl EfficiencyScorer {
    /// Scorer for routes starting and ending at `origin`.
    pub fn new(origin: GeoPoint) -> Self {
        Self {
            origin,
            service_minutes_per_stop: 30.0,
            weights: ScoreWeights::default(),
        }
    }

    /// Set on-site minutes per stop.
    pub fn with_service_minutes_per_stop(mut self, minutes: f64) -> Self {
        self.service_minutes_per_stop = minutes;
        self
    }

    /// Set heuristic weights.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Dispatch origin.
    pub fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// Score a group of candidates.
    ///
    /// Members without a valid location are ignored. Returns `None` if fewer
    /// than two located members remain: a single stop is not a route.
    pub fn score(&self, members: &[&ServiceCandidate], today: NaiveDate) -> Option<ClusterScore> {
        let located: Vec<(&ServiceCandidate, GeoPoint)> = members
            .iter()
            .filter_map(|c| c.location().map(|p| (*c, p)))
            .collect();
        if located.len() < 2 {
            return None;
        }

        let n = located.len() as f64;
        let w = &self.weights;

        let centroid = GeoPoint::centroid(located.iter().map(|(_, p)| p))?;
        let distance_to_start = self.origin.distance_km(&centroid);
        let avg_distance_from_centroid =
            located.iter().map(|(_, p)| p.distance_km(&centroid)).sum::<f64>() / n;

        let density = n / bounding_box_km2(located.iter().map(|(_, p)| p), centroid.lat)
            .max(w.min_area_km2);

        let intra_km = avg_distance_from_centroid * n * w.routing_inefficiency;
        let estimated_km = 2.0 * distance_to_start + intra_km;
        let estimated_minutes = 2.0 * distance_to_start / w.transit_speed_kmh * 60.0
            + intra_km / w.local_speed_kmh * 60.0
            + n * self.service_minutes_per_stop;

        let raw = density * n * w.density_scale
            / (1.0
                + distance_to_start * w.start_distance_weight
                + avg_distance_from_centroid * w.spread_weight)
            * w.output_scale;
        let efficiency_score = raw.round().clamp(0.0, 100.0) as u8;

        let overdue_count = located.iter().filter(|(c, _)| c.is_overdue(today)).count();
        let upcoming_count = located
            .iter()
            .filter(|(c, _)| c.next_due_date.is_some_and(|d| d >= today))
            .count();

        let categories: BTreeSet<&String> = located
            .iter()
            .flat_map(|(c, _)| c.category_tags.iter())
            .collect();

        Some(ClusterScore {
            centroid,
            primary_area: primary_area(located.iter().map(|(c, _)| c.area_label.as_str())),
            categories: categories.into_iter().cloned().collect(),
            overdue_count,
            upcoming_count,
            efficiency_score,
            estimated_minutes,
            estimated_km,
            density,
            avg_distance_from_centroid,
            distance_to_start,
        })
    }
}

/// Bounding-box area in km², longitude scaled by `cos(ref_lat)`.
fn bounding_box_km2<'a>(points: impl Iterator<Item = &'a GeoPoint>, ref_lat: f64) -> f64 {
    let (mut min_lat, mut max_lat) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_lng, mut max_lng) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_lat = min_lat.min(p.lat);
        max_lat = max_lat.max(p.lat);
        min_lng = min_lng.min(p.lng);
        max_lng = max_lng.max(p.lng);
    }
    let height = (max_lat - min_lat) * KM_PER_DEGREE;
    let width = (max_lng - min_lng) * KM_PER_DEGREE * ref_lat.to_radians().cos();
    (height * width).abs()
}

/// Most frequent label; alphabetically first among ties.
fn primary_area<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut best: Option<(&str, usize)> = None;
    for (label, count) in counts {
        match best {
            Some((_, c)) if count <= c => {}
            _ => best = Some((label, count)),
        }
    }
    best.map(|(l, _)| l.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn at(id: &str, lat: f64, lng: f64) -> ServiceCandidate {
        ServiceCandidate::new(id, lat, lng).with_due_date(today())
    }

    fn refs(cs: &[ServiceCandidate]) -> Vec<&ServiceCandidate> {
        cs.iter().collect()
    }

    #[test]
    fn single_member_is_not_scored() {
        let cs = [at("a", 0.0, 0.0)];
        assert!(EfficiencyScorer::new(GeoPoint::new(0.0, 0.0))
            .score(&refs(&cs), today())
            .is_none());
    }

    #[test]
    fn unlocated_members_do_not_count() {
        let mut b = at("b", 0.0, 0.0);
        b.lat = None;
        let cs = [at("a", 0.0, 0.0), b];
        assert!(EfficiencyScorer::new(GeoPoint::new(0.0, 0.0))
            .score(&refs(&cs), today())
            .is_none());
    }

    #[test]
    fn two_stops_on_the_equator() {
        let cs = [at("a", 0.0, -0.01), at("b", 0.0, 0.01)];
        let s = EfficiencyScorer::new(GeoPoint::new(0.0, 0.0))
            .score(&refs(&cs), today())
            .unwrap();

        let r = 6371.0 * 0.01_f64.to_radians();
        assert_relative_eq!(s.centroid.lat, 0.0);
        assert_relative_eq!(s.centroid.lng, 0.0);
        assert_relative_eq!(s.distance_to_start, 0.0);
        assert_relative_eq!(s.avg_distance_from_centroid, r, epsilon = 1e-9);
        // Zero-height box: area floored at 0.01 km².
        assert_relative_eq!(s.density, 200.0);
        assert_relative_eq!(s.estimated_km, r * 2.0 * 1.5, epsilon = 1e-9);
        assert_relative_eq!(
            s.estimated_minutes,
            r * 2.0 * 1.5 / 30.0 * 60.0 + 60.0,
            epsilon = 1e-9
        );
        assert_eq!(s.efficiency_score, 100);
    }

    #[test]
    fn travel_to_cluster_counts_both_ways() {
        let cs = [at("a", 1.0, 0.0), at("b", 1.0, 0.0)];
        let s = EfficiencyScorer::new(GeoPoint::new(0.0, 0.0))
            .with_service_minutes_per_stop(0.0)
            .score(&refs(&cs), today())
            .unwrap();
        let d = 6371.0 * 1f64.to_radians();
        assert_relative_eq!(s.distance_to_start, d, epsilon = 1e-9);
        assert_relative_eq!(s.estimated_km, 2.0 * d, epsilon = 1e-9);
        assert_relative_eq!(s.estimated_minutes, 2.0 * d / 50.0 * 60.0, epsilon = 1e-9);
    }

    #[test]
    fn density_is_latitude_corrected() {
        // Same degree box at 60°N covers half the km² it does at the equator.
        let square = |lat: f64| {
            vec![
                at("a", lat, 0.0),
                at("b", lat + 0.1, 0.0),
                at("c", lat, 0.1),
                at("d", lat + 0.1, 0.1),
            ]
        };
        let scorer = EfficiencyScorer::new(GeoPoint::new(0.0, 0.0));
        let eq = scorer.score(&refs(&square(0.0)), today()).unwrap();
        let north = scorer.score(&refs(&square(60.0)), today()).unwrap();
        let ratio = north.density / eq.density;
        assert!((1.9..2.1).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn score_decreases_with_distance_from_origin() {
        // ~31 km² box: unsaturated score near the origin.
        let cs = [at("a", 0.0, 0.0), at("b", 0.05, 0.05), at("c", 0.0, 0.05)];
        let near = EfficiencyScorer::new(GeoPoint::new(0.0, 0.0))
            .score(&refs(&cs), today())
            .unwrap();
        let far = EfficiencyScorer::new(GeoPoint::new(3.0, 3.0))
            .score(&refs(&cs), today())
            .unwrap();
        assert!(near.efficiency_score > far.efficiency_score);
        assert!(near.estimated_minutes < far.estimated_minutes);
    }

    #[test]
    fn score_is_clamped() {
        let cs = [at("a", 0.0, 0.0), at("b", 0.0, 0.0)];
        let s = EfficiencyScorer::new(GeoPoint::new(0.0, 0.0))
            .score(&refs(&cs), today())
            .unwrap();
        assert_eq!(s.efficiency_score, 100);

        let sparse = [at("a", 0.0, 0.0), at("b", 1.0, 1.0)];
        let s = EfficiencyScorer::new(GeoPoint::new(40.0, 40.0))
            .score(&refs(&sparse), today())
            .unwrap();
        assert_eq!(s.efficiency_score, 0);
    }

    #[test]
    fn counts_areas_and_categories() {
        let yesterday = today().pred_opt().unwrap();
        let cs = [
            at("a", 0.0, 0.0).with_area("North").with_tag("alarm"),
            at("b", 0.0, 0.001)
                .with_area("South")
                .with_tag("sprinkler")
                .with_due_date(yesterday),
            at("c", 0.001, 0.0)
                .with_area("North")
                .with_tag("alarm")
                .with_due_date(yesterday),
        ];
        let s = EfficiencyScorer::new(GeoPoint::new(0.0, 0.0))
            .score(&refs(&cs), today())
            .unwrap();
        assert_eq!(s.primary_area, "North");
        assert_eq!(s.categories, vec!["alarm".to_string(), "sprinkler".to_string()]);
        assert_eq!(s.overdue_count, 2);
        assert_eq!(s.upcoming_count, 1);
    }

    #[test]
    fn primary_area_tie_is_alphabetical() {
        assert_eq!(primary_area(["b", "a", "b", "a"].into_iter()), "a");
        assert_eq!(primary_area(std::iter::empty()), "");
    }
}
