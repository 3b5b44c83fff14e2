//! Route recommendation: candidates in, ranked routes out.
//!
//! # Stages
//!
//! 1. **Filter** to candidates with a finite location and a due date no later
//!    than `days_ahead` from today (overdue ones included).
//! 2. **Cluster** with DBSCAN at `cluster_radius_km`. If nothing forms, retry
//!    once at twice the radius.
//! 3. **Fall back** to grouping by area label when there are fewer eligible
//!    candidates than `min_cluster_size`, when both passes come back empty, or
//!    when clustering hits its query cap.
//! 4. **Score** every group with [`EfficiencyScorer`]. Groups larger than
//!    `max_customers_per_route` are trimmed to the members nearest their
//!    centroid, or split by proximity when they also exceed
//!    `max_driving_time_minutes`.
//! 5. **Rank** by efficiency score, descending, and number the results.
//!
//! The pipeline keeps no state between runs: the same candidates, config and
//! date always give the same, identically ordered report.

mod config;
mod diagnostics;

pub use config::RecommendationConfig;
pub use diagnostics::Diagnostics;

use crate::candidate::ServiceCandidate;
use crate::cluster::{Clustering, Dbscan, ProximityPartition};
use crate::error::Result;
use crate::geo::GeoPoint;
use crate::score::{ClusterScore, EfficiencyScorer};
use chrono::{Days, NaiveDate};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One suggested route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Rank position, `0` being the most efficient.
    pub id: usize,
    /// Member ids, in input order.
    pub customer_ids: Vec<String>,
    /// Metrics for the members.
    #[serde(flatten)]
    pub score: ClusterScore,
    /// Grouped by area label rather than by spatial clustering.
    pub is_area_based: bool,
}

/// Output of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationReport {
    /// Routes, best first.
    pub recommendations: Vec<Recommendation>,
    /// How the run got there.
    pub diagnostics: Diagnostics,
}

impl RecommendationReport {
    /// No routes were recommended.
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

/// A group of eligible-candidate indices awaiting scoring.
#[derive(Debug, Clone)]
struct Group {
    members: Vec<usize>,
    area_based: bool,
}

/// A scored group that survived the size and time rules.
#[derive(Debug, Clone)]
struct Route {
    members: Vec<usize>,
    score: ClusterScore,
    area_based: bool,
}

/// What happened to one group during scoring.
#[derive(Debug, Default)]
struct Evaluated {
    routes: Vec<Route>,
    trimmed: Option<usize>,
    split: bool,
}

/// Validated pipeline, reusable across runs.
#[derive(Debug, Clone)]
pub struct RecommendationPipeline {
    config: RecommendationConfig,
}

impl RecommendationPipeline {
    /// Validate `config` and build a pipeline.
    pub fn new(config: RecommendationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration in use.
    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    /// Rank candidate routes as of `today`.
    pub fn run(&self, candidates: &[ServiceCandidate], today: NaiveDate) -> RecommendationReport {
        let cfg = &self.config;
        let mut diag = Diagnostics {
            total_candidates: candidates.len(),
            ..Diagnostics::default()
        };

        let (eligible, points) = self.filter(candidates, today, &mut diag);
        diag.eligible = eligible.len();
        if eligible.is_empty() {
            info!(
                "recommend: 0 of {} candidates eligible ({} unlocated, {} without due date, {} outside window)",
                diag.total_candidates,
                diag.missing_coordinates,
                diag.missing_due_date,
                diag.outside_window
            );
            return RecommendationReport {
                recommendations: Vec::new(),
                diagnostics: diag,
            };
        }

        let groups = self.group(&eligible, &points, &mut diag);

        let origin = cfg
            .dispatch_origin
            .or_else(|| GeoPoint::centroid(&points))
            .unwrap_or(points[0]);
        let scorer = EfficiencyScorer::new(origin)
            .with_service_minutes_per_stop(cfg.service_time_minutes_per_stop)
            .with_weights(cfg.weights.clone());

        #[cfg(feature = "parallel")]
        let evaluated: Vec<Evaluated> = groups
            .par_iter()
            .map(|g| self.evaluate(g, &eligible, &points, &scorer, today))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let evaluated: Vec<Evaluated> = groups
            .iter()
            .map(|g| self.evaluate(g, &eligible, &points, &scorer, today))
            .collect();

        let mut routes = Vec::new();
        for ev in evaluated {
            if let Some(n) = ev.trimmed {
                diag.clusters_trimmed += 1;
                diag.candidates_trimmed += n;
            }
            if ev.split {
                diag.clusters_split += 1;
            }
            routes.extend(ev.routes);
        }

        // Stable: equal scores keep discovery order.
        routes.sort_by(|a, b| b.score.efficiency_score.cmp(&a.score.efficiency_score));

        let recommendations: Vec<Recommendation> = routes
            .into_iter()
            .enumerate()
            .map(|(id, r)| Recommendation {
                id,
                customer_ids: r.members.iter().map(|&i| eligible[i].id.clone()).collect(),
                score: r.score,
                is_area_based: r.area_based,
            })
            .collect();

        diag.clustered = recommendations.iter().map(|r| r.customer_ids.len()).sum();
        diag.unclustered = diag.eligible - diag.clustered;

        info!(
            "recommend: {} candidates, {} eligible, {} routes covering {} (area fallback: {})",
            diag.total_candidates,
            diag.eligible,
            recommendations.len(),
            diag.clustered,
            diag.used_area_fallback
        );

        RecommendationReport {
            recommendations,
            diagnostics: diag,
        }
    }

    /// Eligible candidates and their locations, in input order.
    fn filter<'a>(
        &self,
        candidates: &'a [ServiceCandidate],
        today: NaiveDate,
        diag: &mut Diagnostics,
    ) -> (Vec<&'a ServiceCandidate>, Vec<GeoPoint>) {
        let horizon = today
            .checked_add_days(Days::new(u64::from(self.config.days_ahead)))
            .unwrap_or(NaiveDate::MAX);

        let mut eligible = Vec::new();
        let mut points = Vec::new();
        for c in candidates {
            let Some(location) = c.location() else {
                diag.missing_coordinates += 1;
                continue;
            };
            match c.next_due_date {
                None => diag.missing_due_date += 1,
                Some(due) if due > horizon => diag.outside_window += 1,
                Some(_) => {
                    eligible.push(c);
                    points.push(location);
                }
            }
        }
        (eligible, points)
    }

    /// Candidate groups: DBSCAN clusters, or area groups as a fallback.
    fn group(
        &self,
        eligible: &[&ServiceCandidate],
        points: &[GeoPoint],
        diag: &mut Diagnostics,
    ) -> Vec<Group> {
        let cfg = &self.config;

        if eligible.len() < cfg.min_cluster_size {
            debug!(
                "recommend: {} eligible < min_cluster_size {}, grouping by area",
                eligible.len(),
                cfg.min_cluster_size
            );
            diag.used_area_fallback = true;
            return area_groups(eligible);
        }

        let mut clusters = self.dbscan(points, cfg.cluster_radius_km);
        if matches!(&clusters, Ok(c) if c.is_empty()) {
            debug!(
                "recommend: no clusters at {}km, retrying at {}km",
                cfg.cluster_radius_km,
                cfg.cluster_radius_km * 2.0
            );
            diag.radius_expanded = true;
            clusters = self.dbscan(points, cfg.cluster_radius_km * 2.0);
        }

        match clusters {
            Ok(clusters) if !clusters.is_empty() => {
                diag.clusters_found = clusters.len();
                clusters
                    .into_iter()
                    .map(|members| Group {
                        members,
                        area_based: false,
                    })
                    .collect()
            }
            Ok(_) => {
                debug!("recommend: no spatial clusters, grouping by area");
                diag.used_area_fallback = true;
                area_groups(eligible)
            }
            Err(e) => {
                warn!("recommend: clustering abandoned ({e}), grouping by area");
                diag.clustering_aborted = true;
                diag.used_area_fallback = true;
                area_groups(eligible)
            }
        }
    }

    fn dbscan(&self, points: &[GeoPoint], radius_km: f64) -> Result<Vec<Vec<usize>>> {
        let mut dbscan = Dbscan::new(radius_km, self.config.min_cluster_size);
        if let Some(limit) = self.config.max_region_queries {
            dbscan = dbscan.with_max_region_queries(limit);
        }
        dbscan.cluster(points)
    }

    /// Score one group and apply the size and time limits.
    fn evaluate(
        &self,
        group: &Group,
        eligible: &[&ServiceCandidate],
        points: &[GeoPoint],
        scorer: &EfficiencyScorer,
        today: NaiveDate,
    ) -> Evaluated {
        let cfg = &self.config;
        let score_of = |members: &[usize]| {
            let cs: Vec<&ServiceCandidate> = members.iter().map(|&i| eligible[i]).collect();
            scorer.score(&cs, today)
        };
        let route = |members: Vec<usize>, score: ClusterScore| Route {
            members,
            score,
            area_based: group.area_based,
        };

        let Some(score) = score_of(&group.members) else {
            return Evaluated::default();
        };
        trace!(
            "recommend: group of {} scored {} ({:.0} min, {:.1} km)",
            group.members.len(),
            score.efficiency_score,
            score.estimated_minutes,
            score.estimated_km
        );

        let size = group.members.len();
        let max = cfg.max_customers_per_route;
        if size <= max {
            return Evaluated {
                routes: vec![route(group.members.clone(), score)],
                ..Evaluated::default()
            };
        }

        if score.estimated_minutes > cfg.max_driving_time_minutes {
            let parts = self.split(&group.members, points);
            debug!(
                "recommend: split group of {size} ({:.0} min) into {} parts",
                score.estimated_minutes,
                parts.len()
            );
            let routes = parts
                .into_iter()
                .filter_map(|members| score_of(&members).map(|s| route(members, s)))
                .collect();
            return Evaluated {
                routes,
                split: true,
                ..Evaluated::default()
            };
        }

        let kept = nearest_to(&group.members, points, &score.centroid, max);
        debug!("recommend: trimmed group of {size} to {max}");
        let routes = score_of(&kept)
            .map(|s| vec![route(kept, s)])
            .unwrap_or_default();
        Evaluated {
            routes,
            trimmed: Some(size - max),
            split: false,
        }
    }

    /// Partition `members` into proximity groups of at most
    /// `max_customers_per_route`, as eligible-candidate indices.
    fn split(&self, members: &[usize], points: &[GeoPoint]) -> Vec<Vec<usize>> {
        let sub: Vec<GeoPoint> = members.iter().map(|&i| points[i]).collect();
        ProximityPartition::new(self.config.max_customers_per_route)
            .partition(&sub)
            .into_iter()
            .map(|part| part.into_iter().map(|j| members[j]).collect())
            .collect()
    }
}

/// Rank candidate routes in one call.
///
/// ```rust
/// use chrono::NaiveDate;
/// use loci::{recommend_routes, RecommendationConfig, ServiceCandidate};
///
/// let today = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
/// let due = today + chrono::Days::new(10);
/// let candidates: Vec<ServiceCandidate> = (0..5)
///     .map(|i| {
///         ServiceCandidate::new(format!("c{i}"), 59.91 + i as f64 * 0.001, 10.75)
///             .with_due_date(due)
///     })
///     .collect();
///
/// let report = recommend_routes(&candidates, &RecommendationConfig::default(), today).unwrap();
/// assert_eq!(report.recommendations.len(), 1);
/// assert_eq!(report.recommendations[0].customer_ids.len(), 5);
/// ```
pub fn recommend_routes(
    candidates: &[ServiceCandidate],
    config: &RecommendationConfig,
    today: NaiveDate,
) -> Result<RecommendationReport> {
    Ok(RecommendationPipeline::new(config.clone())?.run(candidates, today))
}

/// Groups of at least two sharing an area label, by label order.
fn area_groups(eligible: &[&ServiceCandidate]) -> Vec<Group> {
    let mut by_area: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, c) in eligible.iter().enumerate() {
        by_area.entry(c.area_label.as_str()).or_default().push(i);
    }
    by_area
        .into_values()
        .filter(|members| members.len() >= 2)
        .map(|members| Group {
            members,
            area_based: true,
        })
        .collect()
}

/// The `k` members nearest `center`, returned in ascending index order.
fn nearest_to(members: &[usize], points: &[GeoPoint], center: &GeoPoint, k: usize) -> Vec<usize> {
    let mut by_dist: Vec<(f64, usize)> = members
        .iter()
        .map(|&i| (center.distance_km(&points[i]), i))
        .collect();
    by_dist.sort_by(|a, b| match a.0.total_cmp(&b.0) {
        Ordering::Equal => a.1.cmp(&b.1),
        ord => ord,
    });
    let mut kept: Vec<usize> = by_dist.into_iter().take(k).map(|(_, i)| i).collect();
    kept.sort_unstable();
    kept
}
