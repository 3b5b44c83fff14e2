use crate::error::{Error, Result};
use crate::geo::GeoPoint;
use crate::score::ScoreWeights;
use serde::{Deserialize, Serialize};

/// Parameters for one recommendation run.
///
/// Deserializes from camelCase JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecommendationConfig {
    /// Due-date horizon in days from the current date (default: 60).
    pub days_ahead: u32,
    /// Largest route (default: 15).
    pub max_customers_per_route: usize,
    /// Longest acceptable shift in minutes (default: 480).
    pub max_driving_time_minutes: f64,
    /// DBSCAN `min_points`, and the eligible count below which clustering is
    /// skipped (default: 3).
    pub min_cluster_size: usize,
    /// DBSCAN epsilon in km (default: 5).
    pub cluster_radius_km: f64,
    /// On-site minutes per stop (default: 30).
    pub service_time_minutes_per_stop: f64,
    /// Where routes start and end. `None` uses the centroid of the eligible
    /// candidates.
    pub dispatch_origin: Option<GeoPoint>,
    /// Efficiency heuristic weights.
    pub weights: ScoreWeights,
    /// Cap on DBSCAN neighbourhood queries per clustering pass
    /// (default: 200 000).
    pub max_region_queries: Option<usize>,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            days_ahead: 60,
            max_customers_per_route: 15,
            max_driving_time_minutes: 480.0,
            min_cluster_size: 3,
            cluster_radius_km: 5.0,
            service_time_minutes_per_stop: 30.0,
            dispatch_origin: None,
            weights: ScoreWeights::default(),
            max_region_queries: Some(200_000),
        }
    }
}

impl RecommendationConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the due-date horizon.
    pub fn with_days_ahead(mut self, days: u32) -> Self {
        self.days_ahead = days;
        self
    }

    /// Set the maximum route size.
    pub fn with_max_customers_per_route(mut self, n: usize) -> Self {
        self.max_customers_per_route = n;
        self
    }

    /// Set the maximum shift length.
    pub fn with_max_driving_time_minutes(mut self, minutes: f64) -> Self {
        self.max_driving_time_minutes = minutes;
        self
    }

    /// Set the minimum cluster size.
    pub fn with_min_cluster_size(mut self, n: usize) -> Self {
        self.min_cluster_size = n;
        self
    }

    /// Set the clustering radius.
    pub fn with_cluster_radius_km(mut self, km: f64) -> Self {
        self.cluster_radius_km = km;
        self
    }

    /// Set on-site minutes per stop.
    pub fn with_service_time_minutes_per_stop(mut self, minutes: f64) -> Self {
        self.service_time_minutes_per_stop = minutes;
        self
    }

    /// Set the dispatch origin.
    pub fn with_dispatch_origin(mut self, origin: GeoPoint) -> Self {
        self.dispatch_origin = Some(origin);
        self
    }

    /// Set heuristic weights.
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set (or clear) the clustering query cap.
    pub fn with_max_region_queries(mut self, limit: Option<usize>) -> Self {
        self.max_region_queries = limit;
        self
    }

    /// Reject configurations the algorithms cannot interpret.
    pub fn validate(&self) -> Result<()> {
        if self.min_cluster_size == 0 {
            return Err(invalid("min_cluster_size", "must be at least 1"));
        }
        if !self.cluster_radius_km.is_finite() || self.cluster_radius_km <= 0.0 {
            return Err(invalid("cluster_radius_km", "must be positive and finite"));
        }
        if self.max_customers_per_route < 2 {
            return Err(invalid("max_customers_per_route", "must be at least 2"));
        }
        non_negative("max_driving_time_minutes", self.max_driving_time_minutes)?;
        non_negative(
            "service_time_minutes_per_stop",
            self.service_time_minutes_per_stop,
        )?;
        if let Some(origin) = self.dispatch_origin {
            if !origin.is_valid() {
                return Err(Error::InvalidCoordinate {
                    lat: origin.lat,
                    lng: origin.lng,
                });
            }
        }
        if self.max_region_queries == Some(0) {
            return Err(invalid("max_region_queries", "must be at least 1"));
        }

        let w = &self.weights;
        non_negative("weights.density_scale", w.density_scale)?;
        non_negative("weights.start_distance_weight", w.start_distance_weight)?;
        non_negative("weights.spread_weight", w.spread_weight)?;
        non_negative("weights.output_scale", w.output_scale)?;
        non_negative("weights.routing_inefficiency", w.routing_inefficiency)?;
        positive("weights.transit_speed_kmh", w.transit_speed_kmh)?;
        positive("weights.local_speed_kmh", w.local_speed_kmh)?;
        positive("weights.min_area_km2", w.min_area_km2)?;
        Ok(())
    }
}

fn invalid(name: &'static str, message: &'static str) -> Error {
    Error::InvalidParameter { name, message }
}

fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, "must be finite and non-negative"))
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, "must be positive and finite"))
    }
}
