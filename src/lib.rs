//! # loci
//!
//! Geographic clustering and route recommendation for field service.
//!
//! Given customer sites with upcoming or overdue service dates, `loci` groups
//! them into geographically coherent candidate routes, estimates what each
//! would cost to drive, and ranks them by dispatch efficiency.
//!
//! - [`geo`]: haversine distance, coordinates, convex hulls for drawing
//!   cluster boundaries.
//! - [`cluster`]: DBSCAN over a grid index, plus a size-bounded proximity
//!   partition.
//! - [`score`]: the efficiency heuristic.
//! - [`pipeline`]: filter, cluster, fall back, score, trim, rank.
//!
//! Everything is synchronous, in-memory and stateless: no I/O, no caching,
//! nothing retained between runs. Concurrent runs need no coordination.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use loci::{GeoPoint, RecommendationConfig, RecommendationPipeline, ServiceCandidate};
//!
//! let today = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
//! let due = NaiveDate::from_ymd_opt(2024, 9, 20).unwrap();
//!
//! let candidates = vec![
//!     ServiceCandidate::new("a", 59.910, 10.750).with_due_date(due),
//!     ServiceCandidate::new("b", 59.912, 10.752).with_due_date(due),
//!     ServiceCandidate::new("c", 59.914, 10.748).with_due_date(due),
//!     ServiceCandidate::new("d", 59.911, 10.755).with_due_date(due),
//! ];
//!
//! let config = RecommendationConfig::default().with_dispatch_origin(GeoPoint::new(59.95, 10.70));
//! let pipeline = RecommendationPipeline::new(config).unwrap();
//! let report = pipeline.run(&candidates, today);
//!
//! assert_eq!(report.recommendations.len(), 1);
//! assert!(report.recommendations[0].score.efficiency_score > 0);
//! ```

pub mod candidate;
pub mod cluster;
/// Error types used across `loci`.
pub mod error;
pub mod geo;
pub mod pipeline;
pub mod score;


pub use candidate::ServiceCandidate;
pub use cluster::{Clustering, Dbscan, GridIndex, ProximityPartition};
pub use error::{Error, Result};
pub use geo::{convex_hull, distance_km, GeoPoint, Polygon};
pub use pipeline::{
    recommend_routes, Diagnostics, Recommendation, RecommendationConfig, RecommendationPipeline,
    RecommendationReport,
};
pub use score::{ClusterScore, EfficiencyScorer, ScoreWeights};
