use serde::{Deserialize, Serialize};

/// Counters explaining how a run got from its input to its output.
///
/// An empty recommendation list is never an error; these numbers are what a
/// caller shows the user instead ("12 customers have no coordinates").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// Candidates passed in.
    pub total_candidates: usize,
    /// Excluded: no finite coordinate.
    pub missing_coordinates: usize,
    /// Excluded: located, but no due date.
    pub missing_due_date: usize,
    /// Excluded: due after the horizon.
    pub outside_window: usize,
    /// Passed filtering.
    pub eligible: usize,
    /// Eligible and part of some recommendation.
    pub clustered: usize,
    /// Eligible but in no recommendation (noise, small groups, trimmed).
    pub unclustered: usize,
    /// Clusters produced by DBSCAN, before scoring.
    pub clusters_found: usize,
    /// The first clustering pass found nothing and the radius was doubled.
    pub radius_expanded: bool,
    /// Recommendations came from area labels, not spatial clusters.
    pub used_area_fallback: bool,
    /// Clustering hit its query cap and was abandoned.
    pub clustering_aborted: bool,
    /// Oversized clusters cut down to their members nearest the centroid.
    pub clusters_trimmed: usize,
    /// Members removed by trimming.
    pub candidates_trimmed: usize,
    /// Oversized, over-time clusters split into several routes.
    pub clusters_split: usize,
}

impl Diagnostics {
    /// Candidates excluded for a missing or out-of-window due date.
    pub fn excluded_for_due_date(&self) -> usize {
        self.missing_due_date + self.outside_window
    }
}
