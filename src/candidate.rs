//! Service candidates: the geotagged obligations the pipeline groups.

use crate::geo::GeoPoint;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Area label used when a record carries none.
pub const UNKNOWN_AREA: &str = "unknown";

fn default_area() -> String {
    UNKNOWN_AREA.to_string()
}

/// A customer site with an upcoming or overdue service obligation.
///
/// Built fresh from the live dataset for each pipeline run. Coordinates are
/// optional because upstream records often lack a geocode; such candidates
/// are counted and excluded, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCandidate {
    /// Caller's identifier; echoed back in recommendations.
    pub id: String,
    /// Latitude in degrees.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude in degrees.
    #[serde(default)]
    pub lng: Option<f64>,
    /// Next service due date.
    #[serde(default)]
    pub next_due_date: Option<NaiveDate>,
    /// Free-form service area, used for the area-based fallback.
    #[serde(default = "default_area")]
    pub area_label: String,
    /// Service categories (e.g. "fire-alarm", "sprinkler").
    #[serde(default)]
    pub category_tags: BTreeSet<String>,
}

impl ServiceCandidate {
    /// Create a candidate at a known location.
    pub fn new(id: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            lat: Some(lat),
            lng: Some(lng),
            next_due_date: None,
            area_label: default_area(),
            category_tags: BTreeSet::new(),
        }
    }

    /// Set the due date.
    pub fn with_due_date(mut self, date: NaiveDate) -> Self {
        self.next_due_date = Some(date);
        self
    }

    /// Set the area label.
    pub fn with_area(mut self, area: impl Into<String>) -> Self {
        self.area_label = area.into();
        self
    }

    /// Add a category tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let _ = self.category_tags.insert(tag.into());
        self
    }

    /// The location, if both coordinates are present and form a valid
    /// [`GeoPoint`].
    pub fn location(&self) -> Option<GeoPoint> {
        let p = GeoPoint::new(self.lat?, self.lng?);
        p.is_valid().then_some(p)
    }

    /// Due strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.next_due_date.is_some_and(|d| d < today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_requires_valid_coordinates() {
        assert!(ServiceCandidate::new("a", 59.9, 10.7).location().is_some());
        assert!(ServiceCandidate::new("b", f64::NAN, 10.7).location().is_none());
        assert!(ServiceCandidate::new("d", 1e300, 10.7).location().is_none());
        assert!(ServiceCandidate::new("e", 59.9, 190.0).location().is_none());

        let mut c = ServiceCandidate::new("c", 59.9, 10.7);
        c.lng = None;
        assert!(c.location().is_none());
    }

    #[test]
    fn overdue_is_strict() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let due_today = ServiceCandidate::new("a", 0.0, 0.0).with_due_date(today);
        let due_yesterday =
            ServiceCandidate::new("b", 0.0, 0.0).with_due_date(today.pred_opt().unwrap());
        assert!(!due_today.is_overdue(today));
        assert!(due_yesterday.is_overdue(today));
        assert!(!ServiceCandidate::new("c", 0.0, 0.0).is_overdue(today));
    }

    #[test]
    fn deserializes_with_defaults() {
        let c: ServiceCandidate = serde_json::from_str(
            r#"{"id":"42","lat":59.91,"lng":null,"nextDueDate":"2024-05-01"}"#,
        )
        .unwrap();
        assert_eq!(c.area_label, UNKNOWN_AREA);
        assert!(c.category_tags.is_empty());
        assert_eq!(c.lng, None);
        assert_eq!(c.next_due_date, NaiveDate::from_ymd_opt(2024, 5, 1));
    }

    #[test]
    fn deserializes_tags() {
        let c: ServiceCandidate = serde_json::from_str(
            r#"{"id":"7","lat":1.0,"lng":2.0,"areaLabel":"North","categoryTags":["sprinkler","alarm","alarm"]}"#,
        )
        .unwrap();
        assert_eq!(c.area_label, "North");
        assert_eq!(c.category_tags.len(), 2);
        assert_eq!(c.next_due_date, None);
    }
}
