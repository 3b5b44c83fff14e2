use chrono::NaiveDate;
use loci::{convex_hull, GeoPoint, RecommendationConfig, RecommendationPipeline, ServiceCandidate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows each pipeline decision.
    env_logger::init();

    // Three neighbourhoods around Oslo plus a few records the filter rejects.
    let candidates: Vec<ServiceCandidate> = serde_json::from_str(
        r#"[
        {"id":"g1","lat":59.9275,"lng":10.7590,"nextDueDate":"2024-09-05","areaLabel":"Grünerløkka","categoryTags":["sprinkler"]},
        {"id":"g2","lat":59.9290,"lng":10.7610,"nextDueDate":"2024-08-20","areaLabel":"Grünerløkka","categoryTags":["alarm"]},
        {"id":"g3","lat":59.9262,"lng":10.7565,"nextDueDate":"2024-09-30","areaLabel":"Grünerløkka"},
        {"id":"g4","lat":59.9301,"lng":10.7552,"nextDueDate":"2024-10-10","areaLabel":"Grünerløkka","categoryTags":["alarm"]},
        {"id":"f1","lat":59.9220,"lng":10.6950,"nextDueDate":"2024-09-12","areaLabel":"Frogner"},
        {"id":"f2","lat":59.9205,"lng":10.7010,"nextDueDate":"2024-09-14","areaLabel":"Frogner","categoryTags":["extinguisher"]},
        {"id":"f3","lat":59.9241,"lng":10.6985,"nextDueDate":"2024-09-01","areaLabel":"Frogner"},
        {"id":"s1","lat":59.8700,"lng":10.8100,"nextDueDate":"2024-09-20","areaLabel":"Lambertseter"},
        {"id":"s2","lat":59.8690,"lng":10.8130,"nextDueDate":"2024-09-21","areaLabel":"Lambertseter"},
        {"id":"s3","lat":59.8720,"lng":10.8080,"nextDueDate":"2024-09-22","areaLabel":"Lambertseter"},
        {"id":"x1","lat":null,"lng":null,"nextDueDate":"2024-09-10"},
        {"id":"x2","lat":59.9100,"lng":10.7500},
        {"id":"x3","lat":59.9110,"lng":10.7520,"nextDueDate":"2025-03-01"}
    ]"#,
    )?;

    let config = RecommendationConfig::default()
        .with_dispatch_origin(GeoPoint::new(59.9139, 10.7522))
        .with_cluster_radius_km(2.0);
    let pipeline = RecommendationPipeline::new(config)?;

    let today = NaiveDate::from_ymd_opt(2024, 8, 28).ok_or("bad date")?;
    let report = pipeline.run(&candidates, today);

    let d = &report.diagnostics;
    println!(
        "candidates={} eligible={} unlocated={} excluded_by_date={} unclustered={}",
        d.total_candidates,
        d.eligible,
        d.missing_coordinates,
        d.excluded_for_due_date(),
        d.unclustered
    );

    for rec in &report.recommendations {
        let members: Vec<GeoPoint> = rec
            .customer_ids
            .iter()
            .filter_map(|id| candidates.iter().find(|c| &c.id == id))
            .filter_map(ServiceCandidate::location)
            .collect();
        let hull = convex_hull(&members);

        println!(
            "#{} {:<12} score={:>3} stops={} overdue={} {:.0} min {:.1} km hull={} vertices{}",
            rec.id,
            rec.score.primary_area,
            rec.score.efficiency_score,
            rec.customer_ids.len(),
            rec.score.overdue_count,
            rec.score.estimated_minutes,
            rec.score.estimated_km,
            hull.len(),
            if rec.is_area_based { " (by area)" } else { "" }
        );
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
