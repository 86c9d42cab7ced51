//! Page extraction pipeline: price text normalization, ordered-fallback
//! field extraction, and seller aggregation.

pub mod page;
pub mod price;
pub mod selectors;
pub mod sellers;

use chrono::Utc;

use crate::models::ProductSnapshot;

/// Runs the full extraction pipeline over one fetched page body and produces
/// the snapshot consumed by the change detector.
pub fn snapshot(catalog_id: &str, url: &str, body: &str) -> ProductSnapshot {
    let fields = page::extract(body);
    let sellers = sellers::aggregate(body, &fields);

    ProductSnapshot {
        catalog_id: catalog_id.to_string(),
        url: url.to_string(),
        title: fields.title,
        availability: fields.availability,
        sellers,
        fetched_at: Utc::now(),
    }
}
