//! Windowed-minimum price-drop detection.
//!
//! Pure and synchronous: history access happens in the repository, event
//! dispatch in the monitor. Emits every sub-minimum observation; the
//! significance policy is a separate filter applied by the caller.

use crate::models::{PriceDropEvent, Product, ProductSnapshot};

/// Length of the trailing comparison window.
pub const WINDOW_DAYS: i64 = 7;

/// Compares a snapshot against the previous trailing-window minimum.
///
/// `previous_min` is `f64::INFINITY` when no history exists in the window; in
/// that case nothing is emitted, so a first real price is never flagged as a
/// drop. Ties are not drops (strict inequality). Multiple sellers dropping in
/// the same fetch each produce an independent event.
pub fn detect(product: &Product, snapshot: &ProductSnapshot, previous_min: f64) -> Vec<PriceDropEvent> {
    if !previous_min.is_finite() {
        return Vec::new();
    }

    let mut events = Vec::new();

    for observation in &snapshot.sellers {
        if observation.price < previous_min {
            let price_drop = previous_min - observation.price;
            events.push(PriceDropEvent {
                product_id: product.id,
                product_title: product
                    .title
                    .clone()
                    .unwrap_or_else(|| snapshot.title.clone()),
                seller: observation.seller.clone(),
                current_price: observation.price,
                previous_min_price: previous_min,
                price_drop,
                percentage_drop: price_drop / previous_min * 100.0,
                target_price: product.target_price,
                is_target_reached: product
                    .target_price
                    .map(|target| observation.price <= target)
                    .unwrap_or(false),
            });
        }
    }

    events
}

/// The configured significance policy: a drop matters when its percentage
/// meets the threshold or the product's target price was reached.
pub fn is_significant(event: &PriceDropEvent, threshold_percent: f64) -> bool {
    event.percentage_drop >= threshold_percent || event.is_target_reached
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SellerObservation;
    use chrono::Utc;

    fn test_product(target_price: Option<f64>) -> Product {
        Product {
            id: 1,
            url: "https://www.amazon.com/dp/B08N5WRWNW".to_string(),
            title: Some("Widget".to_string()),
            catalog_id: Some("B08N5WRWNW".to_string()),
            target_price,
            created_at: Utc::now(),
            last_checked: None,
            is_active: true,
        }
    }

    fn snapshot_with(prices: &[(&str, f64)]) -> ProductSnapshot {
        ProductSnapshot {
            catalog_id: "B08N5WRWNW".to_string(),
            url: "https://www.amazon.com/dp/B08N5WRWNW".to_string(),
            title: "Widget".to_string(),
            availability: "In Stock".to_string(),
            sellers: prices
                .iter()
                .map(|(seller, price)| SellerObservation {
                    seller: seller.to_string(),
                    price: *price,
                    shipping: "Free".to_string(),
                    prime: false,
                })
                .collect(),
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn test_drop_against_window_minimum() {
        // History [120, 115, 130] in the window: previous minimum 115.
        let product = test_product(None);
        let snapshot = snapshot_with(&[("X", 100.0)]);

        let events = detect(&product, &snapshot, 115.0);
        assert_eq!(events.len(), 1);

        let event = &events[0];
        assert_eq!(event.seller, "X");
        assert_eq!(event.price_drop, 15.0);
        assert!((event.percentage_drop - 13.04).abs() < 0.01);
        assert!(!event.is_target_reached);
    }

    #[test]
    fn test_target_reached_when_configured() {
        let product = test_product(Some(100.0));
        let snapshot = snapshot_with(&[("X", 100.0)]);

        let events = detect(&product, &snapshot, 115.0);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_target_reached);
    }

    #[test]
    fn test_target_not_reached_above_target() {
        // previousMin 100, target 90, new price 95: event emitted (95 < 100)
        // but the target is not reached (95 > 90).
        let product = test_product(Some(90.0));
        let snapshot = snapshot_with(&[("X", 95.0)]);

        let events = detect(&product, &snapshot, 100.0);
        assert_eq!(events.len(), 1);
        assert!(!events[0].is_target_reached);
    }

    #[test]
    fn test_no_event_at_or_above_minimum() {
        let product = test_product(None);

        // Tie: not a drop.
        assert!(detect(&product, &snapshot_with(&[("X", 115.0)]), 115.0).is_empty());
        // Above: not a drop.
        assert!(detect(&product, &snapshot_with(&[("X", 120.0)]), 115.0).is_empty());
    }

    #[test]
    fn test_empty_history_never_flags() {
        let product = test_product(Some(5.0));
        let snapshot = snapshot_with(&[("X", 0.01)]);

        let events = detect(&product, &snapshot, f64::INFINITY);
        assert!(events.is_empty());
    }

    #[test]
    fn test_independent_events_per_seller() {
        let product = test_product(None);
        let snapshot = snapshot_with(&[("X", 100.0), ("Y", 110.0), ("Z", 120.0)]);

        let events = detect(&product, &snapshot, 115.0);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].seller, "X");
        assert_eq!(events[1].seller, "Y");
    }

    #[test]
    fn test_significance_filter() {
        let product = test_product(None);
        let snapshot = snapshot_with(&[("X", 110.0)]);
        let events = detect(&product, &snapshot, 115.0);
        let event = &events[0];

        // ~4.35% drop, below a 5% threshold.
        assert!(!is_significant(event, 5.0));
        assert!(is_significant(event, 4.0));
    }

    #[test]
    fn test_target_reached_is_always_significant() {
        let product = test_product(Some(110.0));
        let snapshot = snapshot_with(&[("X", 110.0)]);
        let events = detect(&product, &snapshot, 115.0);

        assert!(events[0].is_target_reached);
        assert!(is_significant(&events[0], 50.0));
    }

    #[test]
    fn test_title_falls_back_to_snapshot() {
        let mut product = test_product(None);
        product.title = None;
        let snapshot = snapshot_with(&[("X", 100.0)]);

        let events = detect(&product, &snapshot, 115.0);
        assert_eq!(events[0].product_title, "Widget");
    }
}
