use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::sync::LazyLock;

use crate::error::{Result, TrackerError};

pub const TITLE_NOT_FOUND: &str = "Title not found";
pub const STATUS_UNKNOWN: &str = "Status unknown";

/// Ordered catalog-ID patterns, most specific first. The last one matches a
/// bare 10-char path segment and only fires when the earlier forms miss.
static CATALOG_ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"/dp/([A-Z0-9]{10})",
        r"/gp/product/([A-Z0-9]{10})",
        r"asin=([A-Z0-9]{10})",
        r"/([A-Z0-9]{10})(?:/|$)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("catalog id pattern"))
    .collect()
});

/// A tracked product row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Product {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub catalog_id: Option<String>,
    pub target_price: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub last_checked: Option<DateTime<Utc>>,
    pub is_active: bool,
}

/// One seller's price as seen in a single fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SellerObservation {
    pub seller: String,
    pub price: f64,
    pub shipping: String,
    pub prime: bool,
}

/// Offer entry recovered from embedded JSON-LD product metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredOffer {
    pub seller: String,
    pub price: f64,
}

impl From<&StructuredOffer> for SellerObservation {
    fn from(offer: &StructuredOffer) -> Self {
        SellerObservation {
            seller: offer.seller.clone(),
            price: offer.price,
            shipping: "Unknown".to_string(),
            prime: false,
        }
    }
}

/// The aggregated, normalized result of one fetch. Constructed once per fetch
/// attempt and immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductSnapshot {
    pub catalog_id: String,
    pub url: String,
    pub title: String,
    pub availability: String,
    pub sellers: Vec<SellerObservation>,
    pub fetched_at: DateTime<Utc>,
}

/// A sub-minimum price observation, emitted by the change detector.
/// Ephemeral: rendered into an alert and logged, never stored as a row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceDropEvent {
    pub product_id: i64,
    pub product_title: String,
    pub seller: String,
    pub current_price: f64,
    pub previous_min_price: f64,
    pub price_drop: f64,
    pub percentage_drop: f64,
    pub target_price: Option<f64>,
    pub is_target_reached: bool,
}

/// Strips tracking parameters and expands a bare catalog ID into a full
/// product URL.
pub fn canonical_url(input: &str, base_url: &str) -> String {
    let url = if input.starts_with("http") {
        input.to_string()
    } else if input.len() == 10 {
        format!("{}/dp/{}", base_url.trim_end_matches('/'), input)
    } else {
        input.to_string()
    };

    let without_query = url.split('?').next().unwrap_or(&url);
    let without_fragment = without_query.split('#').next().unwrap_or(without_query);
    without_fragment.to_string()
}

/// Resolves the 10-character catalog ID from a product URL via the ordered
/// pattern list. Fails the whole add operation when nothing matches.
pub fn extract_catalog_id(url: &str) -> Result<String> {
    for pattern in CATALOG_ID_PATTERNS.iter() {
        if let Some(captures) = pattern.captures(url) {
            if let Some(id) = captures.get(1) {
                return Ok(id.as_str().to_string());
            }
        }
    }
    Err(TrackerError::InvalidProductUrl {
        url: url.to_string(),
    })
}
