//! Field extraction from a parsed product page.

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::price::parse_price;
use super::selectors;
use crate::models::{STATUS_UNKNOWN, StructuredOffer, TITLE_NOT_FOUND};

/// Everything the extractor pulls from one page. Missing fields carry
/// sentinels instead of errors; the pipeline never raises on a miss.
#[derive(Debug, Clone, PartialEq)]
pub struct PageFields {
    pub title: String,
    pub main_price: Option<f64>,
    pub availability: String,
    pub structured_offers: Vec<StructuredOffer>,
}

/// Applies the ordered selector strategies to a page body.
///
/// Extraction is deterministic: the same body always yields the same fields.
pub fn extract(body: &str) -> PageFields {
    let document = Html::parse_document(body);

    let title = first_text(&document, &selectors::TITLE)
        .unwrap_or_else(|| TITLE_NOT_FOUND.to_string());

    let availability = first_text(&document, &selectors::AVAILABILITY)
        .unwrap_or_else(|| STATUS_UNKNOWN.to_string());

    // The structured-data scan runs regardless of whether the primary
    // strategies succeeded; the aggregator uses it as a third price source.
    let structured_offers = extract_structured_offers(&document);

    PageFields {
        title,
        main_price: extract_main_price(&document),
        availability,
        structured_offers,
    }
}

/// First selector in the list yielding non-empty text wins.
pub(crate) fn first_text(document: &Html, candidates: &[Selector]) -> Option<String> {
    for selector in candidates {
        if let Some(element) = document.select(selector).next() {
            let text = element.text().collect::<String>().trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Walks the main-price selectors until one yields parseable price text.
fn extract_main_price(document: &Html) -> Option<f64> {
    for selector in selectors::MAIN_PRICE.iter() {
        for element in document.select(selector) {
            let text = element.text().collect::<String>();
            if let Some(price) = parse_price(&text) {
                return Some(price);
            }
        }
    }
    None
}

/// Scans embedded JSON-LD blocks for `@type == "Product"` offer entries.
/// Unparseable blocks are skipped silently, matching the rest of the
/// degrade-to-nothing extraction policy.
fn extract_structured_offers(document: &Html) -> Vec<StructuredOffer> {
    let mut offers = Vec::new();

    for script in document.select(&selectors::JSON_LD) {
        let raw = script.text().collect::<String>();
        let Ok(data) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };

        if data.get("@type").and_then(Value::as_str) != Some("Product") {
            continue;
        }

        match data.get("offers") {
            Some(Value::Array(entries)) => {
                offers.extend(entries.iter().filter_map(parse_offer));
            }
            Some(entry @ Value::Object(_)) => {
                offers.extend(parse_offer(entry));
            }
            _ => {}
        }
    }

    debug!(count = offers.len(), "structured-data offers parsed");
    offers
}

/// An offer without a resolvable, non-negative price is discarded.
fn parse_offer(offer: &Value) -> Option<StructuredOffer> {
    let seller = offer
        .get("seller")
        .and_then(|s| s.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    let price = match offer.get("price") {
        Some(Value::Number(n)) => n.as_f64()?,
        Some(Value::String(s)) => s.trim().parse().ok()?,
        _ => return None,
    };

    if price < 0.0 {
        return None;
    }

    Some(StructuredOffer { seller, price })
}
