//! CSS selectors for Amazon product pages.
//!
//! Each field gets an ordered fallback list: the same data shows up in
//! several competing subtrees across page layouts, and the list order encodes
//! extraction confidence from most to least reliable. Update here when the
//! markup shifts.

use scraper::Selector;
use std::sync::LazyLock;

fn parse(selector: &str) -> Selector {
    Selector::parse(selector).expect("static selector")
}

/// Product title candidates, tried in order.
pub static TITLE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    vec![
        parse("#productTitle"),
        parse(".product-title"),
        parse("h1.a-size-large"),
        parse(r#"[data-feature-name="title"] h1"#),
    ]
});

/// Main price candidates, tried in order.
pub static MAIN_PRICE: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    vec![
        parse(".a-price-current .a-offscreen"),
        parse(".a-price .a-offscreen"),
        parse("#corePrice_feature_div .a-price .a-offscreen"),
        parse(".a-price-whole"),
    ]
});

/// Stock status candidates, tried in order.
pub static AVAILABILITY: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    vec![
        parse("#availability span"),
        parse(".a-color-success"),
        parse(".a-color-state"),
        parse(r#"[data-feature-name="availability"] span"#),
    ]
});

/// Offer blocks in the "More Buying Choices" panel.
pub static OFFER_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| parse("#aod-offer-list [data-aod-offer-id]"));

/// Per-offer sub-selectors.
pub static OFFER_SELLER: LazyLock<Selector> = LazyLock::new(|| parse(r#"[aria-label*="seller"]"#));

pub static OFFER_PRICE: LazyLock<Selector> = LazyLock::new(|| parse(".a-price .a-offscreen"));

pub static OFFER_SHIPPING: LazyLock<Selector> =
    LazyLock::new(|| parse(r#"[data-csa-c-content-id="aod-delivery-price"]"#));

pub static OFFER_PRIME: LazyLock<Selector> = LazyLock::new(|| parse(".aod-prime-logo"));

/// Embedded machine-readable metadata blocks.
pub static JSON_LD: LazyLock<Selector> =
    LazyLock::new(|| parse(r#"script[type="application/ld+json"]"#));
