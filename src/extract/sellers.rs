//! Seller aggregation across the page's price sources.

use scraper::{ElementRef, Html};
use tracing::debug;

use super::page::PageFields;
use super::price::parse_price;
use super::selectors;
use crate::models::SellerObservation;

/// Combines the primary offer, the "More Buying Choices" offer blocks, and
/// the structured-data offers into one ordered seller list.
///
/// Order is deterministic: primary seller first (when the main price
/// resolved), then each DOM offer block, then the structured-data recovery
/// entries. The structured offers are appended only when DOM parsing produced
/// at most one entry; that branch may re-introduce a seller the DOM already
/// captured, which is a documented trade-off of the recovery path, and
/// downstream consumers must tolerate the duplicates.
pub fn aggregate(body: &str, fields: &PageFields) -> Vec<SellerObservation> {
    let document = Html::parse_document(body);
    let mut sellers = Vec::new();

    if let Some(main_price) = fields.main_price {
        sellers.push(SellerObservation {
            seller: "Amazon".to_string(),
            price: main_price,
            shipping: "Free".to_string(),
            prime: true,
        });
    }

    for block in document.select(&selectors::OFFER_BLOCK) {
        if let Some(observation) = parse_offer_block(block) {
            sellers.push(observation);
        }
    }

    if sellers.len() <= 1 {
        debug!(
            dom_sellers = sellers.len(),
            structured = fields.structured_offers.len(),
            "falling back to structured-data offers"
        );
        sellers.extend(fields.structured_offers.iter().map(SellerObservation::from));
    }

    sellers
}

/// Parses one offer block. An offer without a resolvable price is dropped
/// before it can reach persistence.
fn parse_offer_block(block: ElementRef<'_>) -> Option<SellerObservation> {
    let price = block
        .select(&selectors::OFFER_PRICE)
        .next()
        .and_then(|e| parse_price(&e.text().collect::<String>()))?;

    let seller = block
        .select(&selectors::OFFER_SELLER)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());

    let shipping = block
        .select(&selectors::OFFER_SHIPPING)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let prime = block.select(&selectors::OFFER_PRIME).next().is_some();

    Some(SellerObservation {
        seller,
        price,
        shipping,
        prime,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::page::extract;
    use crate::models::StructuredOffer;

    fn offer_block(id: u32, seller: &str, price: &str, prime: bool) -> String {
        format!(
            r#"<div data-aod-offer-id="{id}">
                <span aria-label="sold by seller">{seller}</span>
                <span class="a-price"><span class="a-offscreen">{price}</span></span>
                <span data-csa-c-content-id="aod-delivery-price">$4.99 delivery</span>
                {prime_logo}
            </div>"#,
            prime_logo = if prime {
                r#"<i class="aod-prime-logo"></i>"#
            } else {
                ""
            },
        )
    }

    fn page_with_offers(main_price: Option<&str>, offers: &[String]) -> String {
        let price_block = main_price
            .map(|p| {
                format!(
                    r#"<span class="a-price"><span class="a-offscreen">{p}</span></span>"#
                )
            })
            .unwrap_or_default();
        format!(
            r#"<html><body>
                <span id="productTitle">Widget</span>
                {price_block}
                <div id="aod-offer-list">{}</div>
            </body></html>"#,
            offers.join("\n"),
        )
    }

    #[test]
    fn test_primary_seller_first() {
        let body = page_with_offers(
            Some("$99.99"),
            &[
                offer_block(1, "Shop B", "$95.00", false),
                offer_block(2, "Shop C", "$97.50", true),
            ],
        );
        let fields = extract(&body);
        let sellers = aggregate(&body, &fields);

        assert_eq!(sellers.len(), 3);
        assert_eq!(sellers[0].seller, "Amazon");
        assert_eq!(sellers[0].price, 99.99);
        assert!(sellers[0].prime);
        assert_eq!(sellers[1].seller, "Shop B");
        assert_eq!(sellers[1].shipping, "$4.99 delivery");
        assert!(!sellers[1].prime);
        assert_eq!(sellers[2].seller, "Shop C");
        assert!(sellers[2].prime);
    }

    #[test]
    fn test_no_primary_when_main_price_unresolved() {
        let body = page_with_offers(
            None,
            &[
                offer_block(1, "Shop B", "$95.00", false),
                offer_block(2, "Shop C", "$97.50", false),
            ],
        );
        let fields = extract(&body);
        let sellers = aggregate(&body, &fields);

        assert_eq!(sellers.len(), 2);
        assert_eq!(sellers[0].seller, "Shop B");
    }

    #[test]
    fn test_priceless_offer_dropped() {
        let offers = vec![
            offer_block(1, "Shop B", "Currently unavailable", false),
            offer_block(2, "Shop C", "$20.00", false),
        ];
        let body = page_with_offers(Some("$25.00"), &offers);
        let fields = extract(&body);
        let sellers = aggregate(&body, &fields);

        assert_eq!(sellers.len(), 2);
        assert_eq!(sellers[1].seller, "Shop C");
    }

    #[test]
    fn test_structured_fallback_when_dom_sparse() {
        // Main price resolves but no DOM offers: exactly one entry, so the
        // structured offers are appended as the recovery path.
        let body = page_with_offers(Some("$30.00"), &[]);
        let mut fields = extract(&body);
        fields.structured_offers = vec![
            StructuredOffer {
                seller: "Amazon".to_string(),
                price: 30.0,
            },
            StructuredOffer {
                seller: "Recovered Shop".to_string(),
                price: 28.5,
            },
        ];

        let sellers = aggregate(&body, &fields);
        assert_eq!(sellers.len(), 3);
        // The duplicate "Amazon" entry is allowed in this branch.
        assert_eq!(sellers[0].seller, "Amazon");
        assert_eq!(sellers[1].seller, "Amazon");
        assert_eq!(sellers[2].seller, "Recovered Shop");
    }

    #[test]
    fn test_structured_offers_not_appended_when_dom_sufficient() {
        let body = page_with_offers(
            Some("$30.00"),
            &[offer_block(1, "Shop B", "$29.00", false)],
        );
        let mut fields = extract(&body);
        fields.structured_offers = vec![StructuredOffer {
            seller: "Should Not Appear".to_string(),
            price: 1.0,
        }];

        let sellers = aggregate(&body, &fields);
        assert_eq!(sellers.len(), 2);
        assert!(sellers.iter().all(|s| s.seller != "Should Not Appear"));
    }

    #[test]
    fn test_zero_source_page_yields_empty_list() {
        let body = "<html><body><p>redesigned page</p></body></html>";
        let fields = extract(body);
        let sellers = aggregate(body, &fields);
        assert!(sellers.is_empty());
    }

    #[test]
    fn test_offer_missing_seller_name_defaults_unknown() {
        let offers = vec![format!(
            r#"<div data-aod-offer-id="1">
                <span class="a-price"><span class="a-offscreen">$10.00</span></span>
            </div>"#
        )];
        let body = page_with_offers(None, &offers);
        let fields = extract(&body);
        let sellers = aggregate(&body, &fields);

        assert_eq!(sellers.len(), 1);
        assert_eq!(sellers[0].seller, "Unknown");
        assert_eq!(sellers[0].shipping, "Unknown");
    }
}
