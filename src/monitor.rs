//! Monitoring pipeline: fetch, extract, detect, persist, alert.
//!
//! Products are processed sequentially within a pass. A failure on one
//! product is logged and the pass moves on; alert dispatch failure never
//! rolls back history writes.

use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::detector::{self, WINDOW_DAYS};
use crate::error::Result;
use crate::extract;
use crate::fetcher::FetchController;
use crate::models::{canonical_url, extract_catalog_id, PriceDropEvent, Product};
use crate::notifier::{render_subject, EmailNotifier, Notifier};
use crate::repository::Repository;

/// Outcome of one monitoring pass, for the summary log line.
#[derive(Debug, Default)]
pub struct PassSummary {
    pub products_checked: usize,
    pub failures: usize,
    pub significant_events: usize,
    pub alert_sent: bool,
}

pub struct Monitor {
    repo: Repository,
    fetcher: FetchController,
    notifier: Option<Box<dyn Notifier>>,
    threshold_percent: f64,
    base_url: String,
}

impl Monitor {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let repo = Repository::connect(&config.database.url).await?;
        let fetcher =
            FetchController::new(&config.amazon, config.tracking.delay_between_requests_secs)?;
        let notifier = EmailNotifier::from_config(&config.email)
            .map(|n| Box::new(n) as Box<dyn Notifier>);

        if notifier.is_none() {
            warn!("email credentials missing, alerts disabled");
        }

        Ok(Self {
            repo,
            fetcher,
            notifier,
            threshold_percent: config.tracking.price_drop_threshold_percent,
            base_url: config.amazon.base_url.clone(),
        })
    }

    /// Assembles a monitor from already-built parts.
    pub fn from_parts(
        repo: Repository,
        fetcher: FetchController,
        notifier: Option<Box<dyn Notifier>>,
        threshold_percent: f64,
        base_url: String,
    ) -> Self {
        Self {
            repo,
            fetcher,
            notifier,
            threshold_percent,
            base_url,
        }
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Registers a product for tracking. The URL is canonicalized first and
    /// the page is fetched once to seed title and initial price history.
    /// Re-adding an existing URL updates the product in place.
    pub async fn add_product(
        &mut self,
        url: &str,
        target_price: Option<f64>,
    ) -> Result<Product> {
        let url = canonical_url(url, &self.base_url);
        let catalog_id = extract_catalog_id(&url)?;

        let body = self.fetcher.fetch(&url).await?;
        let snapshot = extract::snapshot(&catalog_id, &url, &body);

        let product_id = self
            .repo
            .create_or_update_product(&url, &snapshot.title, &catalog_id, target_price)
            .await?;

        for observation in &snapshot.sellers {
            self.repo
                .append_price_history_at(
                    product_id,
                    &observation.seller,
                    observation.price,
                    &snapshot.availability,
                    snapshot.fetched_at,
                )
                .await?;
        }

        info!(
            product_id,
            title = %snapshot.title,
            sellers = snapshot.sellers.len(),
            "product added"
        );

        self.repo
            .get_product(product_id)
            .await?
            .ok_or(crate::error::TrackerError::ProductNotFound { id: product_id })
    }

    /// Checks one product: fetch, extract, compare against the trailing
    /// window minimum, then append every observation to history. History is
    /// written after detection so the new prices never feed their own
    /// comparison.
    pub async fn check_product(&mut self, product: &Product) -> Result<Vec<PriceDropEvent>> {
        let catalog_id = product.catalog_id.clone().unwrap_or_default();
        let body = self.fetcher.fetch(&product.url).await?;
        let snapshot = extract::snapshot(&catalog_id, &product.url, &body);

        let since = Utc::now() - Duration::days(WINDOW_DAYS);
        let previous_min = self.repo.min_price_since(product.id, since).await?;

        let events = detector::detect(product, &snapshot, previous_min);

        // One fetch, one timestamp: every observation of this snapshot shares
        // its fetched_at instant in history.
        for observation in &snapshot.sellers {
            self.repo
                .append_price_history_at(
                    product.id,
                    &observation.seller,
                    observation.price,
                    &snapshot.availability,
                    snapshot.fetched_at,
                )
                .await?;
        }

        self.repo.touch_last_checked(product.id).await?;

        Ok(events)
    }

    /// One pass over every active product.
    pub async fn run_pass(&mut self) -> Result<PassSummary> {
        let products = self.repo.list_active_products().await?;
        let mut summary = PassSummary {
            products_checked: products.len(),
            ..PassSummary::default()
        };
        let mut all_events = Vec::new();

        for product in &products {
            match self.check_product(product).await {
                Ok(events) => all_events.extend(events),
                Err(e) => {
                    warn!(product_id = product.id, url = %product.url, error = %e, "product check failed");
                    summary.failures += 1;
                }
            }
        }

        let significant: Vec<PriceDropEvent> = all_events
            .into_iter()
            .filter(|e| detector::is_significant(e, self.threshold_percent))
            .collect();
        summary.significant_events = significant.len();

        if !significant.is_empty() {
            if let Some(notifier) = &self.notifier {
                match notifier.notify(&significant).await {
                    Ok(()) => {
                        summary.alert_sent = true;
                        let subject = render_subject(significant.len());
                        for event in &significant {
                            self.repo
                                .record_notification(
                                    event.product_id,
                                    &subject,
                                    notifier.recipient(),
                                )
                                .await?;
                        }
                    }
                    Err(e) => error!(error = %e, "alert dispatch failed"),
                }
            }
        }

        info!(
            checked = summary.products_checked,
            failures = summary.failures,
            significant = summary.significant_events,
            alert_sent = summary.alert_sent,
            "monitoring pass completed"
        );

        Ok(summary)
    }
}
