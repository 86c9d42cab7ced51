//! Durable store for products, price history, and notification history.
//!
//! Three tables: products (unique on URL), price_history (append-only,
//! keyed to a product), notification_history (append-only). History rows are
//! never updated or deleted after insert, so the time series stays an
//! accurate audit trail even when extraction logic changes.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{FromRow, SqlitePool};
use tracing::info;

use crate::error::Result;
use crate::models::Product;

/// One product with aggregate history stats, for listings.
#[derive(Debug, Clone, FromRow)]
pub struct ProductListing {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
    pub catalog_id: Option<String>,
    pub target_price: Option<f64>,
    pub last_checked: Option<DateTime<Utc>>,
    pub price_records: i64,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub avg_price: Option<f64>,
}

/// Raw price_history row, for inspection in tests.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct HistoryRow {
    pub seller_name: String,
    pub price: f64,
    pub timestamp: DateTime<Utc>,
}

pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Opens the store and creates the schema when missing. A single
    /// connection matches the sequential one-writer processing model.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;

        let repo = Self { pool };
        repo.init_schema().await?;
        Ok(repo)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                url TEXT UNIQUE NOT NULL,
                title TEXT,
                catalog_id TEXT,
                target_price REAL,
                created_at TIMESTAMP NOT NULL,
                last_checked TIMESTAMP,
                is_active BOOLEAN NOT NULL DEFAULT TRUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL,
                seller_name TEXT NOT NULL,
                price REAL NOT NULL,
                availability TEXT,
                timestamp TIMESTAMP NOT NULL,
                FOREIGN KEY (product_id) REFERENCES products (id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS notification_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                product_id INTEGER NOT NULL,
                subject TEXT NOT NULL,
                sent_to TEXT NOT NULL,
                sent_at TIMESTAMP NOT NULL,
                FOREIGN KEY (product_id) REFERENCES products (id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        info!("database schema ready");
        Ok(())
    }

    /// Upserts a product by its canonical URL and returns the row id. An
    /// existing row keeps its creation time, history, and active flag.
    pub async fn create_or_update_product(
        &self,
        url: &str,
        title: &str,
        catalog_id: &str,
        target_price: Option<f64>,
    ) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (url, title, catalog_id, target_price, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                catalog_id = excluded.catalog_id,
                target_price = excluded.target_price
            RETURNING id
            "#,
        )
        .bind(url)
        .bind(title)
        .bind(catalog_id)
        .bind(target_price)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    /// Appends one observation row. Append-only by contract.
    pub async fn append_price_history(
        &self,
        product_id: i64,
        seller: &str,
        price: f64,
        availability: &str,
    ) -> Result<()> {
        self.append_price_history_at(product_id, seller, price, availability, Utc::now())
            .await
    }

    pub(crate) async fn append_price_history_at(
        &self,
        product_id: i64,
        seller: &str,
        price: f64,
        availability: &str,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO price_history (product_id, seller_name, price, availability, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(product_id)
        .bind(seller)
        .bind(price)
        .bind(availability)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub(crate) async fn history_rows(&self, product_id: i64) -> Result<Vec<HistoryRow>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            "SELECT seller_name, price, timestamp FROM price_history WHERE product_id = ? ORDER BY id",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Minimum recorded price for a product since the given instant, or
    /// `f64::INFINITY` when no records fall in the window.
    pub async fn min_price_since(&self, product_id: i64, since: DateTime<Utc>) -> Result<f64> {
        let min: Option<f64> = sqlx::query_scalar(
            "SELECT MIN(price) FROM price_history WHERE product_id = ? AND timestamp > ?",
        )
        .bind(product_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(min.unwrap_or(f64::INFINITY))
    }

    /// Active products in monitoring order. Inactive products are excluded
    /// from monitoring entirely.
    pub async fn list_active_products(&self) -> Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, url, title, catalog_id, target_price, created_at, last_checked, is_active
            FROM products
            WHERE is_active = TRUE
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, url, title, catalog_id, target_price, created_at, last_checked, is_active
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    pub async fn touch_last_checked(&self, product_id: i64) -> Result<()> {
        sqlx::query("UPDATE products SET last_checked = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Logs a dispatched alert. Independent of history writes: a dispatch
    /// failure never rolls these or the history rows back.
    pub async fn record_notification(
        &self,
        product_id: i64,
        subject: &str,
        sent_to: &str,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO notification_history (product_id, subject, sent_to, sent_at) VALUES (?, ?, ?, ?)",
        )
        .bind(product_id)
        .bind(subject)
        .bind(sent_to)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Active products with aggregate price stats, newest first.
    pub async fn list_products(&self) -> Result<Vec<ProductListing>> {
        let listings = sqlx::query_as::<_, ProductListing>(
            r#"
            SELECT p.id, p.url, p.title, p.catalog_id, p.target_price, p.last_checked,
                   COUNT(ph.id) AS price_records,
                   MIN(ph.price) AS min_price,
                   MAX(ph.price) AS max_price,
                   AVG(ph.price) AS avg_price
            FROM products p
            LEFT JOIN price_history ph ON p.id = ph.product_id
            WHERE p.is_active = TRUE
            GROUP BY p.id
            ORDER BY p.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(listings)
    }

    pub async fn notification_count(&self, product_id: i64) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notification_history WHERE product_id = ?")
                .bind(product_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
