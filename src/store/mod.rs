//! Business-data collaborator: the lookups and aggregates the pipeline needs.
//!
//! The pipeline only depends on the [`Storefront`] trait. [`catalog::Catalog`]
//! is an in-memory implementation backed by a JSON snapshot; a database-backed
//! implementation lives with the host.

pub mod catalog;

use chrono::NaiveDateTime;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use catalog::Catalog;

// ── Errors ──────────────────────────────────────────────────────────────

/// Errors raised by a [`Storefront`] implementation.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("failed to read catalog file: {path}")]
    #[diagnostic(
        code(shopdesk::store::io),
        help("Check that the catalog file exists and is readable.")
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file {path}: {message}")]
    #[diagnostic(
        code(shopdesk::store::parse),
        help(
            "The catalog must be a JSON object with `users`, `orders`, `order_items` \
             and `inventory_items` arrays. Missing arrays default to empty."
        )
    )]
    Parse { path: String, message: String },

    #[error("data source unavailable: {message}")]
    #[diagnostic(
        code(shopdesk::store::unavailable),
        help("The backing data source could not be reached. Try again later.")
    )]
    Unavailable { message: String },

    #[error("query failed: {message}")]
    #[diagnostic(
        code(shopdesk::store::query),
        help("The data source rejected the lookup. Check the stored data for consistency.")
    )]
    Query { message: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ── Records ─────────────────────────────────────────────────────────────

/// One row of the best-sellers ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub name: String,
    pub units_sold: u64,
    pub revenue: f64,
}

/// Current state of a single order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub order_id: i64,
    pub status: String,
    pub customer_name: Option<String>,
    pub item_count: u64,
    pub created_at: Option<NaiveDateTime>,
    pub shipped_at: Option<NaiveDateTime>,
    pub delivered_at: Option<NaiveDateTime>,
}

/// Inventory position of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevel {
    pub name: String,
    pub available: u64,
    pub total: u64,
    pub category: String,
    pub brand: String,
}

/// One order in a customer's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: i64,
    pub status: String,
    pub item_count: u64,
    pub created_at: Option<NaiveDateTime>,
}

/// Catalog facts about a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub name: String,
    pub category: String,
    pub brand: String,
    pub department: String,
    pub sku: String,
    pub retail_price: f64,
    pub cost: f64,
}

/// Store-wide aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SalesSummary {
    pub order_count: u64,
    pub total_revenue: f64,
    pub customer_count: u64,
    pub distinct_product_count: u64,
}

// ── Storefront ──────────────────────────────────────────────────────────

/// Lookups and aggregates over e-commerce data.
///
/// Calls are synchronous; implementations impose their own timeouts and retry
/// policy. Any error is treated uniformly by the pipeline as a data-access
/// failure.
pub trait Storefront: Send + Sync {
    /// Best-selling products by revenue, highest first, at most `limit`.
    fn top_selling_products(&self, limit: usize) -> StoreResult<Vec<TopProduct>>;

    /// Status of one order, or `None` if it does not exist.
    fn order_status(&self, order_id: i64) -> StoreResult<Option<OrderStatus>>;

    /// Stock per product, optionally filtered by a name fragment.
    fn stock_levels(&self, name_filter: Option<&str>) -> StoreResult<Vec<StockLevel>>;

    /// A customer's orders, most recent first. Orders without a creation
    /// time come last.
    fn orders_for_customer(&self, user_id: i64) -> StoreResult<Vec<OrderRecord>>;

    /// Product records whose name contains `name_filter`.
    fn product_details(&self, name_filter: &str) -> StoreResult<Vec<ProductRecord>>;

    /// Store-wide aggregates.
    fn sales_summary(&self) -> StoreResult<SalesSummary>;
}
