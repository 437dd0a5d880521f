//! In-memory [`Storefront`] over a JSON catalog snapshot.
//!
//! The snapshot mirrors the usual shop tables: users, orders, order items and
//! inventory items (one row per physical unit, `sold_at` set once sold).
//! Every lookup is a scan; the snapshot is immutable after loading, so a
//! `Catalog` can be shared across threads freely.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{
    OrderRecord, OrderStatus, ProductRecord, SalesSummary, StockLevel, StoreError, StoreResult,
    Storefront, TopProduct,
};

// ── Rows ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: i64,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub shipped_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub delivered_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub num_of_item: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    #[serde(default)]
    pub product_category: String,
    #[serde(default)]
    pub product_brand: String,
    #[serde(default)]
    pub product_department: String,
    #[serde(default)]
    pub product_sku: String,
    #[serde(default)]
    pub product_retail_price: f64,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub sold_at: Option<NaiveDateTime>,
}

// ── Catalog ─────────────────────────────────────────────────────────────

/// Immutable shop snapshot implementing [`Storefront`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    #[serde(default)]
    pub inventory_items: Vec<InventoryItem>,
}

impl Catalog {
    /// Parse a catalog from JSON text. `origin` names the source in errors.
    pub fn from_json(json: &str, origin: &str) -> StoreResult<Self> {
        serde_json::from_str(json).map_err(|e| StoreError::Parse {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let catalog = Self::from_json(&content, &path.display().to_string())?;
        tracing::info!(
            path = %path.display(),
            users = catalog.users.len(),
            orders = catalog.orders.len(),
            inventory = catalog.inventory_items.len(),
            "catalog loaded"
        );
        Ok(catalog)
    }

    fn customer_name(&self, user_id: i64) -> Option<String> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| format!("{} {}", u.first_name, u.last_name))
    }
}

/// Case-insensitive substring match, as SQL `ILIKE '%needle%'`.
fn name_contains(name: &str, needle: &str) -> bool {
    name.to_lowercase().contains(&needle.to_lowercase())
}

impl Storefront for Catalog {
    fn top_selling_products(&self, limit: usize) -> StoreResult<Vec<TopProduct>> {
        let mut totals: BTreeMap<&str, (u64, f64)> = BTreeMap::new();
        for item in self.inventory_items.iter().filter(|i| i.sold_at.is_some()) {
            let entry = totals.entry(item.product_name.as_str()).or_default();
            entry.0 += 1;
            entry.1 += item.product_retail_price;
        }

        let mut ranked: Vec<TopProduct> = totals
            .into_iter()
            .map(|(name, (units_sold, revenue))| TopProduct {
                name: name.to_string(),
                units_sold,
                revenue,
            })
            .collect();
        // Stable sort keeps name order among equal revenues.
        ranked.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
        ranked.truncate(limit);
        Ok(ranked)
    }

    fn order_status(&self, order_id: i64) -> StoreResult<Option<OrderStatus>> {
        let Some(order) = self.orders.iter().find(|o| o.order_id == order_id) else {
            return Ok(None);
        };

        let item_count = self
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .count() as u64;

        Ok(Some(OrderStatus {
            order_id: order.order_id,
            status: order.status.clone(),
            customer_name: order.user_id.and_then(|id| self.customer_name(id)),
            item_count,
            created_at: order.created_at,
            shipped_at: order.shipped_at,
            delivered_at: order.delivered_at,
        }))
    }

    fn stock_levels(&self, name_filter: Option<&str>) -> StoreResult<Vec<StockLevel>> {
        let mut groups: BTreeMap<(&str, &str, &str), (u64, u64)> = BTreeMap::new();
        let matching = self.inventory_items.iter().filter(|i| match name_filter {
            Some(needle) if !needle.is_empty() => name_contains(&i.product_name, needle),
            _ => true,
        });
        for item in matching {
            let key = (
                item.product_name.as_str(),
                item.product_category.as_str(),
                item.product_brand.as_str(),
            );
            let entry = groups.entry(key).or_default();
            entry.0 += 1;
            if item.sold_at.is_some() {
                entry.1 += 1;
            }
        }

        Ok(groups
            .into_iter()
            .map(|((name, category, brand), (total, sold))| StockLevel {
                name: name.to_string(),
                available: total - sold,
                total,
                category: category.to_string(),
                brand: brand.to_string(),
            })
            .collect())
    }

    fn orders_for_customer(&self, user_id: i64) -> StoreResult<Vec<OrderRecord>> {
        let mut orders: Vec<OrderRecord> = self
            .orders
            .iter()
            .filter(|o| o.user_id == Some(user_id))
            .map(|o| OrderRecord {
                order_id: o.order_id,
                status: o.status.clone(),
                item_count: o.num_of_item,
                created_at: o.created_at,
            })
            .collect();
        // Newest first. Undated orders sort last, unlike SQL `ORDER BY
        // created_at DESC`, which puts NULLs first.
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    fn product_details(&self, name_filter: &str) -> StoreResult<Vec<ProductRecord>> {
        Ok(self
            .inventory_items
            .iter()
            .filter(|i| name_contains(&i.product_name, name_filter))
            .map(|i| ProductRecord {
                name: i.product_name.clone(),
                category: i.product_category.clone(),
                brand: i.product_brand.clone(),
                department: i.product_department.clone(),
                sku: i.product_sku.clone(),
                retail_price: i.product_retail_price,
                cost: i.cost,
            })
            .collect())
    }

    fn sales_summary(&self) -> StoreResult<SalesSummary> {
        let total_revenue = self
            .inventory_items
            .iter()
            .filter(|i| i.sold_at.is_some())
            .map(|i| i.product_retail_price)
            .sum();
        let distinct: BTreeSet<&str> = self
            .inventory_items
            .iter()
            .map(|i| i.product_name.as_str())
            .collect();

        Ok(SalesSummary {
            order_count: self.orders.len() as u64,
            total_revenue,
            customer_count: self.users.len() as u64,
            distinct_product_count: distinct.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "users": [
            {"id": 1, "first_name": "Ada", "last_name": "Lovelace"},
            {"id": 2, "first_name": "Alan", "last_name": "Turing"}
        ],
        "orders": [
            {"order_id": 10, "user_id": 1, "status": "delivered",
             "created_at": "2024-01-05T09:15:00", "num_of_item": 2},
            {"order_id": 11, "user_id": 1, "status": "shipped",
             "created_at": "2024-02-01T12:00:00", "num_of_item": 1},
            {"order_id": 12, "user_id": 1, "status": "processing", "num_of_item": 1},
            {"order_id": 20, "status": "cancelled", "num_of_item": 1}
        ],
        "order_items": [
            {"id": 1, "order_id": 10, "product_id": 100},
            {"id": 2, "order_id": 10, "product_id": 200},
            {"id": 3, "order_id": 11, "product_id": 100}
        ],
        "inventory_items": [
            {"id": 1, "product_id": 100, "product_name": "Classic Tee",
             "product_category": "Tops", "product_brand": "Acme",
             "product_retail_price": 20.0, "cost": 8.0, "sold_at": "2024-01-05T10:00:00"},
            {"id": 2, "product_id": 100, "product_name": "Classic Tee",
             "product_category": "Tops", "product_brand": "Acme",
             "product_retail_price": 20.0, "cost": 8.0, "sold_at": "2024-02-01T13:00:00"},
            {"id": 3, "product_id": 100, "product_name": "Classic Tee",
             "product_category": "Tops", "product_brand": "Acme",
             "product_retail_price": 20.0, "cost": 8.0},
            {"id": 4, "product_id": 200, "product_name": "Wool Coat",
             "product_category": "Outerwear", "product_brand": "Northwind",
             "product_retail_price": 150.0, "cost": 70.0, "sold_at": "2024-01-05T10:00:00"},
            {"id": 5, "product_id": 300, "product_name": "Silk Scarf",
             "product_category": "Accessories", "product_brand": "Acme",
             "product_retail_price": 35.5, "cost": 12.0}
        ]
    }"#;

    fn catalog() -> Catalog {
        Catalog::from_json(FIXTURE, "fixture").unwrap()
    }

    #[test]
    fn top_products_ranked_by_revenue() {
        let top = catalog().top_selling_products(5).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Wool Coat");
        assert_eq!(top[0].revenue, 150.0);
        assert_eq!(top[1].name, "Classic Tee");
        assert_eq!(top[1].units_sold, 2);
        assert_eq!(top[1].revenue, 40.0);

        assert_eq!(catalog().top_selling_products(1).unwrap().len(), 1);
    }

    #[test]
    fn order_status_joins_customer_and_items() {
        let status = catalog().order_status(10).unwrap().unwrap();
        assert_eq!(status.customer_name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(status.item_count, 2);
        assert_eq!(status.status, "delivered");

        let anonymous = catalog().order_status(20).unwrap().unwrap();
        assert_eq!(anonymous.customer_name, None);
        assert_eq!(anonymous.item_count, 0);

        assert!(catalog().order_status(999).unwrap().is_none());
    }

    #[test]
    fn stock_levels_count_unsold_units() {
        let stock = catalog().stock_levels(Some("classic")).unwrap();
        assert_eq!(stock.len(), 1);
        assert_eq!(stock[0].total, 3);
        assert_eq!(stock[0].available, 1);
        assert_eq!(stock[0].brand, "Acme");

        assert_eq!(catalog().stock_levels(None).unwrap().len(), 3);
        assert!(catalog().stock_levels(Some("red shoes")).unwrap().is_empty());
    }

    /// Order 12 has no `created_at` and comes after the dated orders.
    #[test]
    fn customer_orders_newest_first() {
        let orders = catalog().orders_for_customer(1).unwrap();
        let ids: Vec<i64> = orders.iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![11, 10, 12]);
        assert!(catalog().orders_for_customer(2).unwrap().is_empty());
    }

    #[test]
    fn product_details_match_case_insensitively() {
        let products = catalog().product_details("SILK").unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].retail_price, 35.5);
    }

    #[test]
    fn sales_summary_aggregates() {
        let summary = catalog().sales_summary().unwrap();
        assert_eq!(summary.order_count, 4);
        assert_eq!(summary.total_revenue, 190.0);
        assert_eq!(summary.customer_count, 2);
        assert_eq!(summary.distinct_product_count, 3);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Catalog::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Catalog::from_json("{ not json", "inline").unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }
}
