//! Deterministic response synthesis: structured results in, display text out.
//!
//! One pure function per intent outcome, plus the capabilities overview for
//! unmatched messages and a fixed-sentence error formatter. Output uses light
//! markdown (bold headings, numbered or bulleted lists).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::store::{OrderRecord, OrderStatus, ProductRecord, SalesSummary, StockLevel, TopProduct};

// ── Fixed sentences ─────────────────────────────────────────────────────

pub const NO_SALES_DATA: &str = "I couldn't find any sales data for products at the moment.";
pub const ORDER_NOT_FOUND: &str =
    "I couldn't find that order. Please check the order ID and try again.";
pub const NO_STOCK_INFO: &str = "I couldn't find any stock information for that product.";
pub const NO_CUSTOMER_ORDERS: &str = "I couldn't find any orders for that user.";
pub const NO_PRODUCT_INFO: &str = "I couldn't find any information about that product.";

/// Orders shown for one customer before the "...and N more" note.
pub const ORDERS_DISPLAY_CAP: usize = 5;

const TIMESTAMP_FORMAT: &str = "%B %d, %Y at %I:%M %p";
const DATE_FORMAT: &str = "%B %d, %Y";

// ── Number helpers ──────────────────────────────────────────────────────

/// Group an integer with thousands separators: `1234567` → `1,234,567`.
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Dollar amount with thousands separators and two decimals: `$1,234.50`.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${}.{:02}", group_thousands(cents / 100), cents % 100)
}

/// Capitalize the first letter of every word: `in transit` → `In Transit`.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for ch in s.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.extend(ch.to_lowercase());
        }
        at_word_start = !ch.is_alphabetic();
    }
    out
}

fn timestamp(t: &NaiveDateTime) -> String {
    t.format(TIMESTAMP_FORMAT).to_string()
}

// ── Intent outcomes ─────────────────────────────────────────────────────

pub fn format_top_products(products: &[TopProduct]) -> String {
    if products.is_empty() {
        return NO_SALES_DATA.to_string();
    }

    let mut out = String::from("Here are the top selling products:\n\n");
    for (i, product) in products.iter().enumerate() {
        out.push_str(&format!("{}. **{}**\n", i + 1, product.name));
        out.push_str(&format!(
            "   - Total Sold: {} units\n",
            group_thousands(product.units_sold)
        ));
        out.push_str(&format!(
            "   - Revenue: {}\n\n",
            format_currency(product.revenue)
        ));
    }
    out.trim_end().to_string()
}

pub fn format_order_status(status: Option<&OrderStatus>) -> String {
    let Some(status) = status else {
        return ORDER_NOT_FOUND.to_string();
    };

    let mut out = format!("**Order #{} Status:**\n\n", status.order_id);
    out.push_str(&format!("**Status:** {}\n", title_case(&status.status)));
    if let Some(name) = &status.customer_name {
        out.push_str(&format!("**Customer:** {name}\n"));
    }
    out.push_str(&format!("**Items:** {}\n", status.item_count));
    if let Some(t) = &status.created_at {
        out.push_str(&format!("**Ordered:** {}\n", timestamp(t)));
    }
    if let Some(t) = &status.shipped_at {
        out.push_str(&format!("**Shipped:** {}\n", timestamp(t)));
    }
    if let Some(t) = &status.delivered_at {
        out.push_str(&format!("**Delivered:** {}\n", timestamp(t)));
    }
    out.trim_end().to_string()
}

pub fn format_stock_levels(levels: &[StockLevel]) -> String {
    match levels {
        [] => NO_STOCK_INFO.to_string(),
        [stock] => {
            let mut out = format!("**Stock Information for {}:**\n\n", stock.name);
            out.push_str(&format!(
                "**Available Stock:** {} units\n",
                group_thousands(stock.available)
            ));
            out.push_str(&format!(
                "**Total Inventory:** {} units\n",
                group_thousands(stock.total)
            ));
            out.push_str(&format!("**Category:** {}\n", stock.category));
            out.push_str(&format!("**Brand:** {}", stock.brand));
            out
        }
        many => {
            let mut out = String::from(
                "I found multiple products matching your query. Here are the stock levels:\n\n",
            );
            for stock in many {
                out.push_str(&format!("**{}**\n", stock.name));
                out.push_str(&format!(
                    "  - Available: {} units\n",
                    group_thousands(stock.available)
                ));
                out.push_str(&format!("  - Category: {}\n", stock.category));
                out.push_str(&format!("  - Brand: {}\n\n", stock.brand));
            }
            out.trim_end().to_string()
        }
    }
}

pub fn format_customer_orders(orders: &[OrderRecord]) -> String {
    if orders.is_empty() {
        return NO_CUSTOMER_ORDERS.to_string();
    }

    let mut out = String::from("**Recent Orders:**\n\n");
    for (i, order) in orders.iter().take(ORDERS_DISPLAY_CAP).enumerate() {
        out.push_str(&format!("{}. **Order #{}**\n", i + 1, order.order_id));
        out.push_str(&format!("   - Status: {}\n", title_case(&order.status)));
        out.push_str(&format!("   - Items: {}\n", order.item_count));
        if let Some(t) = &order.created_at {
            out.push_str(&format!("   - Date: {}\n", t.format(DATE_FORMAT)));
        }
        out.push('\n');
    }

    if orders.len() > ORDERS_DISPLAY_CAP {
        out.push_str(&format!(
            "...and {} more orders.",
            orders.len() - ORDERS_DISPLAY_CAP
        ));
    }
    out.trim_end().to_string()
}

/// Product details, one block per distinct product name (first record wins).
pub fn format_product_details(products: &[ProductRecord]) -> String {
    if products.is_empty() {
        return NO_PRODUCT_INFO.to_string();
    }

    let mut seen = std::collections::HashSet::new();
    let mut out = String::from("**Product Information:**\n\n");
    for product in products.iter().filter(|p| seen.insert(p.name.as_str())) {
        out.push_str(&format!("**{}**\n", product.name));
        out.push_str(&format!("  - Category: {}\n", product.category));
        out.push_str(&format!("  - Brand: {}\n", product.brand));
        out.push_str(&format!("  - Department: {}\n", product.department));
        out.push_str(&format!("  - SKU: {}\n", product.sku));
        out.push_str(&format!(
            "  - Retail Price: {}\n",
            format_currency(product.retail_price)
        ));
        out.push_str(&format!("  - Cost: {}\n\n", format_currency(product.cost)));
    }
    out.trim_end().to_string()
}

pub fn format_sales_summary(summary: &SalesSummary) -> String {
    let mut out = String::from("**Sales Analytics Overview:**\n\n");
    out.push_str(&format!(
        "**Total Orders:** {}\n",
        group_thousands(summary.order_count)
    ));
    out.push_str(&format!(
        "**Total Revenue:** {}\n",
        format_currency(summary.total_revenue)
    ));
    out.push_str(&format!(
        "**Total Customers:** {}\n",
        group_thousands(summary.customer_count)
    ));
    out.push_str(&format!(
        "**Total Products:** {}\n",
        group_thousands(summary.distinct_product_count)
    ));
    if summary.order_count > 0 {
        let average = summary.total_revenue / summary.order_count as f64;
        out.push_str(&format!(
            "**Average Order Value:** {}\n",
            format_currency(average)
        ));
    }
    out.trim_end().to_string()
}

/// Capabilities overview for messages no rule recognized.
pub fn format_general(message: &str) -> String {
    let mut out = format!("I understand you're asking about: \"{message}\"\n\n");
    out.push_str("I can help you with:\n");
    out.push_str("• **Top products** - See best-selling items (e.g., 'top 5 most sold products')\n");
    out.push_str("• **Order status** - Track orders by ID (e.g., 'order status 12345')\n");
    out.push_str(
        "• **Stock levels** - Check product availability (e.g., 'how many Classic Tees left in stock')\n",
    );
    out.push_str("• **Customer orders** - List a customer's orders (e.g., 'orders for user 42')\n");
    out.push_str(
        "• **Product information** - Ask about specific products (e.g., 'tell me about the Classic Tee')\n",
    );
    out.push_str("• **Sales analytics** - Get a business overview (e.g., 'sales summary')\n\n");
    out.push_str("Please try asking in a different way or be more specific!");
    out
}

// ── Errors ──────────────────────────────────────────────────────────────

/// User-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    OrderNotFound,
    ProductNotFound,
    UserNotFound,
    DataAccess,
    InvalidQuery,
}

impl ErrorKind {
    /// The fixed sentence shown for this kind.
    pub fn message(self) -> &'static str {
        match self {
            Self::OrderNotFound => ORDER_NOT_FOUND,
            Self::ProductNotFound => {
                "I couldn't find that product. Please check the product name and try again."
            }
            Self::UserNotFound => {
                "I couldn't find that user. Please check the user ID and try again."
            }
            Self::DataAccess => {
                "I'm having trouble accessing the database right now. Please try again later."
            }
            Self::InvalidQuery => "I didn't understand your question. Please try rephrasing it.",
        }
    }
}

/// Fixed sentence for `kind`, followed by a `Details:` line when `details`
/// is non-empty.
pub fn format_error(kind: ErrorKind, details: Option<&str>) -> String {
    match details.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => format!("{}\n\nDetails: {d}", kind.message()),
        None => kind.message().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn order(id: i64) -> OrderRecord {
        OrderRecord {
            order_id: id,
            status: "shipped".into(),
            item_count: 1,
            created_at: None,
        }
    }

    #[test]
    fn currency_groups_and_rounds() {
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(1234567.891), "$1,234,567.89");
        assert_eq!(format_currency(999.999), "$1,000.00");
        assert_eq!(format_currency(-12.5), "-$12.50");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(12345678), "12,345,678");
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("in transit"), "In Transit");
        assert_eq!(title_case("SHIPPED"), "Shipped");
    }

    #[test]
    fn empty_results_use_fixed_sentences() {
        assert_eq!(format_top_products(&[]), NO_SALES_DATA);
        assert_eq!(format_order_status(None), ORDER_NOT_FOUND);
        assert_eq!(format_stock_levels(&[]), NO_STOCK_INFO);
        assert_eq!(format_customer_orders(&[]), NO_CUSTOMER_ORDERS);
        assert_eq!(format_product_details(&[]), NO_PRODUCT_INFO);
        assert!(!NO_SALES_DATA.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn top_products_numbered_with_revenue() {
        let text = format_top_products(&[
            TopProduct {
                name: "Wool Coat".into(),
                units_sold: 1200,
                revenue: 180000.0,
            },
            TopProduct {
                name: "Classic Tee".into(),
                units_sold: 3,
                revenue: 59.97,
            },
        ]);
        assert!(text.starts_with("Here are the top selling products:"));
        assert!(text.contains("1. **Wool Coat**"));
        assert!(text.contains("Total Sold: 1,200 units"));
        assert!(text.contains("Revenue: $180,000.00"));
        assert!(text.contains("2. **Classic Tee**"));
        assert!(text.contains("Revenue: $59.97"));
    }

    #[test]
    fn order_status_lists_present_fields_only() {
        let text = format_order_status(Some(&OrderStatus {
            order_id: 4521,
            status: "shipped".into(),
            customer_name: Some("Ada Lovelace".into()),
            item_count: 3,
            created_at: Some(at(2024, 3, 9, 14, 5)),
            shipped_at: None,
            delivered_at: None,
        }));
        assert!(text.contains("**Order #4521 Status:**"));
        assert!(text.contains("**Status:** Shipped"));
        assert!(text.contains("**Customer:** Ada Lovelace"));
        assert!(text.contains("**Items:** 3"));
        assert!(text.contains("**Ordered:** March 09, 2024 at 02:05 PM"));
        assert!(!text.contains("Shipped:**"));
        assert!(!text.contains("Delivered"));
    }

    #[test]
    fn single_stock_record_shows_every_field() {
        let text = format_stock_levels(&[StockLevel {
            name: "Classic Tee".into(),
            available: 12,
            total: 50,
            category: "Tops".into(),
            brand: "Acme".into(),
        }]);
        for needle in ["Classic Tee", "12", "50", "Tops", "Acme"] {
            assert!(text.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn multiple_stock_records_are_listed() {
        let level = |name: &str| StockLevel {
            name: name.into(),
            available: 1,
            total: 2,
            category: "Tops".into(),
            brand: "Acme".into(),
        };
        let text = format_stock_levels(&[level("Classic Tee"), level("Classic Tee Long")]);
        assert!(text.starts_with("I found multiple products"));
        assert!(text.contains("**Classic Tee Long**"));
    }

    #[test]
    fn customer_orders_truncate_with_remainder() {
        let orders: Vec<OrderRecord> = (1..=8).map(order).collect();
        let text = format_customer_orders(&orders);
        assert!(text.contains("5. **Order #5**"));
        assert!(!text.contains("Order #6"));
        assert!(text.ends_with("...and 3 more orders."));

        let text = format_customer_orders(&orders[..5]);
        assert!(!text.contains("more orders"));
    }

    #[test]
    fn customer_order_dates_are_day_precision() {
        let mut o = order(7);
        o.created_at = Some(at(2024, 12, 1, 8, 0));
        let text = format_customer_orders(&[o]);
        assert!(text.contains("Date: December 01, 2024"));
        assert!(!text.contains("08:00"));
    }

    #[test]
    fn product_details_deduplicate_by_name() {
        let record = ProductRecord {
            name: "Classic Tee".into(),
            category: "Tops".into(),
            brand: "Acme".into(),
            department: "Men".into(),
            sku: "CT-001".into(),
            retail_price: 1999.5,
            cost: 8.0,
        };
        let text = format_product_details(&[record.clone(), record]);
        assert_eq!(text.matches("**Classic Tee**").count(), 1);
        assert!(text.contains("Retail Price: $1,999.50"));
        assert!(text.contains("Cost: $8.00"));
    }

    #[test]
    fn sales_summary_average_only_with_orders() {
        let text = format_sales_summary(&SalesSummary {
            order_count: 4,
            total_revenue: 10000.0,
            customer_count: 1500,
            distinct_product_count: 12,
        });
        assert!(text.contains("**Total Orders:** 4"));
        assert!(text.contains("**Total Revenue:** $10,000.00"));
        assert!(text.contains("**Total Customers:** 1,500"));
        assert!(text.contains("**Average Order Value:** $2,500.00"));

        let text = format_sales_summary(&SalesSummary::default());
        assert!(!text.contains("Average"));
    }

    #[test]
    fn general_echoes_message_and_lists_capabilities() {
        let text = format_general("hello there");
        assert!(text.contains("\"hello there\""));
        assert_eq!(text.matches("• **").count(), 6);
        assert!(text.contains("order status 12345"));
    }

    #[test]
    fn error_details_are_optional() {
        assert_eq!(
            format_error(ErrorKind::InvalidQuery, None),
            ErrorKind::InvalidQuery.message()
        );
        assert_eq!(
            format_error(ErrorKind::UserNotFound, Some("  ")),
            ErrorKind::UserNotFound.message()
        );
        let text = format_error(ErrorKind::DataAccess, Some("connection reset"));
        assert!(text.starts_with("I'm having trouble accessing the database"));
        assert!(text.ends_with("\n\nDetails: connection reset"));
    }
}
