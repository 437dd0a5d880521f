//! The closed set of intents a support message can be routed to.

use serde::{Deserialize, Serialize};

/// Classified purpose of a customer-support message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// "top 5 best selling products": ranking of products by revenue.
    TopProducts,
    /// "status of order 4521": tracking a single order.
    OrderStatus,
    /// "how many classic tees left in stock": inventory for a product.
    StockLevels,
    /// "orders for user 12": order history of one customer.
    CustomerOrders,
    /// "tell me about the classic tee": catalog details of a product.
    ProductDetails,
    /// "sales summary": store-wide aggregates.
    SalesSummary,
    /// Nothing matched; answered with the capabilities overview.
    General,
}

impl Intent {
    /// Intents that have match rules, in matching priority order.
    pub const PRIORITY: [Intent; 6] = [
        Intent::TopProducts,
        Intent::OrderStatus,
        Intent::StockLevels,
        Intent::CustomerOrders,
        Intent::ProductDetails,
        Intent::SalesSummary,
    ];

    /// Stable snake_case identifier, as used in logs and enhancement context.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopProducts => "top_products",
            Self::OrderStatus => "order_status",
            Self::StockLevels => "stock_levels",
            Self::CustomerOrders => "customer_orders",
            Self::ProductDetails => "product_details",
            Self::SalesSummary => "sales_summary",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
