//! Intent matcher: ordered regex rules over lower-cased support messages.
//!
//! Rules are tried in a fixed priority order (the order of [`Intent::PRIORITY`]),
//! and within an intent in declaration order; the first rule whose pattern
//! matches anywhere in the message wins. Patterns overlap on purpose (a generic
//! "... available" or "what is ..." would otherwise swallow more specific
//! questions), so the declaration order below is part of the matcher's contract.
//!
//! A message no rule matches classifies as [`Intent::General`], carrying the
//! normalized message as its only capture. Classification never fails.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use super::intent::Intent;

// ── Rule table ──────────────────────────────────────────────────────────

/// Rule sources in priority order. Each pattern has at most one capture group.
///
/// A capture that closes its pattern runs to the end of its line, ignoring
/// closing punctuation (`[\s?.!]*$`). Rules compile in multi-line mode, so a
/// line break ends the capture rather than failing the match.
const RULE_SOURCES: &[(Intent, &str)] = &[
    // Best-selling products: optional count.
    (
        Intent::TopProducts,
        r"top\s+(\d+)?\s*(?:most\s+)?(?:sold|popular|best\s+selling)\s+products?",
    ),
    (
        Intent::TopProducts,
        r"(?:what\s+are\s+)?(?:the\s+)?(?:top\s+)?(\d+)?\s*(?:most\s+)?(?:sold|popular|best\s+selling)\s+products?",
    ),
    (Intent::TopProducts, r"best\s+selling\s+products?"),
    (Intent::TopProducts, r"most\s+popular\s+products?"),
    // Order status: numeric order id.
    (
        Intent::OrderStatus,
        r"order\s+(?:status|information)\s+(?:for\s+)?(?:order\s+)?(?:id\s+)?(\d+)",
    ),
    (Intent::OrderStatus, r"status\s+of\s+order\s+(?:id\s+)?(\d+)"),
    (
        Intent::OrderStatus,
        r"show\s+me\s+(?:the\s+)?(?:status\s+of\s+)?order\s+(?:id\s+)?(\d+)",
    ),
    (Intent::OrderStatus, r"where\s+is\s+my\s+order\s+(?:id\s+)?(\d+)"),
    (Intent::OrderStatus, r"track\s+order\s+(?:id\s+)?(\d+)"),
    // Stock levels: free-text product name.
    // "how many ... are left" describes rather than names a product: no capture.
    (Intent::StockLevels, r"how\s+many\s+.+?\s+(?:are|is)\s+left\b"),
    (
        Intent::StockLevels,
        concat!(
            r"(?:how\s+many|what\s+is\s+the\s+stock|stock\s+level)\s+(?:of\s+)?(.+?)",
            r"(?:\s+(?:left\s+)?(?:in\s+stock|available))?",
            r"[\s?.!]*$",
        ),
    ),
    (
        Intent::StockLevels,
        concat!(r"stock\s+(?:level|quantity)\s+(?:of\s+)?(.+?)", r"[\s?.!]*$"),
    ),
    (
        Intent::StockLevels,
        concat!(r"available\s+stock\s+(?:of\s+)?(.+?)", r"[\s?.!]*$"),
    ),
    (Intent::StockLevels, r"(.+?)\s+(?:stock|inventory|available)"),
    // Orders by customer: optional numeric customer id.
    (Intent::CustomerOrders, r"my\s+orders?"),
    (
        Intent::CustomerOrders,
        r"orders?\s+(?:for\s+)?(?:user\s+)?(?:id\s+)?(\d+)",
    ),
    (Intent::CustomerOrders, r"customer\s+(\d+)\s+orders?"),
    // Product details: free-text product name.
    (
        Intent::ProductDetails,
        concat!(r"product\s+(?:details|information)\s+(?:for\s+)?(.+?)", r"[\s?.!]*$"),
    ),
    (
        Intent::ProductDetails,
        concat!(r"tell\s+me\s+about\s+(?:the\s+)?(.+?)", r"[\s?.!]*$"),
    ),
    (
        Intent::ProductDetails,
        concat!(r"what\s+is\s+(?:the\s+)?(.+?)", r"[\s?.!]*$"),
    ),
    (Intent::ProductDetails, r"(.+?)\s+(?:product|item|details)"),
    // Sales summary: no slots.
    (
        Intent::SalesSummary,
        r"sales?\s+(?:analytics|statistics|summary|overview)",
    ),
    (
        Intent::SalesSummary,
        r"business\s+(?:analytics|statistics|summary)",
    ),
    (
        Intent::SalesSummary,
        r"overall\s+(?:sales|business)\s+(?:performance|statistics)",
    ),
    (
        Intent::SalesSummary,
        r"company\s+(?:performance|statistics|analytics)",
    ),
];

/// A compiled (intent, pattern) pair.
#[derive(Debug)]
pub struct MatchRule {
    pub intent: Intent,
    pub pattern: Regex,
}

/// Process-wide rule table, compiled once and read-only afterwards.
static RULES: LazyLock<Vec<MatchRule>> = LazyLock::new(|| {
    RULE_SOURCES
        .iter()
        .map(|(intent, src)| MatchRule {
            intent: *intent,
            pattern: RegexBuilder::new(src)
                .multi_line(true)
                .build()
                .expect("valid rule pattern"),
        })
        .collect()
});

/// The compiled rule table in matching order.
pub fn rules() -> &'static [MatchRule] {
    &RULES
}

// ── Classification ──────────────────────────────────────────────────────

/// Outcome of matching one message against the rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The winning intent, or [`Intent::General`] when nothing matched.
    pub intent: Intent,
    /// Capture groups of the winning rule (group 1 onward). For
    /// [`Intent::General`] this is the normalized message.
    pub captures: Vec<Option<String>>,
    /// Index into [`rules()`] of the winning rule.
    pub rule_index: Option<usize>,
}

impl Classification {
    /// Whether a rule matched (i.e. the intent is not the general fallback).
    pub fn is_match(&self) -> bool {
        self.rule_index.is_some()
    }

    /// The first capture group, if it participated in the match.
    pub fn first_capture(&self) -> Option<&str> {
        self.captures.first().and_then(|c| c.as_deref())
    }
}

/// Lower-case and trim a message the way every rule expects it.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Classify a message: first matching rule in priority order wins.
pub fn classify(text: &str) -> Classification {
    let normalized = normalize(text);

    for (index, rule) in rules().iter().enumerate() {
        if let Some(caps) = rule.pattern.captures(&normalized) {
            let captures = caps
                .iter()
                .skip(1)
                .map(|group| group.map(|m| m.as_str().to_string()))
                .collect();
            return Classification {
                intent: rule.intent,
                captures,
                rule_index: Some(index),
            };
        }
    }

    Classification {
        intent: Intent::General,
        captures: vec![Some(normalized)],
        rule_index: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_compile_in_priority_order() {
        let order: Vec<Intent> = rules().iter().map(|r| r.intent).collect();
        let mut expected_rank = 0;
        for intent in order {
            let rank = Intent::PRIORITY
                .iter()
                .position(|i| *i == intent)
                .expect("every rule intent has a priority");
            assert!(rank >= expected_rank, "{intent} declared out of priority order");
            expected_rank = rank;
        }
    }

    #[test]
    fn every_rule_has_at_most_one_capture() {
        for rule in rules() {
            assert!(rule.pattern.captures_len() <= 2, "{}", rule.pattern);
        }
    }

    #[test]
    fn top_products_with_and_without_count() {
        let c = classify("Top 3 best selling products");
        assert_eq!(c.intent, Intent::TopProducts);
        assert_eq!(c.first_capture(), Some("3"));

        let c = classify("what are the most popular products?");
        assert_eq!(c.intent, Intent::TopProducts);
        assert_eq!(c.first_capture(), None);

        let c = classify("best selling products");
        assert_eq!(c.intent, Intent::TopProducts);
        assert_eq!(c.first_capture(), None);
    }

    #[test]
    fn order_status_phrasings() {
        for (text, id) in [
            ("what's the status of order 4521", "4521"),
            ("order status for order id 77", "77"),
            ("show me the status of order 12", "12"),
            ("Where is my order 9001?", "9001"),
            ("track order 31", "31"),
        ] {
            let c = classify(text);
            assert_eq!(c.intent, Intent::OrderStatus, "{text}");
            assert_eq!(c.first_capture(), Some(id), "{text}");
        }
    }

    #[test]
    fn stock_levels_capture_product_before_tail() {
        let c = classify("how many classic tees left in stock");
        assert_eq!(c.intent, Intent::StockLevels);
        assert_eq!(c.first_capture(), Some("classic tees"));

        let c = classify("stock level of Wool Scarf?");
        assert_eq!(c.intent, Intent::StockLevels);
        assert_eq!(c.first_capture(), Some("wool scarf"));

        let c = classify("available stock of denim jacket");
        assert_eq!(c.intent, Intent::StockLevels);
        assert_eq!(c.first_capture(), Some("denim jacket"));
    }

    #[test]
    fn are_left_phrasing_leaves_product_unresolved() {
        let c = classify("how many red shoes are left");
        assert_eq!(c.intent, Intent::StockLevels);
        assert!(c.captures.is_empty());
    }

    #[test]
    fn stock_outranks_product_details() {
        let c = classify("tell me about wireless mouse stock");
        assert_eq!(c.intent, Intent::StockLevels);
        assert_eq!(c.first_capture(), Some("tell me about wireless mouse"));
    }

    #[test]
    fn order_status_outranks_customer_orders() {
        let c = classify("where is my order 55");
        assert_eq!(c.intent, Intent::OrderStatus);
    }

    #[test]
    fn customer_orders_phrasings() {
        let c = classify("show me my orders");
        assert_eq!(c.intent, Intent::CustomerOrders);
        assert_eq!(c.first_capture(), None);

        let c = classify("orders for user 42");
        assert_eq!(c.intent, Intent::CustomerOrders);
        assert_eq!(c.first_capture(), Some("42"));

        // Only the "customer N orders" word order names a customer.
        let c = classify("orders for customer 7");
        assert_eq!(c.intent, Intent::General);

        let c = classify("customer 19 orders");
        assert_eq!(c.intent, Intent::CustomerOrders);
        assert_eq!(c.first_capture(), Some("19"));
    }

    #[test]
    fn line_break_ends_a_trailing_capture() {
        let c = classify("tell me about the wool coat\nthanks");
        assert_eq!(c.intent, Intent::ProductDetails);
        assert_eq!(c.first_capture(), Some("wool coat"));

        let c = classify("How many classic tees left in stock?\r\nCheers");
        assert_eq!(c.intent, Intent::StockLevels);
        assert_eq!(c.first_capture(), Some("classic tees"));

        let c = classify("stock level of wool scarf\n\nthanks!");
        assert_eq!(c.intent, Intent::StockLevels);
        assert_eq!(c.first_capture(), Some("wool scarf"));
    }

    #[test]
    fn product_details_capture_runs_to_end() {
        let c = classify("Tell me about the Classic Tee?");
        assert_eq!(c.intent, Intent::ProductDetails);
        assert_eq!(c.first_capture(), Some("classic tee"));

        let c = classify("product details for leather belt");
        assert_eq!(c.intent, Intent::ProductDetails);
        assert_eq!(c.first_capture(), Some("leather belt"));
    }

    #[test]
    fn sales_summary_phrasings() {
        for text in ["sales summary", "business analytics", "overall sales performance"] {
            assert_eq!(classify(text).intent, Intent::SalesSummary, "{text}");
        }
    }

    #[test]
    fn unmatched_text_falls_back_to_general() {
        let c = classify("  Hello THERE  ");
        assert_eq!(c.intent, Intent::General);
        assert!(!c.is_match());
        assert_eq!(c.first_capture(), Some("hello there"));
    }

    #[test]
    fn empty_message_is_general() {
        let c = classify("");
        assert_eq!(c.intent, Intent::General);
        assert_eq!(c.first_capture(), Some(""));
    }
}
