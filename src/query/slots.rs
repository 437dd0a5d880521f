//! Slot extraction: turning a rule's raw captures into normalized parameters.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::intent::Intent;
use super::matcher::{Classification, classify};

/// Number of products listed when a best-sellers question names no count.
pub const DEFAULT_TOP_LIMIT: i64 = 5;

/// Confidence reported when a rule matched.
pub const MATCHED_CONFIDENCE: f32 = 0.9;

/// Confidence reported for the general fallback.
pub const FALLBACK_CONFIDENCE: f32 = 0.1;

/// Trailing "(left) in stock" / "available" qualifier on a stock capture.
static RE_STOCK_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+(?:left\s+)?(?:in\s+stock|available)?$").unwrap());

// ── Slots ───────────────────────────────────────────────────────────────

/// A named parameter an intent may need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Limit,
    OrderId,
    ProductName,
    UserId,
    Message,
}

impl Slot {
    /// Parameter key, e.g. `order_id`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Limit => "limit",
            Self::OrderId => "order_id",
            Self::ProductName => "product_name",
            Self::UserId => "user_id",
            Self::Message => "message",
        }
    }

    /// Human-readable name used when asking for the slot, e.g. "order ID".
    pub fn label(self) -> &'static str {
        match self {
            Self::Limit => "number of products",
            Self::OrderId => "order ID",
            Self::ProductName => "product name",
            Self::UserId => "user ID",
            Self::Message => "message",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// A normalized slot value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotValue {
    Int(i64),
    Text(String),
}

impl SlotValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

impl std::fmt::Display for SlotValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Slot name → value mapping for one message. Ordered, so iteration and
/// serialization are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(BTreeMap<Slot, SlotValue>);

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, slot: Slot, value: SlotValue) {
        self.0.insert(slot, value);
    }

    pub fn get(&self, slot: Slot) -> Option<&SlotValue> {
        self.0.get(&slot)
    }

    pub fn contains(&self, slot: Slot) -> bool {
        self.0.contains_key(&slot)
    }

    pub fn int(&self, slot: Slot) -> Option<i64> {
        self.get(slot).and_then(SlotValue::as_int)
    }

    pub fn text(&self, slot: Slot) -> Option<&str> {
        self.get(slot).and_then(SlotValue::as_text)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &SlotValue)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}

// ── Extraction ──────────────────────────────────────────────────────────

/// Build the parameter set for `intent` from the winning rule's captures.
///
/// A capture that should be numeric but isn't means a rule and this extractor
/// disagree; that trips a debug assertion and otherwise leaves the slot out.
/// An all-digit id that overflows `i64` is user input, not a mismatch: it is
/// kept as [`SlotValue::Text`].
pub fn extract(intent: Intent, captures: &[Option<String>]) -> ParameterSet {
    let first = captures.first().and_then(|c| c.as_deref());
    let mut params = ParameterSet::new();

    match intent {
        Intent::TopProducts => {
            let limit = first
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(DEFAULT_TOP_LIMIT);
            params.insert(Slot::Limit, SlotValue::Int(limit));
        }
        Intent::OrderStatus => {
            if let Some(id) = required_id(first, Slot::OrderId) {
                params.insert(Slot::OrderId, id);
            }
        }
        Intent::StockLevels => {
            if let Some(raw) = first {
                let name = RE_STOCK_TAIL.replace(raw.trim(), "");
                params.insert(Slot::ProductName, SlotValue::Text(name.trim().to_string()));
            }
        }
        Intent::CustomerOrders => {
            if first.is_some() {
                if let Some(id) = required_id(first, Slot::UserId) {
                    params.insert(Slot::UserId, id);
                }
            }
        }
        Intent::ProductDetails => {
            if let Some(raw) = first {
                params.insert(Slot::ProductName, SlotValue::Text(raw.trim().to_string()));
            }
        }
        Intent::SalesSummary => {}
        Intent::General => {
            params.insert(
                Slot::Message,
                SlotValue::Text(first.unwrap_or_default().to_string()),
            );
        }
    }

    params
}

/// Value for a digits-only id capture.
///
/// Ids too large for `i64` are kept as their digit text: the slot is present,
/// but no stored record can carry that id, so lookups report nothing found.
fn required_id(capture: Option<&str>, slot: Slot) -> Option<SlotValue> {
    let digits = capture.filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()));
    debug_assert!(
        digits.is_some(),
        "rule/extractor mismatch: {slot} capture {capture:?} is not an integer"
    );
    let digits = digits?;
    Some(match digits.parse::<i64>() {
        Ok(id) => SlotValue::Int(id),
        Err(_) => SlotValue::Text(digits.to_string()),
    })
}
