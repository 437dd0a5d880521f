//! Message pipeline: classify → extract → gate → clarify or answer → enhance.
//!
//! One call to [`ChatPipeline::process`] walks a message through the stages
//!
//! ```text
//! Received → Classified ─┬─→ NeedsClarification            (reply: question)
//!                        └─→ Ready → data fetch → format → [enhance] → Responded
//! ```
//!
//! The pipeline holds no per-message state, so a single instance can serve
//! concurrent callers. Collaborator failures never escape: data-access errors
//! become the fixed data-access sentence and enhancement errors leave the
//! synthesized text unchanged.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{DeskConfig, PipelineSettings};
use crate::conversation::Turn;
use crate::llm::{EnhancementContext, Enhancer, OllamaEnhancer};
use crate::query::slots::DEFAULT_TOP_LIMIT;
use crate::query::{
    Intent, ParameterSet, ParsedQuery, Slot, SlotValue, labels, missing_slots, parse_query,
};
use crate::respond::format::{
    format_customer_orders, format_general, format_order_status, format_product_details,
    format_sales_summary, format_stock_levels, format_top_products,
};
use crate::respond::{ClarificationComposer, ErrorKind, format_error};
use crate::store::{StoreResult, Storefront};

// ── Stages ──────────────────────────────────────────────────────────────

/// Where a message is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    Classified,
    NeedsClarification,
    Ready,
    Responded,
}

impl Stage {
    /// Whether `next` may follow `self`.
    pub fn can_advance_to(self, next: Stage) -> bool {
        matches!(
            (self, next),
            (Self::Received, Self::Classified)
                | (Self::Classified, Self::NeedsClarification)
                | (Self::Classified, Self::Ready)
                | (Self::Ready, Self::Responded)
        )
    }

    /// Whether processing stops here for this turn.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::NeedsClarification | Self::Responded)
    }
}

/// Log and check a stage transition.
fn advance(from: Stage, to: Stage, intent: Option<Intent>) -> Stage {
    debug_assert!(from.can_advance_to(to), "invalid stage transition {from:?} → {to:?}");
    tracing::debug!(from = ?from, to = ?to, intent = ?intent, "pipeline stage");
    to
}

// ── Handlers ────────────────────────────────────────────────────────────

/// Formatted answer plus the facts it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub text: String,
    /// Intent-specific data forwarded to the enhancer.
    pub facts: Option<serde_json::Value>,
}

impl Synthesis {
    fn plain(text: String) -> Self {
        Self { text, facts: None }
    }

    fn with_facts<T: Serialize>(text: String, facts: &T) -> Self {
        Self {
            text,
            facts: serde_json::to_value(facts).ok(),
        }
    }
}

/// Answers one intent from the store; `params` have already passed the
/// missing-information gate.
pub type Handler = fn(&dyn Storefront, &ParameterSet) -> StoreResult<Synthesis>;

/// The handler for `intent`.
pub fn handler_for(intent: Intent) -> Handler {
    match intent {
        Intent::TopProducts => answer_top_products,
        Intent::OrderStatus => answer_order_status,
        Intent::StockLevels => answer_stock_levels,
        Intent::CustomerOrders => answer_customer_orders,
        Intent::ProductDetails => answer_product_details,
        Intent::SalesSummary => answer_sales_summary,
        Intent::General => answer_general,
    }
}

/// Reply for a handler invoked without its required slot.
fn ungated() -> StoreResult<Synthesis> {
    Ok(Synthesis::plain(format_error(ErrorKind::InvalidQuery, None)))
}

fn answer_top_products(store: &dyn Storefront, params: &ParameterSet) -> StoreResult<Synthesis> {
    let limit = params
        .int(Slot::Limit)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(DEFAULT_TOP_LIMIT as usize);
    let products = store.top_selling_products(limit)?;
    Ok(Synthesis::plain(format_top_products(&products)))
}

fn answer_order_status(store: &dyn Storefront, params: &ParameterSet) -> StoreResult<Synthesis> {
    let order_id = match params.get(Slot::OrderId) {
        Some(SlotValue::Int(id)) => *id,
        // Out of range for any stored order.
        Some(SlotValue::Text(_)) => return Ok(Synthesis::plain(format_order_status(None))),
        None => return ungated(),
    };
    let status = store.order_status(order_id)?;
    let text = format_order_status(status.as_ref());
    Ok(match status {
        Some(status) => Synthesis::with_facts(text, &status),
        None => Synthesis::plain(text),
    })
}

fn answer_stock_levels(store: &dyn Storefront, params: &ParameterSet) -> StoreResult<Synthesis> {
    let Some(name) = params.text(Slot::ProductName) else {
        return ungated();
    };
    let levels = store.stock_levels(Some(name))?;
    let text = format_stock_levels(&levels);
    if levels.is_empty() {
        Ok(Synthesis::plain(text))
    } else {
        Ok(Synthesis::with_facts(text, &levels))
    }
}

fn answer_customer_orders(store: &dyn Storefront, params: &ParameterSet) -> StoreResult<Synthesis> {
    let user_id = match params.get(Slot::UserId) {
        Some(SlotValue::Int(id)) => *id,
        Some(SlotValue::Text(_)) => return Ok(Synthesis::plain(format_customer_orders(&[]))),
        None => return ungated(),
    };
    let orders = store.orders_for_customer(user_id)?;
    Ok(Synthesis::plain(format_customer_orders(&orders)))
}

fn answer_product_details(store: &dyn Storefront, params: &ParameterSet) -> StoreResult<Synthesis> {
    let Some(name) = params.text(Slot::ProductName) else {
        return ungated();
    };
    let products = store.product_details(name)?;
    Ok(Synthesis::plain(format_product_details(&products)))
}

fn answer_sales_summary(store: &dyn Storefront, _params: &ParameterSet) -> StoreResult<Synthesis> {
    let summary = store.sales_summary()?;
    Ok(Synthesis::plain(format_sales_summary(&summary)))
}

fn answer_general(_store: &dyn Storefront, params: &ParameterSet) -> StoreResult<Synthesis> {
    let message = params.text(Slot::Message).unwrap_or_default();
    Ok(Synthesis::plain(format_general(message)))
}

// ── Reply ───────────────────────────────────────────────────────────────

/// What the host gets back for one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response_text: String,
    pub needed_clarification: bool,
    /// Human-readable labels of the missing slots, in policy order.
    pub missing_slots: Vec<String>,
    pub intent: Intent,
    /// Telemetry only.
    pub confidence: f32,
    /// Whether the enhancer rewrote the text.
    pub enhanced: bool,
}

/// Enhancer state as seen by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmStatus {
    pub configured: bool,
    pub available: bool,
}

// ── ChatPipeline ────────────────────────────────────────────────────────

/// The orchestrator. Cheap to share behind an `Arc`.
pub struct ChatPipeline {
    store: Arc<dyn Storefront>,
    enhancer: Option<Arc<dyn Enhancer>>,
    /// Sampled once when the enhancer is attached.
    enhancer_available: bool,
    settings: PipelineSettings,
}

impl ChatPipeline {
    /// A pipeline answering from `store` with template text only.
    pub fn new(store: Arc<dyn Storefront>) -> Self {
        Self {
            store,
            enhancer: None,
            enhancer_available: false,
            settings: PipelineSettings::default(),
        }
    }

    /// Attach an enhancer; its availability is checked now and not again.
    pub fn with_enhancer(mut self, enhancer: Arc<dyn Enhancer>) -> Self {
        self.enhancer_available = enhancer.is_available();
        if !self.enhancer_available {
            tracing::info!("enhancement service unavailable, using template responses");
        }
        self.enhancer = Some(enhancer);
        self
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Build from configuration, probing Ollama when `[llm] enabled`.
    pub fn from_config(config: &DeskConfig, store: Arc<dyn Storefront>) -> Self {
        let pipeline = Self::new(store).with_settings(config.pipeline);
        if config.llm.enabled {
            let enhancer = OllamaEnhancer::connect(config.llm.ollama());
            tracing::info!(
                model = enhancer.model(),
                available = enhancer.is_available(),
                "enhancement service configured"
            );
            pipeline.with_enhancer(Arc::new(enhancer))
        } else {
            pipeline
        }
    }

    pub fn llm_status(&self) -> LlmStatus {
        LlmStatus {
            configured: self.enhancer.is_some(),
            available: self.enhancer_available,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// The enhancer, if one is attached and was available.
    fn active_enhancer(&self) -> Option<&dyn Enhancer> {
        self.enhancer
            .as_deref()
            .filter(|_| self.enhancer_available)
    }

    /// Process one message. `history` is the caller's recent conversation,
    /// oldest first; it is only read, and only forwarded to the enhancer.
    pub fn process(&self, message: &str, history: &[Turn]) -> ChatReply {
        let mut stage = Stage::Received;
        let parsed = parse_query(message);
        stage = advance(stage, Stage::Classified, Some(parsed.intent));
        tracing::debug!(
            intent = %parsed.intent,
            confidence = parsed.confidence,
            slots = parsed.parameters.len(),
            "message classified"
        );

        let missing = missing_slots(parsed.intent, &parsed.parameters);
        if !missing.is_empty() {
            advance(stage, Stage::NeedsClarification, Some(parsed.intent));
            let question =
                ClarificationComposer::new(self.active_enhancer()).compose(message, &missing);
            return ChatReply {
                response_text: question,
                needed_clarification: true,
                missing_slots: labels(&missing).into_iter().map(String::from).collect(),
                intent: parsed.intent,
                confidence: parsed.confidence,
                enhanced: false,
            };
        }

        stage = advance(stage, Stage::Ready, Some(parsed.intent));
        let (text, enhanced) = match self.synthesize(&parsed) {
            Ok(synthesis) => self.enhance(message, history, &parsed, synthesis),
            Err(e) => {
                tracing::warn!(intent = %parsed.intent, error = %e, "data access failed");
                let details = e.to_string();
                let details = self
                    .settings
                    .expose_error_details
                    .then_some(details.as_str());
                (format_error(ErrorKind::DataAccess, details), false)
            }
        };
        advance(stage, Stage::Responded, Some(parsed.intent));

        ChatReply {
            response_text: text,
            needed_clarification: false,
            missing_slots: Vec::new(),
            intent: parsed.intent,
            confidence: parsed.confidence,
            enhanced,
        }
    }

    /// Fetch and format the answer for a gated query.
    pub fn synthesize(&self, parsed: &ParsedQuery) -> StoreResult<Synthesis> {
        handler_for(parsed.intent)(self.store.as_ref(), &parsed.parameters)
    }

    /// Optional final pass; returns the synthesized text on any failure.
    fn enhance(
        &self,
        message: &str,
        history: &[Turn],
        parsed: &ParsedQuery,
        synthesis: Synthesis,
    ) -> (String, bool) {
        let Some(enhancer) = self.active_enhancer() else {
            return (synthesis.text, false);
        };

        let window = self.settings.effective_history_window();
        let context = EnhancementContext {
            intent: parsed.intent,
            parameters: parsed.parameters.clone(),
            base_response: synthesis.text.clone(),
            facts: synthesis.facts,
            history: history[history.len().saturating_sub(window)..].to_vec(),
        };

        match enhancer.enhance(&synthesis.text, message, &context) {
            Ok(text) => (text, true),
            Err(e) => {
                tracing::warn!(error = %e, "enhancement failed, returning synthesized text");
                (synthesis.text, false)
            }
        }
    }
}

impl std::fmt::Debug for ChatPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatPipeline")
            .field("llm", &self.llm_status())
            .field("settings", &self.settings)
            .finish()
    }
}
