//! Clarifying questions for messages that lack a required slot.
//!
//! An available [`Enhancer`] phrases the question; when there is none, or the
//! call fails, a static template keyed by the first missing slot is used. An
//! enhancer failure is logged and never reaches the user.

use crate::llm::Enhancer;
use crate::query::Slot;
use crate::query::policy::labels;

pub const ASK_ORDER_ID: &str =
    "I'd be happy to help you check your order status! Could you please provide your order ID?";
pub const ASK_PRODUCT_NAME: &str = "I'd be happy to help you with product information! \
     Could you please tell me which product you're interested in?";
pub const ASK_USER_ID: &str =
    "I'd be happy to help you check your orders! Could you please provide your user ID?";

/// Static question for the first missing slot, or a generic one naming all of
/// them when that slot has no template of its own.
pub fn static_question(missing: &[Slot]) -> String {
    match missing.first() {
        Some(Slot::OrderId) => ASK_ORDER_ID.to_string(),
        Some(Slot::ProductName) => ASK_PRODUCT_NAME.to_string(),
        Some(Slot::UserId) => ASK_USER_ID.to_string(),
        Some(_) => format!(
            "I'd be happy to help! Could you please provide more details about {}?",
            labels(missing).join(", ")
        ),
        None => "I'd be happy to help! Could you please provide more details?".to_string(),
    }
}

/// Builds the follow-up question for a message with missing slots.
pub struct ClarificationComposer<'a> {
    enhancer: Option<&'a dyn Enhancer>,
}

impl<'a> ClarificationComposer<'a> {
    /// `enhancer` should only be passed when it is known to be available.
    pub fn new(enhancer: Option<&'a dyn Enhancer>) -> Self {
        Self { enhancer }
    }

    /// Static templates only.
    pub fn offline() -> Self {
        Self { enhancer: None }
    }

    pub fn compose(&self, original_text: &str, missing: &[Slot]) -> String {
        if let Some(enhancer) = self.enhancer {
            match enhancer.ask_clarifying_question(original_text, &labels(missing)) {
                Ok(question) => return question,
                Err(e) => {
                    tracing::warn!(error = %e, "clarifying question failed, using static template");
                }
            }
        }
        static_question(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{EnhancementContext, LlmError, LlmResult};

    struct Scripted(LlmResult<String>);

    impl Enhancer for Scripted {
        fn is_available(&self) -> bool {
            true
        }

        fn enhance(&self, base: &str, _: &str, _: &EnhancementContext) -> LlmResult<String> {
            Ok(base.to_string())
        }

        fn ask_clarifying_question(&self, _: &str, _: &[&str]) -> LlmResult<String> {
            match &self.0 {
                Ok(s) => Ok(s.clone()),
                Err(_) => Err(LlmError::RequestFailed {
                    message: "boom".into(),
                }),
            }
        }
    }

    #[test]
    fn templates_keyed_by_first_slot() {
        assert_eq!(static_question(&[Slot::OrderId]), ASK_ORDER_ID);
        assert_eq!(static_question(&[Slot::ProductName]), ASK_PRODUCT_NAME);
        assert_eq!(static_question(&[Slot::UserId, Slot::OrderId]), ASK_USER_ID);
    }

    #[test]
    fn generic_template_joins_labels() {
        let q = static_question(&[Slot::Limit, Slot::Message]);
        assert_eq!(
            q,
            "I'd be happy to help! Could you please provide more details about number of products, message?"
        );
    }

    #[test]
    fn offline_uses_template() {
        let q = ClarificationComposer::offline().compose("where is my order", &[Slot::OrderId]);
        assert_eq!(q, ASK_ORDER_ID);
    }

    #[test]
    fn enhancer_phrasing_wins_when_it_succeeds() {
        let enhancer = Scripted(Ok("Which order number is it?".into()));
        let q = ClarificationComposer::new(Some(&enhancer)).compose("my order?", &[Slot::OrderId]);
        assert_eq!(q, "Which order number is it?");
    }

    #[test]
    fn enhancer_failure_degrades_to_template() {
        let enhancer = Scripted(Err(LlmError::RequestFailed {
            message: "down".into(),
        }));
        let q = ClarificationComposer::new(Some(&enhancer)).compose("my orders", &[Slot::UserId]);
        assert_eq!(q, ASK_USER_ID);
    }
}
