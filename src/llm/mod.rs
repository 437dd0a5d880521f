//! Optional text enhancement through a local LLM (Ollama).
//!
//! The LLM is used **only** for:
//! - Polishing an answer the pipeline has already synthesized
//! - Phrasing a clarifying question for missing information
//!
//! Intent detection, slot extraction and the answer's facts never depend on
//! it. Every call is best-effort: callers fall back to deterministic text on
//! any error.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::conversation::{Turn, recent};
use crate::query::{Intent, ParameterSet};

/// Errors from the LLM subsystem.
#[derive(Debug, Error, Diagnostic)]
pub enum LlmError {
    #[error("Ollama is not available at {url}")]
    #[diagnostic(
        code(shopdesk::llm::unavailable),
        help("Start Ollama with `ollama serve` or pass --no-llm to use template responses only.")
    )]
    Unavailable { url: String },

    #[error("Ollama request failed: {message}")]
    #[diagnostic(
        code(shopdesk::llm::request_failed),
        help("Check that Ollama is running and the model is pulled.")
    )]
    RequestFailed { message: String },

    #[error("Failed to parse Ollama response: {message}")]
    #[diagnostic(
        code(shopdesk::llm::parse_error),
        help("The model returned an unexpected response format.")
    )]
    ParseError { message: String },

    #[error("Ollama returned an empty completion")]
    #[diagnostic(
        code(shopdesk::llm::empty_response),
        help("Try a different model or raise the token limit.")
    )]
    EmptyResponse,
}

pub type LlmResult<T> = std::result::Result<T, LlmError>;

// ── Enhancer ────────────────────────────────────────────────────────────

/// Everything the enhancer may use to polish a synthesized answer.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancementContext {
    pub intent: Intent,
    pub parameters: ParameterSet,
    pub base_response: String,
    /// Intent-specific facts taken from the data behind the answer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facts: Option<serde_json::Value>,
    /// Recent conversation, oldest first, at most five turns.
    #[serde(skip)]
    pub history: Vec<Turn>,
}

/// External text-generation collaborator.
///
/// Implementations must not retry internally beyond their own policy and must
/// bound every call with a timeout.
pub trait Enhancer: Send + Sync {
    /// Whether the service can be called at all.
    fn is_available(&self) -> bool;

    /// Rewrite `base_text` as a friendlier answer to `original_message`.
    fn enhance(
        &self,
        base_text: &str,
        original_message: &str,
        context: &EnhancementContext,
    ) -> LlmResult<String>;

    /// Phrase a question asking for the `missing` pieces of information.
    fn ask_clarifying_question(&self, original_message: &str, missing: &[&str])
    -> LlmResult<String>;
}

// ── Prompts ─────────────────────────────────────────────────────────────

const ENHANCE_SYSTEM_PROMPT: &str = "You are a helpful e-commerce customer support assistant \
    for a clothing store. You have a base response to give to the user, but you should enhance \
    it to be more helpful, friendly, and personalized. Add relevant suggestions, follow-up \
    questions, or additional helpful information. Keep the response conversational and \
    engaging. Never change the facts, numbers, names or identifiers in the base response.";

const CLARIFY_SYSTEM_PROMPT: &str = "You are a helpful e-commerce customer support assistant. \
    The user has asked a question but we need more information to help them properly. \
    Generate a friendly, helpful clarifying question to get the missing information. \
    Be specific and helpful. Reply with the question only.";

/// A chat message for the Ollama chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant".
    pub role: String,
    /// Message content.
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Messages for an enhancement request: system prompt, recent turns, then the
/// base response with its context.
pub fn enhancement_messages(
    base_text: &str,
    original_message: &str,
    context: &EnhancementContext,
) -> Vec<ChatMessage> {
    let context_json =
        serde_json::to_string(context).unwrap_or_else(|_| "null".to_string());

    let mut messages = vec![ChatMessage::new("system", ENHANCE_SYSTEM_PROMPT)];
    messages.extend(
        recent(&context.history)
            .iter()
            .map(|t| ChatMessage::new(t.role.as_str(), t.content.clone())),
    );
    messages.push(ChatMessage::new(
        "user",
        format!(
            "User message: \"{original_message}\"\n\n\
             Base response: \"{base_text}\"\n\n\
             Context: {context_json}\n\n\
             Please enhance this response to be more helpful and engaging while keeping the core information."
        ),
    ));
    messages
}

/// Messages for a clarifying-question request.
pub fn clarification_messages(original_message: &str, missing: &[&str]) -> Vec<ChatMessage> {
    vec![
        ChatMessage::new("system", CLARIFY_SYSTEM_PROMPT),
        ChatMessage::new(
            "user",
            format!(
                "User message: \"{original_message}\"\n\n\
                 Missing information: {}\n\n\
                 Please ask a clarifying question to get the missing information. Be friendly and helpful.",
                missing.join(", ")
            ),
        ),
    ]
}

// ── Ollama ──────────────────────────────────────────────────────────────

/// Configuration for the Ollama client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model name to use.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Timeout for the availability probe in seconds.
    pub probe_timeout_secs: u64,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".into(),
            model: "llama3.2".into(),
            timeout_secs: 30,
            probe_timeout_secs: 5,
            temperature: 0.7,
        }
    }
}

/// Token budget for an enhanced answer.
const ENHANCE_MAX_TOKENS: u32 = 800;

/// Token budget for a clarifying question.
const CLARIFY_MAX_TOKENS: u32 = 300;

/// [`Enhancer`] backed by the Ollama REST API.
pub struct OllamaEnhancer {
    config: OllamaConfig,
    available: bool,
    /// Models available locally after `probe()`.
    available_models: Vec<String>,
}

impl OllamaEnhancer {
    /// Create a client without probing; it reports unavailable until
    /// [`probe`](Self::probe) succeeds.
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            config,
            available: false,
            available_models: Vec::new(),
        }
    }

    /// Create a client and probe the server once.
    pub fn connect(config: OllamaConfig) -> Self {
        let mut client = Self::new(config);
        client.probe();
        client
    }

    /// Probe the Ollama server to check availability.
    ///
    /// Sends a lightweight request to the `/api/tags` endpoint and parses the
    /// list of locally available models. The client is available only when
    /// the server answers and the configured model is present.
    pub fn probe(&mut self) -> bool {
        let url = format!("{}/api/tags", self.config.base_url);
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(self.config.probe_timeout_secs))
            .build();

        match agent.get(&url).call() {
            Ok(resp) => {
                if resp.status() != 200 {
                    self.available = false;
                    return false;
                }

                if let Ok(body) = resp.into_string() {
                    if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
                        self.available_models = json["models"]
                            .as_array()
                            .map(|arr| {
                                arr.iter()
                                    .filter_map(|m| m["name"].as_str().map(|s| s.to_string()))
                                    .collect()
                            })
                            .unwrap_or_default();
                    }
                }

                self.available = self.has_model();
                if !self.available {
                    tracing::warn!(
                        model = %self.config.model,
                        "Ollama is running but the model is not pulled; enhancement disabled"
                    );
                }
                self.available
            }
            Err(e) => {
                tracing::info!(url = %url, error = %e, "Ollama not reachable; enhancement disabled");
                self.available = false;
                self.available_models.clear();
                false
            }
        }
    }

    /// Whether the configured model is locally available.
    pub fn has_model(&self) -> bool {
        let target = &self.config.model;
        self.available_models
            .iter()
            .any(|m| m == target || m.split(':').next() == Some(target))
    }

    /// Get the model name being used.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Single non-streaming chat completion.
    fn chat(&self, messages: &[ChatMessage], max_tokens: u32) -> LlmResult<String> {
        if !self.available {
            return Err(LlmError::Unavailable {
                url: self.config.base_url.clone(),
            });
        }

        let url = format!("{}/api/chat", self.config.base_url);
        let agent = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(self.config.timeout_secs))
            .build();

        let msgs: Vec<serde_json::Value> = messages
            .iter()
            .map(|m| {
                serde_json::json!({
                    "role": m.role,
                    "content": m.content,
                })
            })
            .collect();

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": msgs,
            "stream": false,
            "options": {
                "temperature": self.config.temperature,
                "num_predict": max_tokens,
            },
        });

        let body_str = serde_json::to_string(&body).map_err(|e| LlmError::RequestFailed {
            message: format!("JSON serialize error: {e}"),
        })?;

        let resp = agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body_str)
            .map_err(|e: ureq::Error| LlmError::RequestFailed {
                message: e.to_string(),
            })?;

        let resp_str = resp.into_string().map_err(|e| LlmError::ParseError {
            message: e.to_string(),
        })?;

        let json: serde_json::Value =
            serde_json::from_str(&resp_str).map_err(|e| LlmError::ParseError {
                message: e.to_string(),
            })?;

        let content = json["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::ParseError {
                message: "missing 'message.content' field".into(),
            })?
            .trim();

        if content.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(content.to_string())
    }
}

impl Enhancer for OllamaEnhancer {
    fn is_available(&self) -> bool {
        self.available
    }

    fn enhance(
        &self,
        base_text: &str,
        original_message: &str,
        context: &EnhancementContext,
    ) -> LlmResult<String> {
        self.chat(
            &enhancement_messages(base_text, original_message, context),
            ENHANCE_MAX_TOKENS,
        )
    }

    fn ask_clarifying_question(
        &self,
        original_message: &str,
        missing: &[&str],
    ) -> LlmResult<String> {
        self.chat(
            &clarification_messages(original_message, missing),
            CLARIFY_MAX_TOKENS,
        )
    }
}

impl std::fmt::Debug for OllamaEnhancer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OllamaEnhancer")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("available", &self.available)
            .finish()
    }
}
