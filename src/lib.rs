// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # shopdesk
//!
//! Rule-based customer support for an online clothing store: a message is
//! classified into an intent, its parameters are extracted and checked, and
//! the reply is either a clarifying question or an answer synthesized from
//! shop data, optionally polished by a local LLM.
//!
//! ## Architecture
//!
//! - **Query understanding** (`query`): ordered regex rules, slot extraction,
//!   missing-information policy
//! - **Responses** (`respond`): deterministic formatters and clarifying questions
//! - **Shop data** (`store`): the [`store::Storefront`] lookup trait and an
//!   in-memory JSON catalog
//! - **Enhancement** (`llm`): optional Ollama-backed rewriting, never required
//! - **Orchestration** (`pipeline`): the per-message state machine
//!
//! ## Library usage
//!
//! ```
//! use std::sync::Arc;
//! use shopdesk::pipeline::ChatPipeline;
//! use shopdesk::store::Catalog;
//!
//! let pipeline = ChatPipeline::new(Arc::new(Catalog::default()));
//! let reply = pipeline.process("show me my orders", &[]);
//! assert!(reply.needed_clarification);
//! assert_eq!(reply.missing_slots, vec!["user ID"]);
//! ```

pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod query;
pub mod respond;
pub mod store;
