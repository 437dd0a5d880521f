//! Query understanding: intent matching, slot extraction and the
//! missing-information policy.
//!
//! Everything here is rule-based, deterministic and free of I/O:
//!
//! ```
//! use shopdesk::query::{Intent, Slot, missing_slots, parse_query};
//!
//! let parsed = parse_query("What's the status of order 4521?");
//! assert_eq!(parsed.intent, Intent::OrderStatus);
//! assert_eq!(parsed.parameters.int(Slot::OrderId), Some(4521));
//! assert!(missing_slots(parsed.intent, &parsed.parameters).is_empty());
//! ```

pub mod intent;
pub mod matcher;
pub mod policy;
pub mod slots;

pub use intent::Intent;
pub use matcher::{Classification, classify};
pub use policy::{labels, missing_slots, required_slots};
pub use slots::{ParameterSet, ParsedQuery, Slot, SlotValue, extract, parse_query};
