//! Recent conversation turns handed to the enhancement collaborator.
//!
//! The pipeline never stores or mutates history: hosts keep it (for instance
//! in a [`TurnWindow`]) and pass a read-only slice per message, of which only
//! the last [`MAX_CONTEXT_TURNS`] are forwarded.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Upper bound on turns forwarded as context.
pub const MAX_CONTEXT_TURNS: usize = 5;

// ── Role ────────────────────────────────────────────────────────────────

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The customer.
    User,
    /// The assistant.
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

// ── Turn ────────────────────────────────────────────────────────────────

/// A single turn in the conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The trailing window of `turns` that may be forwarded as context.
pub fn recent(turns: &[Turn]) -> &[Turn] {
    &turns[turns.len().saturating_sub(MAX_CONTEXT_TURNS)..]
}

// ── TurnWindow ──────────────────────────────────────────────────────────

/// Bounded ring buffer of recent turns, for hosts that keep history in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnWindow {
    turns: VecDeque<Turn>,
    max_turns: usize,
}

impl TurnWindow {
    /// Create a window keeping at most `max_turns` turns (capped at
    /// [`MAX_CONTEXT_TURNS`]).
    pub fn new(max_turns: usize) -> Self {
        let max_turns = max_turns.min(MAX_CONTEXT_TURNS);
        Self {
            turns: VecDeque::with_capacity(max_turns),
            max_turns,
        }
    }

    /// Record a turn, evicting the oldest when full.
    pub fn push(&mut self, turn: Turn) {
        if self.max_turns == 0 {
            return;
        }
        self.turns.push_back(turn);
        if self.turns.len() > self.max_turns {
            self.turns.pop_front();
        }
    }

    /// Record a user message and the reply it received.
    pub fn record_exchange(&mut self, message: &str, reply: &str) {
        self.push(Turn::user(message));
        self.push(Turn::assistant(reply));
    }

    /// Snapshot of the window, oldest first.
    pub fn to_vec(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    /// Number of recorded turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turns have been recorded.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

impl Default for TurnWindow {
    fn default() -> Self {
        Self::new(MAX_CONTEXT_TURNS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_keeps_last_five() {
        let turns: Vec<Turn> = (0..8).map(|i| Turn::user(format!("m{i}"))).collect();
        let window = recent(&turns);
        assert_eq!(window.len(), 5);
        assert_eq!(window[0].content, "m3");
        assert_eq!(recent(&turns[..2]).len(), 2);
    }

    #[test]
    fn window_evicts_oldest() {
        let mut window = TurnWindow::default();
        window.record_exchange("q1", "a1");
        window.record_exchange("q2", "a2");
        window.record_exchange("q3", "a3");
        let turns = window.to_vec();
        assert_eq!(turns.len(), 5);
        assert_eq!(turns[0], Turn::assistant("a1"));
        assert_eq!(turns[4], Turn::assistant("a3"));
    }

    #[test]
    fn window_size_is_capped() {
        let mut window = TurnWindow::new(50);
        for i in 0..10 {
            window.push(Turn::user(format!("{i}")));
        }
        assert_eq!(window.len(), MAX_CONTEXT_TURNS);

        let mut disabled = TurnWindow::new(0);
        disabled.push(Turn::user("ignored"));
        assert!(disabled.is_empty());
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
