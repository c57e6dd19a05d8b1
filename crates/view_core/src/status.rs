use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use shared::domain::StatusKind;

pub const STATUS_TTL: Duration = Duration::from_millis(4000);

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    pub created_at: DateTime<Utc>,
}

/// Handle for one scheduled expiry. Only the ticket of the live message can
/// clear it; tickets of superseded messages are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryTicket {
    pub generation: u64,
    pub deadline: Instant,
}

/// Single-slot notification channel with auto-expiry.
#[derive(Debug, Clone)]
pub struct StatusMessageChannel {
    ttl: Duration,
    generation: u64,
    current: Option<(StatusMessage, Instant)>,
}

impl Default for StatusMessageChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusMessageChannel {
    pub fn new() -> Self {
        Self::with_ttl(STATUS_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: 0,
            current: None,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref().map(|(message, _)| message)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.current.as_ref().map(|(_, deadline)| *deadline)
    }

    /// Shows `text`, superseding whatever is visible. Bumping the generation
    /// invalidates every earlier ticket.
    pub fn show(&mut self, text: &str, kind: StatusKind, now: Instant) -> ExpiryTicket {
        self.generation = self.generation.wrapping_add(1);
        let deadline = now + self.ttl;
        self.current = Some((
            StatusMessage {
                text: normalize_status_text(text),
                kind,
                created_at: Utc::now(),
            },
            deadline,
        ));
        ExpiryTicket {
            generation: self.generation,
            deadline,
        }
    }

    /// Clears the message if `ticket` still belongs to it. Returns whether
    /// anything was removed.
    pub fn expire(&mut self, ticket: ExpiryTicket) -> bool {
        if ticket.generation != self.generation || self.current.is_none() {
            return false;
        }
        self.current = None;
        true
    }

    /// Clock-driven alternative to tickets: drops the message once its own
    /// deadline has passed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.current = None;
    }
}

pub fn normalize_status_text(text: &str) -> String {
    text.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
