//! Ephemeral notification slot
//!
//! Holds at most one message. Expiry is computed from the instant sampled at
//! each redraw; nothing is scheduled.

use std::time::{Duration, Instant};

/// How long a notification stays visible
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl Severity {
    /// Severity label for display
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Success => "OK",
            Self::Error => "ERR",
        }
    }
}

/// A single notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub created_at: Instant,
}

impl Notification {
    /// Whether this notification is still visible at `now`
    #[must_use]
    pub fn is_live(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created_at) < NOTIFICATION_TTL
    }
}

/// Single-slot notification center
#[derive(Debug, Default)]
pub struct NotificationCenter {
    current: Option<Notification>,
}

impl NotificationCenter {
    #[must_use]
    pub const fn new() -> Self {
        Self { current: None }
    }

    /// Replace whatever is showing, expired or not
    pub fn show(&mut self, message: impl Into<String>, severity: Severity, now: Instant) {
        let message = message.into();
        tracing::debug!(message = %message, ?severity, "notification");
        self.current = Some(Notification {
            message,
            severity,
            created_at: now,
        });
    }

    #[must_use]
    pub fn is_active(&self, now: Instant) -> bool {
        self.current.as_ref().is_some_and(|n| n.is_live(now))
    }

    /// The notification to draw at `now`, if any
    #[must_use]
    pub fn render(&self, now: Instant) -> Option<&Notification> {
        self.current.as_ref().filter(|n| n.is_live(now))
    }

    /// Drop the stored message once it has expired
    ///
    /// Returns `true` if a message was dropped (caller should redraw).
    pub fn expire(&mut self, now: Instant) -> bool {
        if self.current.is_some() && !self.is_active(now) {
            self.current = None;
            return true;
        }
        false
    }

    /// Whether a message is stored, live or not
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.current.is_some()
    }
}
